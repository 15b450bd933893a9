//! Managed resources
//!
//! Implementors keep their API calls in private `async fn ... -> Result<_, Diagnostic>`
//! methods and turn the outcome into a response with the `from_result`
//! constructors below, so every resource fails the same way: the previous
//! state is kept and the error is reported.

use crate::context::Context;
use crate::schema::Schema;
use crate::types::{ClientCapabilities, Deferred, Diagnostic, DynamicValue, RawState};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[async_trait]
pub trait Resource: Send + Sync {
    /// Full type name, e.g. `tencentcloud_vpc_notify_routes`. Must equal the
    /// key the provider registers the factory under.
    fn type_name(&self) -> &str;

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(&self, ctx: Context, request: ResourceSchemaRequest) -> ResourceSchemaResponse;

    /// Cross-attribute checks. Required attributes and attribute validators
    /// have already been checked by the server.
    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: vec![],
        }
    }

    /// The returned state must have every computed attribute known
    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse;

    /// `new_state: None` drops the resource from state
    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse;

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse;

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse;

    /// Importable resources override this, usually with
    /// `import_state_passthrough_id`, and let the following read fill the rest
    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![Diagnostic::error(
                "Resource import not supported",
                format!("{} does not support import", request.type_name),
            )],
            deferred: None,
        }
    }

    /// Every schema is still at version 0, so stored state is taken as is
    async fn upgrade_state(
        &self,
        _ctx: Context,
        request: UpgradeResourceStateRequest,
    ) -> UpgradeResourceStateResponse {
        let json = request.raw_state.json.unwrap_or_default();
        match DynamicValue::decode_json(&json) {
            Ok(upgraded_state) => UpgradeResourceStateResponse {
                upgraded_state,
                diagnostics: vec![],
            },
            Err(e) => UpgradeResourceStateResponse {
                upgraded_state: DynamicValue::null(),
                diagnostics: vec![Diagnostic::error(
                    "Failed to upgrade state",
                    format!("stored state of {} is not valid JSON: {}", request.type_name, e),
                )],
            },
        }
    }
}

pub struct ResourceMetadataRequest;

pub struct ResourceMetadataResponse {
    pub type_name: String,
}

pub struct ResourceSchemaRequest;

pub struct ResourceSchemaResponse {
    pub schema: Schema,
    pub diagnostics: Vec<Diagnostic>,
}

impl From<Schema> for ResourceSchemaResponse {
    fn from(schema: Schema) -> Self {
        Self {
            schema,
            diagnostics: vec![],
        }
    }
}

pub struct ValidateResourceConfigRequest {
    pub type_name: String,
    pub config: DynamicValue,
    pub client_capabilities: ClientCapabilities,
}

pub struct ValidateResourceConfigResponse {
    pub diagnostics: Vec<Diagnostic>,
}

pub struct CreateResourceRequest {
    pub type_name: String,
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
    pub planned_private: Vec<u8>,
    pub provider_meta: Option<DynamicValue>,
}

pub struct CreateResourceResponse {
    pub new_state: DynamicValue,
    pub private: Vec<u8>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CreateResourceResponse {
    /// A failure with no remote object behind it returns null, so nothing
    /// is written to state
    pub fn from_result<E: Into<CreateError>>(result: Result<DynamicValue, E>) -> Self {
        let (new_state, diagnostics) = match result {
            Ok(state) => (state, vec![]),
            Err(e) => {
                let e = e.into();
                (e.state.unwrap_or_else(DynamicValue::null), vec![e.diagnostic])
            }
        };
        Self {
            new_state,
            private: vec![],
            diagnostics,
        }
    }
}

/// Error out of a create. `state` is only set once the remote object
/// exists; Terraform then keeps it as tainted and the next refresh finds it
/// by id.
#[derive(Debug)]
pub struct CreateError {
    pub diagnostic: Diagnostic,
    pub state: Option<DynamicValue>,
}

impl CreateError {
    pub fn after_create(state: DynamicValue, diagnostic: Diagnostic) -> Self {
        Self {
            diagnostic,
            state: Some(state),
        }
    }
}

impl From<Diagnostic> for CreateError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostic,
            state: None,
        }
    }
}

pub struct ReadResourceRequest {
    pub type_name: String,
    pub current_state: DynamicValue,
    pub private: Vec<u8>,
    pub provider_meta: Option<DynamicValue>,
    pub client_capabilities: ClientCapabilities,
}

pub struct ReadResourceResponse {
    /// None removes the resource from state
    pub new_state: Option<DynamicValue>,
    pub diagnostics: Vec<Diagnostic>,
    pub private: Vec<u8>,
    pub deferred: Option<Deferred>,
}

impl ReadResourceResponse {
    /// A failed refresh keeps `current_state`; `Ok(None)` removes the resource
    pub fn from_result(
        current_state: DynamicValue,
        private: Vec<u8>,
        result: Result<Option<DynamicValue>, Diagnostic>,
    ) -> Self {
        let (new_state, diagnostics) = match result {
            Ok(new_state) => (new_state, vec![]),
            Err(diag) => (Some(current_state), vec![diag]),
        };
        Self {
            new_state,
            diagnostics,
            private,
            deferred: None,
        }
    }
}

pub struct UpdateResourceRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
    pub planned_private: Vec<u8>,
    pub provider_meta: Option<DynamicValue>,
}

pub struct UpdateResourceResponse {
    pub new_state: DynamicValue,
    pub private: Vec<u8>,
    pub diagnostics: Vec<Diagnostic>,
}

impl UpdateResourceResponse {
    /// A failed update leaves `prior_state` in place
    pub fn from_result(prior_state: DynamicValue, result: Result<DynamicValue, Diagnostic>) -> Self {
        let (new_state, diagnostics) = match result {
            Ok(state) => (state, vec![]),
            Err(diag) => (prior_state, vec![diag]),
        };
        Self {
            new_state,
            private: vec![],
            diagnostics,
        }
    }
}

pub struct DeleteResourceRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
    pub planned_private: Vec<u8>,
    pub provider_meta: Option<DynamicValue>,
}

pub struct DeleteResourceResponse {
    pub diagnostics: Vec<Diagnostic>,
}

impl From<Result<(), Diagnostic>> for DeleteResourceResponse {
    fn from(result: Result<(), Diagnostic>) -> Self {
        Self {
            diagnostics: result.err().into_iter().collect(),
        }
    }
}

pub struct ImportResourceStateRequest {
    pub type_name: String,
    pub id: String,
    pub client_capabilities: ClientCapabilities,
}

pub struct ImportResourceStateResponse {
    pub imported_resources: Vec<ImportedResource>,
    pub diagnostics: Vec<Diagnostic>,
    pub deferred: Option<Deferred>,
}

impl ImportResourceStateResponse {
    pub fn empty() -> Self {
        Self {
            imported_resources: vec![],
            diagnostics: vec![],
            deferred: None,
        }
    }
}

pub struct ImportedResource {
    pub type_name: String,
    pub state: DynamicValue,
    pub private: Vec<u8>,
}

pub struct UpgradeResourceStateRequest {
    pub type_name: String,
    pub version: i64,
    pub raw_state: RawState,
}

pub struct UpgradeResourceStateResponse {
    pub upgraded_state: DynamicValue,
    pub diagnostics: Vec<Diagnostic>,
}

/// Receives the provider data right after the factory builds the instance.
/// Resources keep the API client from it for later calls.
#[async_trait]
pub trait ResourceWithConfigure: Resource {
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse;
}

pub struct ConfigureResourceRequest {
    /// `ConfigureProviderResponse::provider_data`, to be downcast by the resource
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}

pub struct ConfigureResourceResponse {
    pub diagnostics: Vec<Diagnostic>,
}

impl From<Result<(), Diagnostic>> for ConfigureResourceResponse {
    fn from(result: Result<(), Diagnostic>) -> Self {
        Self {
            diagnostics: result.err().into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttributePath;

    fn with_id(id: &str) -> DynamicValue {
        let mut state = DynamicValue::object();
        state
            .set_string(&AttributePath::new("id"), id.to_string())
            .unwrap();
        state
    }

    #[test]
    fn failed_update_keeps_prior_state() {
        let response = UpdateResourceResponse::from_result(
            with_id("old"),
            Err(Diagnostic::error("Failed to update", "boom")),
        );
        assert_eq!(response.new_state, with_id("old"));
        assert_eq!(response.diagnostics.len(), 1);

        let response = UpdateResourceResponse::from_result(with_id("old"), Ok(with_id("new")));
        assert_eq!(response.new_state, with_id("new"));
        assert!(response.diagnostics.is_empty());
    }

    #[test]
    fn failed_create_saves_nothing() {
        let response = CreateResourceResponse::from_result(Err(Diagnostic::error(
            "Failed to create",
            "InvalidParameter",
        )));
        assert!(response.new_state.is_null());
        assert_eq!(response.diagnostics.len(), 1);
    }

    #[test]
    fn create_failing_after_the_object_exists_keeps_its_id() {
        let response = CreateResourceResponse::from_result(Err(CreateError::after_create(
            with_id("job-1"),
            Diagnostic::error("Failed to read", "timeout"),
        )));
        assert_eq!(response.new_state, with_id("job-1"));
        assert_eq!(response.diagnostics[0].summary, "Failed to read");

        let response = CreateResourceResponse::from_result::<Diagnostic>(Ok(with_id("job-1")));
        assert!(response.diagnostics.is_empty());
    }

    #[test]
    fn read_distinguishes_gone_from_failed() {
        let gone = ReadResourceResponse::from_result(with_id("a"), vec![1], Ok(None));
        assert!(gone.new_state.is_none());
        assert!(gone.diagnostics.is_empty());
        assert_eq!(gone.private, vec![1]);

        let failed = ReadResourceResponse::from_result(
            with_id("a"),
            vec![],
            Err(Diagnostic::error("Failed to read", "timeout")),
        );
        assert_eq!(failed.new_state, Some(with_id("a")));
        assert_eq!(failed.diagnostics[0].summary, "Failed to read");
    }

    #[test]
    fn delete_result_becomes_diagnostics() {
        let ok: DeleteResourceResponse = Ok::<(), Diagnostic>(()).into();
        assert!(ok.diagnostics.is_empty());

        let failed: DeleteResourceResponse = Err::<(), _>(Diagnostic::error("Failed", "nope")).into();
        assert_eq!(failed.diagnostics.len(), 1);
    }
}
