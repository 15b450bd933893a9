//! Data sources: read-only lookups whose result becomes state

use crate::context::Context;
use crate::schema::Schema;
use crate::types::{ClientCapabilities, Deferred, Diagnostic, DynamicValue};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Full type name, e.g. `tencentcloud_scf_triggers`. Must equal the key
    /// the provider registers the factory under.
    fn type_name(&self) -> &str;

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        ctx: Context,
        request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse;

    /// Checks beyond what the schema expresses. Runs after required
    /// attributes and attribute validators have been checked.
    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: vec![],
        }
    }

    /// Every computed attribute must be set in the returned state; unknowns
    /// left behind are sent as null.
    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse;
}

pub struct DataSourceMetadataRequest;

pub struct DataSourceMetadataResponse {
    pub type_name: String,
}

pub struct DataSourceSchemaRequest;

pub struct DataSourceSchemaResponse {
    pub schema: Schema,
    pub diagnostics: Vec<Diagnostic>,
}

impl From<Schema> for DataSourceSchemaResponse {
    fn from(schema: Schema) -> Self {
        Self {
            schema,
            diagnostics: vec![],
        }
    }
}

pub struct ValidateDataSourceConfigRequest {
    pub type_name: String,
    pub config: DynamicValue,
}

pub struct ValidateDataSourceConfigResponse {
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ReadDataSourceRequest {
    pub type_name: String,
    pub config: DynamicValue,
    pub provider_meta: Option<DynamicValue>,
    pub client_capabilities: ClientCapabilities,
}

pub struct ReadDataSourceResponse {
    pub state: DynamicValue,
    pub diagnostics: Vec<Diagnostic>,
    pub deferred: Option<Deferred>,
}

impl ReadDataSourceResponse {
    /// The queried state on success; on failure `config` goes back
    /// untouched together with the error
    pub fn from_result(config: DynamicValue, result: Result<DynamicValue, Diagnostic>) -> Self {
        let (state, diagnostics) = match result {
            Ok(state) => (state, vec![]),
            Err(diag) => (config, vec![diag]),
        };
        Self {
            state,
            diagnostics,
            deferred: None,
        }
    }
}

/// Receives the provider data right after the factory builds the instance
#[async_trait]
pub trait DataSourceWithConfigure: DataSource {
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse;
}

pub struct ConfigureDataSourceRequest {
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}

pub struct ConfigureDataSourceResponse {
    pub diagnostics: Vec<Diagnostic>,
}

impl From<Result<(), Diagnostic>> for ConfigureDataSourceResponse {
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

    #[test]
    fn failed_read_returns_config() {
        let mut config = DynamicValue::object();
        config
            .set_string(&AttributePath::new("name"), "fn".to_string())
            .unwrap();

        let response = ReadDataSourceResponse::from_result(
            config.clone(),
            Err(Diagnostic::error("boom", "read failed")),
        );

        assert_eq!(response.state, config);
        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.deferred.is_none());
    }

    #[test]
    fn configure_error_becomes_diagnostic() {
        let ok: ConfigureDataSourceResponse = Ok::<(), Diagnostic>(()).into();
        assert!(ok.diagnostics.is_empty());

        let failed: ConfigureDataSourceResponse =
            Err::<(), _>(Diagnostic::error("Invalid provider data", "wrong type")).into();
        assert_eq!(failed.diagnostics[0].summary, "Invalid provider data");
    }
}
