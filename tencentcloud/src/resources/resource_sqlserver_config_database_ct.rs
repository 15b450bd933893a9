//! SQL Server database change tracking configuration

use crate::api::sqlserver::ModifyDatabaseCtRequest;
use crate::api::{poll_flow, retry, retry_error, Client};
use crate::helper::{self, LogElapsed};
use crate::id::DatabaseCtId;
use crate::TencentCloudProviderData;
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::import_state_passthrough_id;
use tfplug::plan_modifier::RequiresReplaceIfChanged;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::{NumberRange, StringOneOf};

pub const MODIFY_TYPE_ENABLE: &str = "enable";
pub const MODIFY_TYPE_DISABLE: &str = "disable";

#[derive(Default)]
pub struct SqlserverConfigDatabaseCtResource {
    provider_data: Option<TencentCloudProviderData>,
}

impl SqlserverConfigDatabaseCtResource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends ModifyDatabaseCT and waits for the returned flow to finish
    async fn apply(
        &self,
        ctx: &Context,
        client: &Client,
        id: &DatabaseCtId,
        planned: &DynamicValue,
    ) -> Result<(), Diagnostic> {
        let modify_type = planned
            .get_string(&AttributePath::new("modify_type"))
            .map_err(|e| Diagnostic::error("Missing modify_type", e.to_string()))?;
        let change_retention_day = planned
            .get_i64(&AttributePath::new("change_retention_day"))
            .ok();

        let request = ModifyDatabaseCtRequest {
            instance_id: id.instance_id.clone(),
            db_names: vec![id.db_name.clone()],
            modify_type,
            change_retention_day,
        };

        let policy = client.retry_policy();
        let request = &request;
        let api = client.sqlserver();
        let api = &api;
        let flow_id = retry(policy.write, policy.interval, move || async move {
            api.modify_database_ct(request).await.map_err(retry_error)
        })
        .await
        .map_err(|e| helper::api_error("Failed to modify database change tracking", e))?;

        tracing::debug!(
            "[{}] waiting for change tracking flow {} on {}",
            ctx.log_id(),
            flow_id,
            id
        );

        poll_flow(policy.flow(), policy.interval, flow_id, || {
            api.describe_flow_status(flow_id)
        })
        .await
        .map_err(|e| helper::api_error("Failed waiting for change tracking flow", e))
    }

    async fn read_remote(
        &self,
        client: &Client,
        id: &DatabaseCtId,
        mut state: DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let policy = client.retry_policy();
        let api = client.sqlserver();
        let api = &api;
        let instance_id = id.instance_id.as_str();
        let databases = retry(policy.read, policy.interval, move || async move {
            api.describe_dbs_normal(instance_id).await.map_err(retry_error)
        })
        .await
        .map_err(|e| helper::api_error("Failed to read database change tracking", e))?;

        let Some(database) = databases.into_iter().find(|db| db.name == id.db_name) else {
            return Ok(None);
        };

        let modify_type = if database.change_tracking_enabled() {
            MODIFY_TYPE_ENABLE
        } else {
            MODIFY_TYPE_DISABLE
        };

        let _ = state.set_string(&AttributePath::new("id"), id.to_string());
        let _ = state.set_string(&AttributePath::new("instance_id"), id.instance_id.clone());
        let _ = state.set_string(&AttributePath::new("db_name"), id.db_name.clone());
        let _ = state.set_string(&AttributePath::new("modify_type"), modify_type.to_string());
        let _ = state.set_number(
            &AttributePath::new("change_retention_day"),
            database.retention_days() as f64,
        );

        Ok(Some(state))
    }

    async fn refresh(&self, current: &DynamicValue) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;
        let raw = helper::state_id(current)?;
        let id = DatabaseCtId::parse(&raw).map_err(helper::id_error)?;
        self.read_remote(&data.client, &id, current.clone()).await
    }

    /// Shared by create and update: apply the plan, then read it back
    async fn apply_and_read(
        &self,
        ctx: &Context,
        planned: DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;

        let instance_id = planned
            .get_string(&AttributePath::new("instance_id"))
            .map_err(|e| Diagnostic::error("Missing instance_id", e.to_string()))?;
        let db_name = planned
            .get_string(&AttributePath::new("db_name"))
            .map_err(|e| Diagnostic::error("Missing db_name", e.to_string()))?;
        let id = DatabaseCtId {
            instance_id,
            db_name,
        };
        id.encode().map_err(helper::id_error)?;

        self.apply(ctx, &data.client, &id, &planned).await?;

        self.read_remote(&data.client, &id, planned)
            .await?
            .ok_or_else(|| {
                Diagnostic::error(
                    "Database not found",
                    format!("database {} was not found after modifying change tracking", id),
                )
            })
    }
}

#[async_trait]
impl Resource for SqlserverConfigDatabaseCtResource {
    fn type_name(&self) -> &str {
        "tencentcloud_sqlserver_config_database_ct"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Enables or disables change tracking for a SQL Server database")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("`instance_id#db_name`")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("instance_id", AttributeType::String)
                    .description("Instance ID")
                    .required()
                    .plan_modifier(Box::new(RequiresReplaceIfChanged))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("db_name", AttributeType::String)
                    .description("Database name")
                    .required()
                    .plan_modifier(Box::new(RequiresReplaceIfChanged))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("modify_type", AttributeType::String)
                    .description("Enable or disable change tracking. Valid values: `enable`, `disable`")
                    .required()
                    .validator(Box::new(StringOneOf::new([
                        MODIFY_TYPE_ENABLE,
                        MODIFY_TYPE_DISABLE,
                    ])))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("change_retention_day", AttributeType::Number)
                    .description("Retention period of change tracking data in days, 3 to 30")
                    .optional()
                    .computed()
                    .validator(Box::new(NumberRange {
                        min: Some(3.0),
                        max: Some(30.0),
                    }))
                    .build(),
            )
            .build();

        schema.into()
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];

        let path = AttributePath::new("change_retention_day");
        if let Some(value) = request.config.get(&path).and_then(|v| v.as_number()) {
            if value.fract() != 0.0 {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid change_retention_day",
                        format!("change_retention_day must be a whole number of days, got {}", value),
                    )
                    .with_attribute(path),
                );
            }
        }

        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let _elapsed = LogElapsed::new("resource.tencentcloud_sqlserver_config_database_ct.create", ctx.log_id());

        let result = self.apply_and_read(&ctx, request.planned_state).await;
        CreateResourceResponse::from_result(result)
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let _elapsed = LogElapsed::new("resource.tencentcloud_sqlserver_config_database_ct.read", ctx.log_id());

        let result = self.refresh(&request.current_state).await;
        if matches!(result, Ok(None)) {
            tracing::warn!(
                "[{}] sqlserver database change tracking not found, removing from state",
                ctx.log_id()
            );
        }
        ReadResourceResponse::from_result(request.current_state, request.private, result)
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let _elapsed = LogElapsed::new("resource.tencentcloud_sqlserver_config_database_ct.update", ctx.log_id());

        let result = match helper::check_immutable(
            &request.prior_state,
            &request.planned_state,
            &["instance_id", "db_name"],
        ) {
            Ok(()) => self.apply_and_read(&ctx, request.planned_state).await,
            Err(diag) => Err(diag),
        };
        UpdateResourceResponse::from_result(request.prior_state, result)
    }

    async fn delete(&self, ctx: Context, _request: DeleteResourceRequest) -> DeleteResourceResponse {
        // Change tracking stays as configured; only the state entry goes away
        tracing::debug!(
            "[{}] delete of sqlserver database change tracking is a no-op",
            ctx.log_id()
        );
        DeleteResourceResponse {
            diagnostics: vec![],
        }
    }

    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request)
    }
}

#[async_trait]
impl ResourceWithConfigure for SqlserverConfigDatabaseCtResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        helper::extract_provider_data(request.provider_data)
            .map(|data| self.provider_data = Some(data))
            .into()
    }
}
