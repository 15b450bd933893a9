//! VPC flow log enable/disable switch

use crate::api::{retry, retry_error, Client};
use crate::helper::{self, LogElapsed};
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
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

#[derive(Default)]
pub struct VpcFlowLogConfigResource {
    provider_data: Option<TencentCloudProviderData>,
}

impl VpcFlowLogConfigResource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_remote(
        &self,
        client: &Client,
        flow_log_id: &str,
        mut state: DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let policy = client.retry_policy();
        let api = client.vpc();
        let api = &api;
        let flow_logs = retry(policy.read, policy.interval, move || async move {
            api.describe_flow_logs(flow_log_id).await.map_err(retry_error)
        })
        .await
        .map_err(|e| helper::api_error("Failed to read flow log", e))?;

        let Some(flow_log) = flow_logs
            .into_iter()
            .find(|flow_log| flow_log.flow_log_id == flow_log_id)
        else {
            return Ok(None);
        };

        let _ = state.set_string(&AttributePath::new("id"), flow_log_id.to_string());
        let _ = state.set_string(&AttributePath::new("flow_log_id"), flow_log_id.to_string());
        if let Some(enable) = flow_log.enable {
            let _ = state.set_bool(&AttributePath::new("enable"), enable);
        }

        Ok(Some(state))
    }

    /// Flips the flow log to the planned switch value and reads it back
    async fn apply(&self, planned: DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;
        let client = &data.client;

        let flow_log_id = planned
            .get_string(&AttributePath::new("flow_log_id"))
            .map_err(|e| Diagnostic::error("Missing flow_log_id", e.to_string()))?;
        let enable = planned
            .get_bool(&AttributePath::new("enable"))
            .unwrap_or(false);

        let policy = client.retry_policy();
        let api = client.vpc();
        let api = &api;
        let ids = [flow_log_id.clone()];
        let ids = &ids;
        retry(policy.write, policy.interval, move || async move {
            let result = if enable {
                api.enable_flow_logs(ids).await
            } else {
                api.disable_flow_logs(ids).await
            };
            result.map_err(retry_error)
        })
        .await
        .map_err(|e| helper::api_error("Failed to update flow log config", e))?;

        self.read_remote(client, &flow_log_id, planned)
            .await?
            .ok_or_else(|| {
                Diagnostic::error(
                    "Flow log not found",
                    format!("flow log {} was not found", flow_log_id),
                )
            })
    }

    async fn refresh(&self, current: &DynamicValue) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;
        let flow_log_id = helper::state_id(current)?;
        self.read_remote(&data.client, &flow_log_id, current.clone())
            .await
    }
}

#[async_trait]
impl Resource for VpcFlowLogConfigResource {
    fn type_name(&self) -> &str {
        "tencentcloud_vpc_flow_log_config"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Enables or disables an existing VPC flow log")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Flow log ID")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("flow_log_id", AttributeType::String)
                    .description("Flow log ID")
                    .required()
                    .plan_modifier(Box::new(RequiresReplaceIfChanged))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("enable", AttributeType::Bool)
                    .description("Whether the flow log is enabled")
                    .required()
                    .build(),
            )
            .build();

        schema.into()
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let _elapsed = LogElapsed::new("resource.tencentcloud_vpc_flow_log_config.create", ctx.log_id());

        let result = self.apply(request.planned_state).await;
        CreateResourceResponse::from_result(result)
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let _elapsed = LogElapsed::new("resource.tencentcloud_vpc_flow_log_config.read", ctx.log_id());

        let result = self.refresh(&request.current_state).await;
        if matches!(result, Ok(None)) {
            tracing::warn!(
                "[{}] flow log not found, please check if it has been deleted",
                ctx.log_id()
            );
        }
        ReadResourceResponse::from_result(request.current_state, request.private, result)
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let _elapsed = LogElapsed::new("resource.tencentcloud_vpc_flow_log_config.update", ctx.log_id());

        let result = self.apply(request.planned_state).await;
        UpdateResourceResponse::from_result(request.prior_state, result)
    }

    async fn delete(&self, _ctx: Context, _request: DeleteResourceRequest) -> DeleteResourceResponse {
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
impl ResourceWithConfigure for VpcFlowLogConfigResource {
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
