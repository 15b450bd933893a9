//! One-shot operation that pauses a DTS sync job

use crate::api::dts::SYNC_JOB_PAUSED;
use crate::api::{retry, retry_error, wait_for_state};
use crate::helper::{self, LogElapsed};
use crate::TencentCloudProviderData;
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::plan_modifier::RequiresReplaceIfChanged;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, UpdateResourceRequest, UpdateResourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

#[derive(Default)]
pub struct DtsSyncJobPauseOperationResource {
    provider_data: Option<TencentCloudProviderData>,
}

impl DtsSyncJobPauseOperationResource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn pause(&self, ctx: &Context, mut planned: DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;
        let client = &data.client;

        let job_id = planned
            .get_string(&AttributePath::new("job_id"))
            .map_err(|e| Diagnostic::error("Missing job_id", e.to_string()))?;

        let policy = client.retry_policy();
        let api = client.dts();
        let api = &api;
        let job = job_id.as_str();
        retry(policy.write, policy.interval, move || async move {
            api.pause_sync_job(job).await.map_err(retry_error)
        })
        .await
        .map_err(|e| helper::api_error("Failed to pause sync job", e))?;

        tracing::debug!(
            "[{}] waiting for sync job {} to reach {}",
            ctx.log_id(),
            job_id,
            SYNC_JOB_PAUSED
        );
        wait_for_state(SYNC_JOB_PAUSED, policy.state_wait(), policy.interval, || {
            api.sync_job_status(job)
        })
        .await
        .map_err(|e| helper::api_error("Sync job did not pause", e))?;

        let _ = planned.set_string(&AttributePath::new("id"), job_id);
        Ok(planned)
    }
}

#[async_trait]
impl Resource for DtsSyncJobPauseOperationResource {
    fn type_name(&self) -> &str {
        "tencentcloud_dts_sync_job_pause_operation"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Pauses a DTS sync job. Destroying it does not resume the job")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Sync job ID")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("job_id", AttributeType::String)
                    .description("Sync job ID")
                    .required()
                    .plan_modifier(Box::new(RequiresReplaceIfChanged))
                    .build(),
            )
            .build();

        schema.into()
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let _elapsed = LogElapsed::new("resource.tencentcloud_dts_sync_job_pause_operation.create", ctx.log_id());

        let result = self.pause(&ctx, request.planned_state).await;
        CreateResourceResponse::from_result(result)
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        ReadResourceResponse {
            new_state: Some(request.current_state),
            diagnostics: vec![],
            private: request.private,
            deferred: None,
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        // Only non-forcing changes land here; nothing to call
        UpdateResourceResponse::from_result(request.prior_state, Ok(request.planned_state))
    }

    async fn delete(&self, _ctx: Context, _request: DeleteResourceRequest) -> DeleteResourceResponse {
        DeleteResourceResponse {
            diagnostics: vec![],
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for DtsSyncJobPauseOperationResource {
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
