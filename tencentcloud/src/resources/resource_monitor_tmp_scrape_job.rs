//! Prometheus scrape job resource

use crate::api::monitor::{CreateScrapeJobRequest, UpdateScrapeJobRequest};
use crate::api::{retry, retry_error, Client};
use crate::helper::{self, LogElapsed};
use crate::id::ScrapeJobId;
use crate::TencentCloudProviderData;
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::import_state_passthrough_id;
use tfplug::plan_modifier::{ImmutableAfterCreate, UseStateForUnknown};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateError, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, UpdateResourceRequest, UpdateResourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

#[derive(Default)]
pub struct MonitorTmpScrapeJobResource {
    provider_data: Option<TencentCloudProviderData>,
}

impl MonitorTmpScrapeJobResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_id(state: &DynamicValue) -> Result<ScrapeJobId, Diagnostic> {
        let raw = helper::state_id(state)?;
        ScrapeJobId::parse(&raw).map_err(helper::id_error)
    }

    async fn read_remote(
        &self,
        client: &Client,
        id: &ScrapeJobId,
        mut state: DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let policy = client.retry_policy();
        let api = client.monitor();
        let api = &api;
        let job = retry(policy.read, policy.interval, move || async move {
            api.describe_scrape_job(&id.instance_id, &id.agent_id, &id.job_id)
                .await
                .map_err(retry_error)
        })
        .await
        .map_err(|e| helper::api_error("Failed to read scrape job", e))?;

        let Some(job) = job else {
            return Ok(None);
        };

        let _ = state.set_string(&AttributePath::new("id"), id.to_string());
        let _ = state.set_string(&AttributePath::new("instance_id"), id.instance_id.clone());
        let agent_id = if job.agent_id.is_empty() {
            id.agent_id.clone()
        } else {
            job.agent_id
        };
        let _ = state.set_string(&AttributePath::new("agent_id"), agent_id);
        if let Some(config) = job.config {
            let _ = state.set_string(&AttributePath::new("config"), config);
        }

        Ok(Some(state))
    }

    async fn refresh(&self, current: &DynamicValue) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;
        let id = Self::parse_id(current)?;
        self.read_remote(&data.client, &id, current.clone()).await
    }

    async fn create_job(&self, ctx: &Context, planned: DynamicValue) -> Result<DynamicValue, CreateError> {
        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;
        let client = &data.client;

        let request = CreateScrapeJobRequest {
            instance_id: planned
                .get_string(&AttributePath::new("instance_id"))
                .map_err(|e| Diagnostic::error("Missing instance_id", e.to_string()))?,
            agent_id: planned
                .get_string(&AttributePath::new("agent_id"))
                .map_err(|e| Diagnostic::error("Missing agent_id", e.to_string()))?,
            config: helper::optional_string(&planned, "config"),
        };

        let policy = client.retry_policy();
        let api = client.monitor();
        let api = &api;
        let request = &request;
        let job_id = retry(policy.write, policy.interval, move || async move {
            api.create_scrape_job(request).await.map_err(retry_error)
        })
        .await
        .map_err(|e| helper::api_error("Failed to create scrape job", e))?;

        let id = ScrapeJobId {
            job_id,
            instance_id: request.instance_id.clone(),
            agent_id: request.agent_id.clone(),
        };
        id.encode().map_err(helper::id_error)?;
        tracing::info!("[{}] created scrape job {}", ctx.log_id(), id);

        let mut created = planned;
        let _ = created.set_string(&AttributePath::new("id"), id.to_string());
        match self.read_remote(client, &id, created.clone()).await {
            Ok(Some(state)) => Ok(state),
            Ok(None) => Err(CreateError::after_create(
                created,
                Diagnostic::error(
                    "Scrape job not found",
                    format!("scrape job {} was not found after creation", id),
                ),
            )),
            Err(diag) => Err(CreateError::after_create(created, diag)),
        }
    }

    async fn update_job(
        &self,
        prior: &DynamicValue,
        planned: DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        helper::check_immutable(prior, &planned, &["instance_id", "agent_id"])?;

        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;
        let client = &data.client;
        let id = Self::parse_id(prior)?;

        if helper::has_change(prior, &planned, "config") {
            let request = UpdateScrapeJobRequest {
                job_id: id.job_id.clone(),
                instance_id: id.instance_id.clone(),
                agent_id: id.agent_id.clone(),
                config: helper::optional_string(&planned, "config"),
            };

            let policy = client.retry_policy();
            let api = client.monitor();
            let api = &api;
            let request = &request;
            retry(policy.write, policy.interval, move || async move {
                api.update_scrape_job(request).await.map_err(retry_error)
            })
            .await
            .map_err(|e| helper::api_error("Failed to update scrape job", e))?;
        }

        self.read_remote(client, &id, planned)
            .await?
            .ok_or_else(|| {
                Diagnostic::error(
                    "Scrape job not found",
                    format!("scrape job {} was not found after update", id),
                )
            })
    }

    async fn delete_job(&self, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;
        let id = Self::parse_id(prior)?;

        let policy = data.client.retry_policy();
        let api = data.client.monitor();
        let api = &api;
        let id = &id;
        retry(policy.write, policy.interval, move || async move {
            api.delete_scrape_job(&id.instance_id, &id.agent_id, &id.job_id)
                .await
                .map_err(retry_error)
        })
        .await
        .map_err(|e| helper::api_error("Failed to delete scrape job", e))
    }
}

#[async_trait]
impl Resource for MonitorTmpScrapeJobResource {
    fn type_name(&self) -> &str {
        "tencentcloud_monitor_tmp_scrape_job"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Manages a scrape job of a managed Prometheus instance")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("`job_id#instance_id#agent_id`")
                    .computed()
                    .plan_modifier(Box::new(UseStateForUnknown))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("instance_id", AttributeType::String)
                    .description("Instance ID")
                    .required()
                    .plan_modifier(Box::new(ImmutableAfterCreate))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("agent_id", AttributeType::String)
                    .description("Agent ID")
                    .required()
                    .plan_modifier(Box::new(ImmutableAfterCreate))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("config", AttributeType::String)
                    .description("Job content, in Prometheus scrape config YAML")
                    .optional()
                    .build(),
            )
            .build();

        schema.into()
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let _elapsed = LogElapsed::new("resource.tencentcloud_monitor_tmp_scrape_job.create", ctx.log_id());

        let result = self.create_job(&ctx, request.planned_state).await;
        CreateResourceResponse::from_result(result)
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let _elapsed = LogElapsed::new("resource.tencentcloud_monitor_tmp_scrape_job.read", ctx.log_id());

        let result = self.refresh(&request.current_state).await;
        if matches!(result, Ok(None)) {
            tracing::warn!(
                "[{}] scrape job not found, please check if it has been deleted",
                ctx.log_id()
            );
        }
        ReadResourceResponse::from_result(request.current_state, request.private, result)
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let _elapsed = LogElapsed::new("resource.tencentcloud_monitor_tmp_scrape_job.update", ctx.log_id());

        let result = self
            .update_job(&request.prior_state, request.planned_state)
            .await;
        UpdateResourceResponse::from_result(request.prior_state, result)
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let _elapsed = LogElapsed::new("resource.tencentcloud_monitor_tmp_scrape_job.delete", ctx.log_id());

        self.delete_job(&request.prior_state).await.into()
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
impl ResourceWithConfigure for MonitorTmpScrapeJobResource {
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
