//! Publishes route table entries to CCN

use crate::api::{retry, retry_error, Client};
use crate::helper::{self, LogElapsed};
use crate::id::NotifyRoutesId;
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

#[derive(Default)]
pub struct VpcNotifyRoutesResource {
    provider_data: Option<TencentCloudProviderData>,
}

impl VpcNotifyRoutesResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_id(state: &DynamicValue) -> Result<NotifyRoutesId, Diagnostic> {
        let raw = helper::state_id(state)?;
        NotifyRoutesId::parse(&raw).map_err(helper::id_error)
    }

    async fn read_remote(
        &self,
        client: &Client,
        id: &NotifyRoutesId,
        mut state: DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let policy = client.retry_policy();
        let api = client.vpc();
        let api = &api;
        let route_table_id = id.route_table_id.as_str();
        let table = retry(policy.read, policy.interval, move || async move {
            api.describe_route_table(route_table_id)
                .await
                .map_err(retry_error)
        })
        .await
        .map_err(|e| helper::api_error("Failed to read route table", e))?;

        let Some(table) = table else {
            return Ok(None);
        };
        let published = table.published_items(&id.route_item_ids);
        if published.is_empty() {
            return Ok(None);
        }

        let _ = state.set_string(&AttributePath::new("id"), id.to_string());
        let _ = state.set_string(
            &AttributePath::new("route_table_id"),
            id.route_table_id.clone(),
        );
        let _ = state.set_value(
            &AttributePath::new("route_item_ids"),
            helper::to_string_set(id.route_item_ids.iter().cloned()),
        );
        let _ = state.set_bool(
            &AttributePath::new("published_to_vbc"),
            published.len() == id.route_item_ids.len(),
        );

        Ok(Some(state))
    }

    async fn refresh(&self, current: &DynamicValue) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;
        let id = Self::parse_id(current)?;
        self.read_remote(&data.client, &id, current.clone()).await
    }

    async fn notify(&self, ctx: &Context, planned: DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;
        let client = &data.client;

        let route_table_id = planned
            .get_string(&AttributePath::new("route_table_id"))
            .map_err(|e| Diagnostic::error("Missing route_table_id", e.to_string()))?;
        let id = NotifyRoutesId::new(route_table_id, helper::string_set(&planned, "route_item_ids"));
        if id.route_item_ids.is_empty() {
            return Err(Diagnostic::error(
                "No route items",
                "route_item_ids must contain at least one route item",
            )
            .with_attribute(AttributePath::new("route_item_ids")));
        }
        id.encode().map_err(helper::id_error)?;

        let policy = client.retry_policy();
        let api = client.vpc();
        let api = &api;
        let id_ref = &id;
        retry(policy.write, policy.interval, move || async move {
            api.notify_routes(&id_ref.route_table_id, &id_ref.route_item_ids)
                .await
                .map_err(retry_error)
        })
        .await
        .map_err(|e| helper::api_error("Failed to notify routes", e))?;
        tracing::info!("[{}] published routes {}", ctx.log_id(), id);

        self.read_remote(client, &id, planned)
            .await?
            .ok_or_else(|| {
                Diagnostic::error(
                    "Routes not published",
                    format!("none of the routes in {} are published", id),
                )
            })
    }

    async fn withdraw(&self, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;
        let id = Self::parse_id(prior)?;

        let policy = data.client.retry_policy();
        let api = data.client.vpc();
        let api = &api;
        let id = &id;
        retry(policy.write, policy.interval, move || async move {
            api.withdraw_notify_routes(&id.route_table_id, &id.route_item_ids)
                .await
                .map_err(retry_error)
        })
        .await
        .map_err(|e| helper::api_error("Failed to withdraw routes", e))
    }
}

#[async_trait]
impl Resource for VpcNotifyRoutesResource {
    fn type_name(&self) -> &str {
        "tencentcloud_vpc_notify_routes"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Publishes route table entries to the cloud connect network")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("`route_table_id#item1,item2`")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("route_table_id", AttributeType::String)
                    .description("Route table ID")
                    .required()
                    .plan_modifier(Box::new(RequiresReplaceIfChanged))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("route_item_ids", AttributeType::set_of(AttributeType::String))
                    .description("Unique IDs of the routing policies to publish")
                    .required()
                    .plan_modifier(Box::new(RequiresReplaceIfChanged))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("published_to_vbc", AttributeType::Bool)
                    .description("Whether every listed route is published to CCN")
                    .computed()
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

        let path = AttributePath::new("route_item_ids");
        if let Ok(items) = request.config.get_list(&path) {
            if items.is_empty() {
                diagnostics.push(
                    Diagnostic::error(
                        "No route items",
                        "route_item_ids must contain at least one route item",
                    )
                    .with_attribute(path),
                );
            }
        }

        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let _elapsed = LogElapsed::new("resource.tencentcloud_vpc_notify_routes.create", ctx.log_id());

        let result = self.notify(&ctx, request.planned_state).await;
        CreateResourceResponse::from_result(result)
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let _elapsed = LogElapsed::new("resource.tencentcloud_vpc_notify_routes.read", ctx.log_id());

        let result = self.refresh(&request.current_state).await;
        if matches!(result, Ok(None)) {
            tracing::warn!(
                "[{}] notified routes not found, please check if they have been withdrawn",
                ctx.log_id()
            );
        }
        ReadResourceResponse::from_result(request.current_state, request.private, result)
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        // Every argument forces replacement, so only unchanged plans get here
        let result = helper::check_immutable(
            &request.prior_state,
            &request.planned_state,
            &["route_table_id", "route_item_ids"],
        )
        .map(|()| request.planned_state);
        UpdateResourceResponse::from_result(request.prior_state, result)
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let _elapsed = LogElapsed::new("resource.tencentcloud_vpc_notify_routes.delete", ctx.log_id());

        self.withdraw(&request.prior_state).await.into()
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
impl ResourceWithConfigure for VpcNotifyRoutesResource {
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
