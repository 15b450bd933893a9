//! WAF ports data source

use crate::api::waf::DescribePortsRequest;
use crate::api::{retry, retry_error};
use crate::helper::{self, LogElapsed};
use crate::output::{self, RESULT_OUTPUT_FILE};
use crate::TencentCloudProviderData;
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::StringOneOf;

#[derive(Default)]
pub struct WafPortsDataSource {
    provider_data: Option<TencentCloudProviderData>,
}

impl WafPortsDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn query(&self, mut state: DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;
        let client = &data.client;

        let request = DescribePortsRequest {
            edition: helper::optional_string(&state, "edition"),
            instance_id: helper::optional_string(&state, "instance_id"),
        };

        let policy = client.retry_policy();
        let api = client.waf();
        let api = &api;
        let request = &request;
        let ports = retry(policy.read, policy.interval, move || async move {
            api.describe_ports(request).await.map_err(retry_error)
        })
        .await
        .map_err(|e| helper::api_error("Failed to read WAF ports", e))?;

        let http_ports = ports.http_ports.unwrap_or_default();
        let https_ports = ports.https_ports.unwrap_or_default();

        let _ = state.set_string(&AttributePath::new("id"), ports.request_id);
        let _ = state.set_value(
            &AttributePath::new("http_ports"),
            helper::to_string_set(http_ports.iter().cloned()),
        );
        let _ = state.set_value(
            &AttributePath::new("https_ports"),
            helper::to_string_set(https_ports.iter().cloned()),
        );

        output::write_result(
            &state,
            &serde_json::json!({
                "http_ports": http_ports,
                "https_ports": https_ports,
            }),
        )
        .await?;

        Ok(state)
    }
}

#[async_trait]
impl DataSource for WafPortsDataSource {
    fn type_name(&self) -> &str {
        "tencentcloud_waf_ports"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Lists the ports a WAF instance can protect")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("edition", AttributeType::String)
                    .description("Instance edition, `sparta-waf` for SaaS or `clb-waf` for load balancer WAF")
                    .optional()
                    .validator(Box::new(StringOneOf::new(["sparta-waf", "clb-waf"])))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("instance_id", AttributeType::String)
                    .description("Instance ID")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("http_ports", AttributeType::set_of(AttributeType::String))
                    .description("HTTP ports")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("https_ports", AttributeType::set_of(AttributeType::String))
                    .description("HTTPS ports")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(RESULT_OUTPUT_FILE, AttributeType::String)
                    .description("Used to save results")
                    .optional()
                    .build(),
            )
            .build();

        schema.into()
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let _elapsed = LogElapsed::new("data_source.tencentcloud_waf_ports.read", ctx.log_id());

        let result = self.query(request.config.clone()).await;
        ReadDataSourceResponse::from_result(request.config, result)
    }
}

#[async_trait]
impl DataSourceWithConfigure for WafPortsDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        helper::extract_provider_data(request.provider_data)
            .map(|data| self.provider_data = Some(data))
            .into()
    }
}
