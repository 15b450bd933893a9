pub mod api;
pub mod data_sources;
pub mod helper;
pub mod id;
pub mod output;
pub mod provider_data;
pub mod resources;

pub use provider_data::TencentCloudProviderData;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderMetadataRequest, ProviderMetadataResponse, ProviderSchemaRequest,
    ProviderSchemaResponse, ResourceFactory, StopProviderRequest, StopProviderResponse,
    ValidateProviderConfigRequest, ValidateProviderConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue, ServerCapabilities};
use tfplug::validator::StringOneOf;
use tfplug::{DataSourceWithConfigure, ResourceWithConfigure};

pub const PROVIDER_NAME: &str = "tencentcloud";

pub const ENV_SECRET_ID: &str = "TENCENTCLOUD_SECRET_ID";
pub const ENV_SECRET_KEY: &str = "TENCENTCLOUD_SECRET_KEY";
pub const ENV_SECURITY_TOKEN: &str = "TENCENTCLOUD_SECURITY_TOKEN";
pub const ENV_REGION: &str = "TENCENTCLOUD_REGION";
pub const ENV_PROTOCOL: &str = "TENCENTCLOUD_PROTOCOL";
pub const ENV_DOMAIN: &str = "TENCENTCLOUD_DOMAIN";
pub const ENV_ENDPOINT: &str = "TENCENTCLOUD_ENDPOINT";

#[derive(Default)]
pub struct TencentCloudProvider;

impl TencentCloudProvider {
    pub fn new() -> Self {
        Self
    }
}

/// Provider block attribute, falling back to its environment variable
fn config_or_env(config: &DynamicValue, name: &str, env: &str) -> Option<String> {
    config
        .get_string(&AttributePath::new(name))
        .ok()
        .or_else(|| std::env::var(env).ok())
        .filter(|value| !value.is_empty())
}

fn missing(name: &str, env: &str) -> Diagnostic {
    Diagnostic::error(
        format!("{} is required", name),
        format!(
            "{} is required (set in provider config or {} env var)",
            name, env
        ),
    )
    .with_attribute(AttributePath::new(name))
}

/// Builds the API client configuration from the provider block
fn client_config(config: &DynamicValue) -> Result<api::ClientConfig, Vec<Diagnostic>> {
    let secret_id = config_or_env(config, "secret_id", ENV_SECRET_ID);
    let secret_key = config_or_env(config, "secret_key", ENV_SECRET_KEY);
    let region = config_or_env(config, "region", ENV_REGION);

    let (secret_id, secret_key, region) = match (secret_id, secret_key, region) {
        (Some(id), Some(key), Some(region)) => (id, key, region),
        (id, key, region) => {
            let mut diagnostics = vec![];
            if id.is_none() {
                diagnostics.push(missing("secret_id", ENV_SECRET_ID));
            }
            if key.is_none() {
                diagnostics.push(missing("secret_key", ENV_SECRET_KEY));
            }
            if region.is_none() {
                diagnostics.push(missing("region", ENV_REGION));
            }
            return Err(diagnostics);
        }
    };

    let credential = api::Credential {
        secret_id,
        secret_key,
        token: config_or_env(config, "security_token", ENV_SECURITY_TOKEN),
    };

    let mut client_config = api::ClientConfig::new(credential, region);
    if let Some(protocol) = config_or_env(config, "protocol", ENV_PROTOCOL) {
        client_config = client_config.with_protocol(protocol);
    }
    if let Some(domain) = config_or_env(config, "domain", ENV_DOMAIN) {
        client_config = client_config.with_domain(domain);
    }
    if let Some(endpoint) = config_or_env(config, "endpoint", ENV_ENDPOINT) {
        client_config = client_config.with_endpoint(endpoint);
    }

    Ok(client_config)
}

#[async_trait]
impl Provider for TencentCloudProvider {
    fn type_name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: PROVIDER_NAME.to_string(),
            server_capabilities: ServerCapabilities {
                plan_destroy: true,
                get_provider_schema_optional: false,
                move_resource_state: false,
            },
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        let schema = SchemaBuilder::new()
            .description("Tencent Cloud provider")
            .attribute(
                AttributeBuilder::new("secret_id", AttributeType::String)
                    .description("Tencent Cloud SecretId. Can also be set with TENCENTCLOUD_SECRET_ID")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("secret_key", AttributeType::String)
                    .description("Tencent Cloud SecretKey. Can also be set with TENCENTCLOUD_SECRET_KEY")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("security_token", AttributeType::String)
                    .description("Temporary session token. Can also be set with TENCENTCLOUD_SECURITY_TOKEN")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("region", AttributeType::String)
                    .description("Region to manage resources in. Can also be set with TENCENTCLOUD_REGION")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("protocol", AttributeType::String)
                    .description("API protocol, HTTPS (default) or HTTP")
                    .optional()
                    .validator(Box::new(StringOneOf::new(["HTTPS", "HTTP"])))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("domain", AttributeType::String)
                    .description("Root domain of the API endpoints, defaults to tencentcloudapi.com")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("endpoint", AttributeType::String)
                    .description("Base URL used for every service instead of the per-service endpoint")
                    .optional()
                    .build(),
            )
            .build();

        ProviderSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let client_config = match client_config(&request.config) {
            Ok(config) => config,
            Err(diagnostics) => {
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        };

        tracing::info!(
            "[{}] Configuring provider for region {}",
            ctx.log_id(),
            client_config.region
        );

        match api::Client::new(client_config) {
            Ok(client) => {
                ConfigureProviderResponse {
                    diagnostics: vec![],
                    provider_data: Some(Arc::new(TencentCloudProviderData::new(client))),
                }
            }
            Err(e) => ConfigureProviderResponse {
                diagnostics: vec![Diagnostic::error(
                    "Failed to create API client",
                    e.to_string(),
                )],
                provider_data: None,
            },
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        let mut diagnostics = vec![];

        if let Ok(endpoint) = request.config.get_string(&AttributePath::new("endpoint")) {
            if url::Url::parse(&endpoint).is_err() {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid endpoint",
                        format!("'{}' is not a valid URL", endpoint),
                    )
                    .with_attribute(AttributePath::new("endpoint")),
                );
            }
        }

        ValidateProviderConfigResponse { diagnostics }
    }

    async fn stop(&self, _ctx: Context, _request: StopProviderRequest) -> StopProviderResponse {
        StopProviderResponse { error: None }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut factories: HashMap<String, ResourceFactory> = HashMap::new();
        factories.insert(
            "tencentcloud_sqlserver_config_database_ct".to_string(),
            Box::new(|| {
                Box::new(resources::SqlserverConfigDatabaseCtResource::new())
                    as Box<dyn ResourceWithConfigure>
            }),
        );
        factories.insert(
            "tencentcloud_clickhouse_account_permission".to_string(),
            Box::new(|| {
                Box::new(resources::ClickhouseAccountPermissionResource::new())
                    as Box<dyn ResourceWithConfigure>
            }),
        );
        factories.insert(
            "tencentcloud_monitor_tmp_scrape_job".to_string(),
            Box::new(|| {
                Box::new(resources::MonitorTmpScrapeJobResource::new())
                    as Box<dyn ResourceWithConfigure>
            }),
        );
        factories.insert(
            "tencentcloud_vpc_flow_log_config".to_string(),
            Box::new(|| {
                Box::new(resources::VpcFlowLogConfigResource::new())
                    as Box<dyn ResourceWithConfigure>
            }),
        );
        factories.insert(
            "tencentcloud_vpc_notify_routes".to_string(),
            Box::new(|| {
                Box::new(resources::VpcNotifyRoutesResource::new())
                    as Box<dyn ResourceWithConfigure>
            }),
        );
        factories.insert(
            "tencentcloud_dts_sync_job_pause_operation".to_string(),
            Box::new(|| {
                Box::new(resources::DtsSyncJobPauseOperationResource::new())
                    as Box<dyn ResourceWithConfigure>
            }),
        );
        factories
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut factories: HashMap<String, DataSourceFactory> = HashMap::new();
        factories.insert(
            "tencentcloud_waf_ports".to_string(),
            Box::new(|| {
                Box::new(data_sources::WafPortsDataSource::new())
                    as Box<dyn DataSourceWithConfigure>
            }),
        );
        factories.insert(
            "tencentcloud_cynosdb_backup_download_url".to_string(),
            Box::new(|| {
                Box::new(data_sources::CynosdbBackupDownloadUrlDataSource::new())
                    as Box<dyn DataSourceWithConfigure>
            }),
        );
        factories.insert(
            "tencentcloud_scf_request_status".to_string(),
            Box::new(|| {
                Box::new(data_sources::ScfRequestStatusDataSource::new())
                    as Box<dyn DataSourceWithConfigure>
            }),
        );
        factories.insert(
            "tencentcloud_scf_triggers".to_string(),
            Box::new(|| {
                Box::new(data_sources::ScfTriggersDataSource::new())
                    as Box<dyn DataSourceWithConfigure>
            }),
        );
        factories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tfplug::types::ClientCapabilities;

    const ALL_ENV: [&str; 7] = [
        ENV_SECRET_ID,
        ENV_SECRET_KEY,
        ENV_SECURITY_TOKEN,
        ENV_REGION,
        ENV_PROTOCOL,
        ENV_DOMAIN,
        ENV_ENDPOINT,
    ];

    fn clear_env() {
        for name in ALL_ENV {
            std::env::remove_var(name);
        }
    }

    fn configure_request(config: DynamicValue) -> ConfigureProviderRequest {
        ConfigureProviderRequest {
            terraform_version: "1.5.0".to_string(),
            config,
            client_capabilities: ClientCapabilities::default(),
        }
    }

    fn client_of(response: &ConfigureProviderResponse) -> &api::Client {
        let data = response
            .provider_data
            .as_ref()
            .and_then(|data| data.downcast_ref::<TencentCloudProviderData>())
            .unwrap();
        &data.client
    }

    #[tokio::test]
    #[serial]
    async fn provider_configures_successfully_with_env_vars() {
        clear_env();
        std::env::set_var(ENV_SECRET_ID, "AKIDtest");
        std::env::set_var(ENV_SECRET_KEY, "secret");
        std::env::set_var(ENV_REGION, "ap-guangzhou");

        let mut provider = TencentCloudProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(DynamicValue::object()))
            .await;

        assert!(response.diagnostics.is_empty());
        assert_eq!(client_of(&response).region(), "ap-guangzhou");

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn provider_config_overrides_env() {
        clear_env();
        std::env::set_var(ENV_REGION, "ap-guangzhou");

        let mut config = DynamicValue::object();
        for (name, value) in [
            ("secret_id", "AKIDcfg"),
            ("secret_key", "cfg"),
            ("region", "ap-shanghai"),
            ("endpoint", "http://127.0.0.1:9000"),
        ] {
            config
                .set_string(&AttributePath::new(name), value.to_string())
                .unwrap();
        }

        let mut provider = TencentCloudProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(config))
            .await;

        assert!(response.diagnostics.is_empty());
        let client = client_of(&response);
        assert_eq!(client.region(), "ap-shanghai");
        assert_eq!(
            client.service_url("vpc").unwrap().as_str(),
            "http://127.0.0.1:9000/"
        );

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn provider_configure_requires_credentials_and_region() {
        clear_env();

        let mut provider = TencentCloudProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(DynamicValue::object()))
            .await;

        let summaries: Vec<_> = response
            .diagnostics
            .iter()
            .map(|d| d.summary.as_str())
            .collect();
        assert_eq!(
            summaries,
            vec![
                "secret_id is required",
                "secret_key is required",
                "region is required"
            ]
        );
        assert!(response.diagnostics[0].detail.contains(ENV_SECRET_ID));
        assert!(response.provider_data.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn provider_rejects_unknown_protocol() {
        clear_env();
        std::env::set_var(ENV_SECRET_ID, "AKIDtest");
        std::env::set_var(ENV_SECRET_KEY, "secret");
        std::env::set_var(ENV_REGION, "ap-guangzhou");
        std::env::set_var(ENV_PROTOCOL, "FTP");

        let mut provider = TencentCloudProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(DynamicValue::object()))
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Failed to create API client");

        clear_env();
    }

    #[tokio::test]
    async fn provider_validate_rejects_bad_endpoint() {
        let provider = TencentCloudProvider::new();
        let mut config = DynamicValue::object();
        config
            .set_string(&AttributePath::new("endpoint"), "not a url".to_string())
            .unwrap();

        let response = provider
            .validate(Context::new(), ValidateProviderConfigRequest { config })
            .await;
        assert_eq!(response.diagnostics.len(), 1);
    }

    #[test]
    fn provider_registers_every_type() {
        let provider = TencentCloudProvider::new();

        let mut resources: Vec<_> = provider.resources().into_keys().collect();
        resources.sort();
        assert_eq!(
            resources,
            vec![
                "tencentcloud_clickhouse_account_permission",
                "tencentcloud_dts_sync_job_pause_operation",
                "tencentcloud_monitor_tmp_scrape_job",
                "tencentcloud_sqlserver_config_database_ct",
                "tencentcloud_vpc_flow_log_config",
                "tencentcloud_vpc_notify_routes",
            ]
        );

        let mut data_sources: Vec<_> = provider.data_sources().into_keys().collect();
        data_sources.sort();
        assert_eq!(
            data_sources,
            vec![
                "tencentcloud_cynosdb_backup_download_url",
                "tencentcloud_scf_request_status",
                "tencentcloud_scf_triggers",
                "tencentcloud_waf_ports",
            ]
        );
    }

    #[tokio::test]
    async fn factories_build_matching_types() {
        let provider = TencentCloudProvider::new();
        for (name, factory) in provider.resources() {
            assert_eq!(factory().type_name(), name);
        }
        for (name, factory) in provider.data_sources() {
            assert_eq!(factory().type_name(), name);
        }
    }
}
