//! CynosDB backup download URL data source

use crate::api::{retry, retry_error};
use crate::helper::{self, LogElapsed};
use crate::output::{self, RESULT_OUTPUT_FILE};
use crate::TencentCloudProviderData;
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse, ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

#[derive(Default)]
pub struct CynosdbBackupDownloadUrlDataSource {
    provider_data: Option<TencentCloudProviderData>,
}

impl CynosdbBackupDownloadUrlDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn query(&self, mut state: DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;
        let client = &data.client;

        let cluster_id = state
            .get_string(&AttributePath::new("cluster_id"))
            .map_err(|e| Diagnostic::error("Missing cluster_id", e.to_string()))?;
        let backup_id = state
            .get_i64(&AttributePath::new("backup_id"))
            .map_err(|e| Diagnostic::error("Invalid backup_id", e.to_string()))?;

        let policy = client.retry_policy();
        let api = client.cynosdb();
        let api = &api;
        let cluster = cluster_id.as_str();
        let download_url = retry(policy.read, policy.interval, move || async move {
            api.describe_backup_download_url(cluster, backup_id)
                .await
                .map_err(retry_error)
        })
        .await
        .map_err(|e| helper::api_error("Failed to read backup download url", e))?;

        let _ = state.set_string(&AttributePath::new("id"), cluster_id);
        match &download_url {
            Some(url) => {
                let _ = state.set_string(&AttributePath::new("download_url"), url.clone());
            }
            None => {
                let _ = state.set_null(&AttributePath::new("download_url"));
            }
        }

        output::write_result(&state, &serde_json::json!({ "download_url": download_url })).await?;

        Ok(state)
    }
}

#[async_trait]
impl DataSource for CynosdbBackupDownloadUrlDataSource {
    fn type_name(&self) -> &str {
        "tencentcloud_cynosdb_backup_download_url"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Download address of a CynosDB cluster backup")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("cluster_id", AttributeType::String)
                    .description("Cluster ID")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("backup_id", AttributeType::Number)
                    .description("Backup ID")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("download_url", AttributeType::String)
                    .description("Backup download address")
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

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        let mut diagnostics = vec![];
        let path = AttributePath::new("backup_id");
        if let Some(backup_id) = request.config.get(&path).and_then(|v| v.as_number()) {
            if backup_id.fract() != 0.0 {
                diagnostics.push(
                    Diagnostic::error("Invalid backup_id", "backup_id must be an integer")
                        .with_attribute(path),
                );
            }
        }
        ValidateDataSourceConfigResponse { diagnostics }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let _elapsed = LogElapsed::new("data_source.tencentcloud_cynosdb_backup_download_url.read", ctx.log_id());

        let result = self.query(request.config.clone()).await;
        ReadDataSourceResponse::from_result(request.config, result)
    }
}

#[async_trait]
impl DataSourceWithConfigure for CynosdbBackupDownloadUrlDataSource {
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
