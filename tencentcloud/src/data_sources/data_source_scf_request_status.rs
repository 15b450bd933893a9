//! SCF invocation status data source

use crate::api::scf::{GetRequestStatusRequest, RequestStatus};
use crate::api::{retry, retry_error};
use crate::helper::{self, LogElapsed};
use crate::id::ids_hash;
use crate::output::{self, RESULT_OUTPUT_FILE};
use crate::TencentCloudProviderData;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use regex::Regex;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse, ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::StringPattern;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIME_PATTERN: &str = r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$";

#[derive(Default)]
pub struct ScfRequestStatusDataSource {
    provider_data: Option<TencentCloudProviderData>,
}

fn time_attribute(name: &str, description: &str) -> Attribute {
    let mut builder = AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional();
    if let Ok(pattern) = Regex::new(TIME_PATTERN) {
        builder = builder.validator(Box::new(StringPattern::new(pattern, "YYYY-MM-DD HH:MM:SS")));
    }
    builder.build()
}

fn parse_time(config: &DynamicValue, name: &str) -> Option<NaiveDateTime> {
    let value = config.get_string(&AttributePath::new(name)).ok()?;
    NaiveDateTime::parse_from_str(&value, TIME_FORMAT).ok()
}

fn optional_string(value: &Option<String>) -> Dynamic {
    value.clone().map(Dynamic::String).unwrap_or(Dynamic::Null)
}

fn optional_number<T: Into<f64> + Copy>(value: Option<T>) -> Dynamic {
    value
        .map(|n| Dynamic::Number(n.into()))
        .unwrap_or(Dynamic::Null)
}

fn status_element(status: &RequestStatus) -> Dynamic {
    Dynamic::Map(HashMap::from([
        (
            "function_name".to_string(),
            Dynamic::String(status.function_name.clone()),
        ),
        ("ret_msg".to_string(), optional_string(&status.ret_msg)),
        ("request_id".to_string(), optional_string(&status.request_id)),
        ("start_time".to_string(), optional_string(&status.start_time)),
        (
            "ret_code".to_string(),
            optional_number(status.ret_code.map(|n| n as f64)),
        ),
        ("duration".to_string(), optional_number(status.duration)),
        ("mem_usage".to_string(), optional_number(status.mem_usage)),
        (
            "retry_num".to_string(),
            optional_number(status.retry_num.map(|n| n as f64)),
        ),
    ]))
}

fn status_json(status: &RequestStatus) -> serde_json::Value {
    serde_json::json!({
        "function_name": status.function_name,
        "ret_msg": status.ret_msg,
        "request_id": status.request_id,
        "start_time": status.start_time,
        "ret_code": status.ret_code,
        "duration": status.duration,
        "mem_usage": status.mem_usage,
        "retry_num": status.retry_num,
    })
}

impl ScfRequestStatusDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn query(&self, mut state: DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;
        let client = &data.client;

        let request = GetRequestStatusRequest {
            function_name: state
                .get_string(&AttributePath::new("function_name"))
                .map_err(|e| Diagnostic::error("Missing function_name", e.to_string()))?,
            function_request_id: state
                .get_string(&AttributePath::new("function_request_id"))
                .map_err(|e| Diagnostic::error("Missing function_request_id", e.to_string()))?,
            namespace: helper::optional_string(&state, "namespace"),
            start_time: helper::optional_string(&state, "start_time"),
            end_time: helper::optional_string(&state, "end_time"),
        };

        let policy = client.retry_policy();
        let api = client.scf();
        let api = &api;
        let request = &request;
        let statuses = retry(policy.read, policy.interval, move || async move {
            api.get_request_status(request).await.map_err(retry_error)
        })
        .await
        .map_err(|e| helper::api_error("Failed to read request status", e))?;

        let names: Vec<&str> = statuses.iter().map(|s| s.function_name.as_str()).collect();
        let _ = state.set_string(&AttributePath::new("id"), ids_hash(&names));
        let _ = state.set_list(
            &AttributePath::new("data"),
            statuses.iter().map(status_element).collect(),
        );

        let results: Vec<serde_json::Value> = statuses.iter().map(status_json).collect();
        output::write_result(&state, &results).await?;

        Ok(state)
    }
}

#[async_trait]
impl DataSource for ScfRequestStatusDataSource {
    fn type_name(&self) -> &str {
        "tencentcloud_scf_request_status"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let element = AttributeType::object([
            ("function_name", AttributeType::String),
            ("ret_msg", AttributeType::String),
            ("request_id", AttributeType::String),
            ("start_time", AttributeType::String),
            ("ret_code", AttributeType::Number),
            ("duration", AttributeType::Number),
            ("mem_usage", AttributeType::Number),
            ("retry_num", AttributeType::Number),
        ]);

        let schema = SchemaBuilder::new()
            .version(0)
            .description("Status of a single function invocation")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("function_name", AttributeType::String)
                    .description("Function name")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("function_request_id", AttributeType::String)
                    .description("ID of the request to look up")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("namespace", AttributeType::String)
                    .description("Function namespace")
                    .optional()
                    .build(),
            )
            .attribute(time_attribute(
                "start_time",
                "Start of the query window, `YYYY-MM-DD HH:MM:SS`. Defaults to 15 minutes ago",
            ))
            .attribute(time_attribute(
                "end_time",
                "End of the query window, `YYYY-MM-DD HH:MM:SS`. Required with `start_time`",
            ))
            .attribute(
                AttributeBuilder::new("data", AttributeType::list_of(element))
                    .description("Invocation details")
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
        let config = &request.config;
        let end_path = AttributePath::new("end_time");

        let has_start = config.get(&AttributePath::new("start_time")).is_some_and(|v| !v.is_null());
        let has_end = config.get(&end_path).is_some_and(|v| !v.is_null());
        if has_start && !has_end {
            diagnostics.push(
                Diagnostic::error("Missing end_time", "end_time is required when start_time is set")
                    .with_attribute(end_path.clone()),
            );
        }

        // Malformed values are reported by the attribute validators
        if let (Some(start), Some(end)) = (parse_time(config, "start_time"), parse_time(config, "end_time")) {
            if end <= start {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid end_time",
                        format!("end_time {} must be later than start_time {}", end, start),
                    )
                    .with_attribute(end_path),
                );
            }
        }

        ValidateDataSourceConfigResponse { diagnostics }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let _elapsed = LogElapsed::new("data_source.tencentcloud_scf_request_status.read", ctx.log_id());

        let result = self.query(request.config.clone()).await;
        ReadDataSourceResponse::from_result(request.config, result)
    }
}

#[async_trait]
impl DataSourceWithConfigure for ScfRequestStatusDataSource {
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
