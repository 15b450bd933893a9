//! SCF function triggers data source

use crate::api::common::Filter;
use crate::api::scf::{ListTriggersQuery, TriggerInfo};
use crate::api::{retry, retry_error};
use crate::helper::{self, LogElapsed};
use crate::id::ids_hash;
use crate::output::{self, RESULT_OUTPUT_FILE};
use crate::TencentCloudProviderData;
use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedBlock, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::StringOneOf;

#[derive(Default)]
pub struct ScfTriggersDataSource {
    provider_data: Option<TencentCloudProviderData>,
}

/// Reads the `filters` blocks from config. Entries without a name are skipped.
fn filters_from_config(config: &DynamicValue) -> Vec<Filter> {
    let Ok(blocks) = config.get_list(&AttributePath::new("filters")) else {
        return vec![];
    };

    blocks
        .iter()
        .filter_map(|block| {
            let fields = block.as_map()?;
            let name = helper::nested_string(fields.get("name"));
            if name.is_empty() {
                return None;
            }
            Some(Filter {
                name,
                values: helper::nested_strings(fields.get("values")),
            })
        })
        .collect()
}

fn trigger_element(trigger: &TriggerInfo) -> Dynamic {
    let text = |value: &str| Dynamic::String(value.to_string());

    Dynamic::Map(HashMap::from([
        ("type".to_string(), text(&trigger.trigger_type)),
        ("trigger_name".to_string(), text(&trigger.trigger_name)),
        ("trigger_desc".to_string(), text(&trigger.trigger_desc)),
        ("enable".to_string(), Dynamic::Number(trigger.enable as f64)),
        ("add_time".to_string(), text(&trigger.add_time)),
        ("mod_time".to_string(), text(&trigger.mod_time)),
        ("custom_argument".to_string(), text(&trigger.custom_argument)),
        ("available_status".to_string(), text(&trigger.available_status)),
        ("resource_id".to_string(), text(&trigger.resource_id)),
        ("bind_status".to_string(), text(&trigger.bind_status)),
        ("trigger_attribute".to_string(), text(&trigger.trigger_attribute)),
        ("qualifier".to_string(), text(&trigger.qualifier)),
        ("description".to_string(), text(&trigger.description)),
    ]))
}

fn trigger_json(trigger: &TriggerInfo) -> serde_json::Value {
    serde_json::json!({
        "type": trigger.trigger_type,
        "trigger_name": trigger.trigger_name,
        "trigger_desc": trigger.trigger_desc,
        "enable": trigger.enable,
        "add_time": trigger.add_time,
        "mod_time": trigger.mod_time,
        "custom_argument": trigger.custom_argument,
        "available_status": trigger.available_status,
        "resource_id": trigger.resource_id,
        "bind_status": trigger.bind_status,
        "trigger_attribute": trigger.trigger_attribute,
        "qualifier": trigger.qualifier,
        "description": trigger.description,
    })
}

impl ScfTriggersDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn query(&self, mut state: DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;
        let client = &data.client;

        let query = ListTriggersQuery {
            function_name: state
                .get_string(&AttributePath::new("function_name"))
                .map_err(|e| Diagnostic::error("Missing function_name", e.to_string()))?,
            namespace: helper::optional_string(&state, "namespace"),
            order_by: helper::optional_string(&state, "order_by"),
            order: helper::optional_string(&state, "order"),
            filters: filters_from_config(&state),
        };

        let policy = client.retry_policy();
        let api = client.scf();
        let api = &api;
        let query = &query;
        let triggers = retry(policy.read, policy.interval, move || async move {
            api.list_triggers(query).await.map_err(retry_error)
        })
        .await
        .map_err(|e| helper::api_error("Failed to list triggers", e))?;

        tracing::debug!(
            "function {} has {} triggers",
            query.function_name,
            triggers.len()
        );

        let names: Vec<&str> = triggers.iter().map(|t| t.trigger_name.as_str()).collect();
        let _ = state.set_string(&AttributePath::new("id"), ids_hash(&names));
        let _ = state.set_list(
            &AttributePath::new("triggers"),
            triggers.iter().map(trigger_element).collect(),
        );

        let results: Vec<serde_json::Value> = triggers.iter().map(trigger_json).collect();
        output::write_result(&state, &results).await?;

        Ok(state)
    }
}

#[async_trait]
impl DataSource for ScfTriggersDataSource {
    fn type_name(&self) -> &str {
        "tencentcloud_scf_triggers"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let trigger = AttributeType::object([
            ("type", AttributeType::String),
            ("trigger_name", AttributeType::String),
            ("trigger_desc", AttributeType::String),
            ("enable", AttributeType::Number),
            ("add_time", AttributeType::String),
            ("mod_time", AttributeType::String),
            ("custom_argument", AttributeType::String),
            ("available_status", AttributeType::String),
            ("resource_id", AttributeType::String),
            ("bind_status", AttributeType::String),
            ("trigger_attribute", AttributeType::String),
            ("qualifier", AttributeType::String),
            ("description", AttributeType::String),
        ]);

        let filter = SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Field to filter on")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("values", AttributeType::set_of(AttributeType::String))
                    .description("Accepted values")
                    .required()
                    .build(),
            )
            .build_block();

        let schema = SchemaBuilder::new()
            .version(0)
            .description("Lists the triggers of a function")
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
                AttributeBuilder::new("namespace", AttributeType::String)
                    .description("Function namespace")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("order_by", AttributeType::String)
                    .description("Sort field, `add_time` or `mod_time`")
                    .optional()
                    .validator(Box::new(StringOneOf::new(["add_time", "mod_time"])))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("order", AttributeType::String)
                    .description("Sort direction, `ASC` or `DESC`")
                    .optional()
                    .validator(Box::new(StringOneOf::new(["ASC", "DESC"])))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("triggers", AttributeType::list_of(trigger))
                    .description("Triggers of the function")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(RESULT_OUTPUT_FILE, AttributeType::String)
                    .description("Used to save results")
                    .optional()
                    .build(),
            )
            .block(NestedBlock::list("filters", filter))
            .build();

        schema.into()
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let _elapsed = LogElapsed::new("data_source.tencentcloud_scf_triggers.read", ctx.log_id());

        let result = self.query(request.config.clone()).await;
        ReadDataSourceResponse::from_result(request.config, result)
    }
}

#[async_trait]
impl DataSourceWithConfigure for ScfTriggersDataSource {
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
