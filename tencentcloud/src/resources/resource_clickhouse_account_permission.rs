//! ClickHouse cluster account permission resource

use crate::api::cdwch::{AccountPermission, DatabasePrivilegeInfo, TablePrivilegeInfo};
use crate::api::{retry, retry_error, Client};
use crate::helper::{self, LogElapsed};
use crate::id::AccountPermissionId;
use crate::TencentCloudProviderData;
use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::import_state_passthrough_id;
use tfplug::plan_modifier::ImmutableAfterCreate;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedBlock, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

const IMMUTABLE_ARGS: [&str; 3] = ["instance_id", "cluster", "user_name"];

#[derive(Default)]
pub struct ClickhouseAccountPermissionResource {
    provider_data: Option<TencentCloudProviderData>,
}

impl ClickhouseAccountPermissionResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn required_string(state: &DynamicValue, name: &str) -> Result<String, Diagnostic> {
        state
            .get_string(&AttributePath::new(name))
            .map_err(|e| {
                Diagnostic::error(format!("Missing {}", name), e.to_string())
                    .with_attribute(AttributePath::new(name))
            })
    }

    /// Builds the ModifyUserNewPrivilege payload from a plan
    fn permission_from_plan(plan: &DynamicValue) -> Result<AccountPermission, Diagnostic> {
        let database_privilege_list = plan
            .get_list(&AttributePath::new("database_privilege_list"))
            .unwrap_or_default()
            .iter()
            .filter_map(Dynamic::as_map)
            .map(|database| DatabasePrivilegeInfo {
                database_name: helper::nested_string(database.get("database_name")),
                database_privileges: helper::nested_strings(database.get("database_privileges")),
                table_privilege_list: database
                    .get("table_privilege_list")
                    .and_then(Dynamic::as_list)
                    .unwrap_or_default()
                    .iter()
                    .filter_map(Dynamic::as_map)
                    .map(|table| TablePrivilegeInfo {
                        table_name: helper::nested_string(table.get("table_name")),
                        table_privileges: helper::nested_strings(table.get("table_privileges")),
                    })
                    .collect(),
            })
            .collect();

        Ok(AccountPermission {
            instance_id: Self::required_string(plan, "instance_id")?,
            cluster: Self::required_string(plan, "cluster")?,
            user_name: Self::required_string(plan, "user_name")?,
            all_database: plan
                .get_bool(&AttributePath::new("all_database"))
                .unwrap_or_default(),
            global_privileges: helper::string_set(plan, "global_privileges"),
            database_privilege_list,
        })
    }

    fn database_block(
        current: Option<&HashMap<String, Dynamic>>,
        database: &DatabasePrivilegeInfo,
    ) -> Dynamic {
        let tables = database
            .table_privilege_list
            .iter()
            .map(|table| {
                Dynamic::Map(HashMap::from([
                    ("table_name".to_string(), Dynamic::String(table.table_name.clone())),
                    (
                        "table_privileges".to_string(),
                        helper::to_string_set(table.table_privileges.iter().cloned()),
                    ),
                ]))
            })
            .collect();

        Dynamic::Map(HashMap::from([
            (
                "database_name".to_string(),
                Dynamic::String(database.database_name.clone()),
            ),
            (
                "database_privileges".to_string(),
                helper::optional_string_set(
                    current.and_then(|c| c.get("database_privileges")),
                    &database.database_privileges,
                ),
            ),
            ("table_privilege_list".to_string(), Dynamic::List(tables)),
        ]))
    }

    /// Writes remote privileges into `state`
    fn write_state(state: &mut DynamicValue, id: &AccountPermissionId, permission: &AccountPermission) {
        let global_privileges = helper::optional_string_set(
            state.get(&AttributePath::new("global_privileges")),
            &permission.global_privileges,
        );

        let current_databases = state
            .get_list(&AttributePath::new("database_privilege_list"))
            .unwrap_or_default();
        let databases = permission
            .database_privilege_list
            .iter()
            .map(|database| {
                let current = current_databases.iter().filter_map(Dynamic::as_map).find(|c| {
                    c.get("database_name").and_then(Dynamic::as_str)
                        == Some(database.database_name.as_str())
                });
                Self::database_block(current, database)
            })
            .collect();

        let _ = state.set_string(&AttributePath::new("id"), id.to_string());
        let _ = state.set_string(&AttributePath::new("instance_id"), permission.instance_id.clone());
        let _ = state.set_string(&AttributePath::new("cluster"), permission.cluster.clone());
        let _ = state.set_string(&AttributePath::new("user_name"), permission.user_name.clone());
        let _ = state.set_bool(&AttributePath::new("all_database"), permission.all_database);
        let _ = state.set_value(&AttributePath::new("global_privileges"), global_privileges);
        let _ = state.set_list(&AttributePath::new("database_privilege_list"), databases);
    }

    async fn modify(&self, client: &Client, permission: &AccountPermission) -> Result<(), Diagnostic> {
        let policy = client.retry_policy();
        let api = client.cdwch();
        let api = &api;
        retry(policy.write, policy.interval, move || async move {
            api.modify_user_new_privilege(permission)
                .await
                .map_err(retry_error)
        })
        .await
        .map_err(|e| helper::api_error("Failed to modify account permission", e))
    }

    fn parse_id(state: &DynamicValue) -> Result<AccountPermissionId, Diagnostic> {
        let raw = helper::state_id(state)?;
        AccountPermissionId::parse(&raw).map_err(helper::id_error)
    }

    async fn read_remote(
        &self,
        client: &Client,
        id: &AccountPermissionId,
        mut state: DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let policy = client.retry_policy();
        let api = client.cdwch();
        let api = &api;
        let permission = retry(policy.read, policy.interval, move || async move {
            api.describe_account_permission(&id.instance_id, &id.cluster, &id.user_name)
                .await
                .map_err(retry_error)
        })
        .await
        .map_err(|e| helper::api_error("Failed to read account permission", e))?;

        Ok(permission.map(|permission| {
            Self::write_state(&mut state, id, &permission);
            state
        }))
    }

    async fn refresh(&self, current: &DynamicValue) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;
        let id = Self::parse_id(current)?;
        self.read_remote(&data.client, &id, current.clone()).await
    }

    async fn modify_and_read(&self, planned: DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;
        let permission = Self::permission_from_plan(&planned)?;
        let id = AccountPermissionId {
            instance_id: permission.instance_id.clone(),
            cluster: permission.cluster.clone(),
            user_name: permission.user_name.clone(),
        };
        id.encode().map_err(helper::id_error)?;

        self.modify(&data.client, &permission).await?;

        self.read_remote(&data.client, &id, planned)
            .await?
            .ok_or_else(|| {
                Diagnostic::error(
                    "Account permission not found",
                    format!("privileges of {} were not found after being granted", id),
                )
            })
    }

    async fn revoke(&self, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(helper::not_configured)?;
        let id = Self::parse_id(prior)?;

        let policy = data.client.retry_policy();
        let api = data.client.cdwch();
        let api = &api;
        let id = &id;
        retry(policy.write, policy.interval, move || async move {
            api.revoke_cluster_user(&id.instance_id, &id.cluster, &id.user_name)
                .await
                .map_err(retry_error)
        })
        .await
        .map_err(|e| helper::api_error("Failed to revoke account permission", e))
    }
}

#[async_trait]
impl Resource for ClickhouseAccountPermissionResource {
    fn type_name(&self) -> &str {
        "tencentcloud_clickhouse_account_permission"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let table_block = SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("table_name", AttributeType::String)
                    .description("Table name")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("table_privileges", AttributeType::set_of(AttributeType::String))
                    .description("Table privileges. Valid values: SELECT, INSERT_ALL, ALTER, TRUNCATE, DROP_TABLE")
                    .required()
                    .build(),
            )
            .build_block();

        let database_block = SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("database_name", AttributeType::String)
                    .description("Database name")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("database_privileges", AttributeType::set_of(AttributeType::String))
                    .description("Database privileges. Valid values: SELECT, INSERT_ALL, ALTER, TRUNCATE, DROP_TABLE, CREATE_TABLE, DROP_DATABASE")
                    .optional()
                    .build(),
            )
            .block(NestedBlock::list("table_privilege_list", table_block))
            .build_block();

        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Grants privileges to a ClickHouse cluster user")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("`instance_id#cluster#user_name`")
                    .computed()
                    .build(),
            );

        for (name, description) in [
            ("instance_id", "Instance ID"),
            ("cluster", "Cluster name"),
            ("user_name", "User name"),
        ] {
            builder = builder.attribute(
                AttributeBuilder::new(name, AttributeType::String)
                    .description(description)
                    .required()
                    .plan_modifier(Box::new(ImmutableAfterCreate))
                    .build(),
            );
        }

        let schema = builder
            .attribute(
                AttributeBuilder::new("all_database", AttributeType::Bool)
                    .description("Whether the privileges apply to all databases")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("global_privileges", AttributeType::set_of(AttributeType::String))
                    .description("Global privileges")
                    .optional()
                    .build(),
            )
            .block(NestedBlock::list("database_privilege_list", database_block))
            .build();

        schema.into()
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];

        let all_database = request
            .config
            .get_bool(&AttributePath::new("all_database"))
            .unwrap_or(false);
        let has_databases = request
            .config
            .get_list(&AttributePath::new("database_privilege_list"))
            .map(|list| !list.is_empty())
            .unwrap_or(false);

        if all_database && has_databases {
            diagnostics.push(
                Diagnostic::warning(
                    "database_privilege_list is ignored",
                    "all_database is true, so privileges apply to every database",
                )
                .with_attribute(AttributePath::new("database_privilege_list")),
            );
        }

        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let _elapsed = LogElapsed::new("resource.tencentcloud_clickhouse_account_permission.create", ctx.log_id());

        let result = self.modify_and_read(request.planned_state).await;
        CreateResourceResponse::from_result(result)
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let _elapsed = LogElapsed::new("resource.tencentcloud_clickhouse_account_permission.read", ctx.log_id());

        let result = self.refresh(&request.current_state).await;
        if matches!(result, Ok(None)) {
            tracing::warn!(
                "[{}] clickhouse account permission not found, please check if it has been deleted",
                ctx.log_id()
            );
        }
        ReadResourceResponse::from_result(request.current_state, request.private, result)
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let _elapsed = LogElapsed::new("resource.tencentcloud_clickhouse_account_permission.update", ctx.log_id());

        let result = match helper::check_immutable(
            &request.prior_state,
            &request.planned_state,
            &IMMUTABLE_ARGS,
        ) {
            Ok(()) => self.modify_and_read(request.planned_state).await,
            Err(diag) => Err(diag),
        };
        UpdateResourceResponse::from_result(request.prior_state, result)
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let _elapsed = LogElapsed::new("resource.tencentcloud_clickhouse_account_permission.delete", ctx.log_id());

        self.revoke(&request.prior_state).await.into()
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
impl ResourceWithConfigure for ClickhouseAccountPermissionResource {
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
