//! ClickHouse (cdwch) API implementation

use super::common::EmptyResponse;
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "cdwch";
const VERSION: &str = "2020-09-15";

pub const API_TYPE_GET_USER_PRIVILEGES: &str = "GetUserClusterNewPrivileges";
pub const API_TYPE_REVOKE_CLUSTER_USER: &str = "RevokeClusterUser";

/// ClickHouse API operations
pub struct CdwchApi<'a> {
    client: &'a Client,
}

impl<'a> CdwchApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Replace the privileges of a cluster user
    pub async fn modify_user_new_privilege(&self, permission: &AccountPermission) -> Result<(), ApiError> {
        let _: EmptyResponse = self
            .client
            .call(SERVICE, VERSION, "ModifyUserNewPrivilege", permission)
            .await?;
        Ok(())
    }

    /// Run one of the SQL helper APIs, returning its raw `ReturnData`
    pub async fn describe_ck_sql_apis(&self, request: &DescribeCkSqlApisRequest) -> Result<Option<String>, ApiError> {
        let response: DescribeCkSqlApisResponse = self
            .client
            .call(SERVICE, VERSION, "DescribeCkSqlApis", request)
            .await?;
        Ok(response.return_data)
    }

    /// Current privileges of a cluster user, None when the user has none
    pub async fn describe_account_permission(
        &self,
        instance_id: &str,
        cluster: &str,
        user_name: &str,
    ) -> Result<Option<AccountPermission>, ApiError> {
        let request = DescribeCkSqlApisRequest::new(
            instance_id,
            cluster,
            user_name,
            API_TYPE_GET_USER_PRIVILEGES,
        );

        let data = match self.describe_ck_sql_apis(&request).await? {
            Some(data) => data,
            None => return Ok(None),
        };

        let data = data.trim();
        if data.is_empty() || data == "null" {
            return Ok(None);
        }

        let mut permission: AccountPermission = serde_json::from_str(data)
            .map_err(|e| ApiError::Parse(format!("invalid privilege data: {}", e)))?;

        // Identity is not always echoed back
        if permission.instance_id.is_empty() {
            permission.instance_id = instance_id.to_string();
        }
        if permission.cluster.is_empty() {
            permission.cluster = cluster.to_string();
        }
        if permission.user_name.is_empty() {
            permission.user_name = user_name.to_string();
        }

        Ok(Some(permission))
    }

    /// Drop every privilege a user holds on a cluster
    pub async fn revoke_cluster_user(
        &self,
        instance_id: &str,
        cluster: &str,
        user_name: &str,
    ) -> Result<(), ApiError> {
        let request = DescribeCkSqlApisRequest::new(
            instance_id,
            cluster,
            user_name,
            API_TYPE_REVOKE_CLUSTER_USER,
        );
        self.describe_ck_sql_apis(&request).await?;
        Ok(())
    }
}

/// Privileges of one user on one cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountPermission {
    #[serde(default)]
    pub instance_id: String,
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub all_database: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_privileges: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub database_privilege_list: Vec<DatabasePrivilegeInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatabasePrivilegeInfo {
    pub database_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub database_privileges: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub table_privilege_list: Vec<TablePrivilegeInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TablePrivilegeInfo {
    pub table_name: String,
    #[serde(default)]
    pub table_privileges: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeCkSqlApisRequest {
    pub instance_id: String,
    pub api_type: String,
    pub cluster: String,
    pub user_name: String,
}

impl DescribeCkSqlApisRequest {
    pub fn new(instance_id: &str, cluster: &str, user_name: &str, api_type: &str) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            api_type: api_type.to_string(),
            cluster: cluster.to_string(),
            user_name: user_name.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeCkSqlApisResponse {
    #[serde(default)]
    return_data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use mockito::{Matcher, Server};

    #[test]
    fn empty_lists_are_left_out_of_requests() {
        let permission = AccountPermission {
            instance_id: "cdwch-1".to_string(),
            cluster: "default_cluster".to_string(),
            user_name: "alice".to_string(),
            all_database: true,
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&permission).unwrap(),
            serde_json::json!({
                "InstanceId": "cdwch-1",
                "Cluster": "default_cluster",
                "UserName": "alice",
                "AllDatabase": true
            })
        );
    }

    #[tokio::test]
    async fn describe_account_permission_parses_return_data() {
        let mut server = Server::new_async().await;
        let return_data = serde_json::json!({
            "AllDatabase": false,
            "GlobalPrivileges": ["SELECT"],
            "DatabasePrivilegeList": [{
                "DatabaseName": "db1",
                "DatabasePrivileges": ["INSERT"],
                "TablePrivilegeList": [{"TableName": "t1", "TablePrivileges": ["ALTER"]}]
            }]
        })
        .to_string();
        let body = serde_json::json!({"Response": {"ReturnData": return_data, "RequestId": "r"}});

        let mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeCkSqlApis")
            .match_body(Matcher::PartialJson(
                serde_json::json!({"ApiType": "GetUserClusterNewPrivileges", "UserName": "alice"}),
            ))
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let permission = client
            .cdwch()
            .describe_account_permission("cdwch-1", "default_cluster", "alice")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(permission.instance_id, "cdwch-1");
        assert_eq!(permission.user_name, "alice");
        assert_eq!(permission.global_privileges, vec!["SELECT"]);
        assert_eq!(
            permission.database_privilege_list[0].table_privilege_list[0].table_name,
            "t1"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_return_data_means_no_permission() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body(r#"{"Response":{"ReturnData":"","RequestId":"r"}}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let permission = client
            .cdwch()
            .describe_account_permission("cdwch-1", "default_cluster", "alice")
            .await
            .unwrap();
        assert!(permission.is_none());
    }
}
