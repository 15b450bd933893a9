//! SQL Server API implementation

use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "sqlserver";
const VERSION: &str = "2018-03-28";

/// SQL Server API operations
pub struct SqlserverApi<'a> {
    client: &'a Client,
}

impl<'a> SqlserverApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Enable or disable change tracking on databases, returns the flow id
    pub async fn modify_database_ct(&self, request: &ModifyDatabaseCtRequest) -> Result<i64, ApiError> {
        let response: ModifyDatabaseCtResponse = self
            .client
            .call(SERVICE, VERSION, "ModifyDatabaseCT", request)
            .await?;
        Ok(response.flow_id)
    }

    /// Status code of an asynchronous flow
    pub async fn describe_flow_status(&self, flow_id: i64) -> Result<i64, ApiError> {
        let response: DescribeFlowStatusResponse = self
            .client
            .call(
                SERVICE,
                VERSION,
                "DescribeFlowStatus",
                &DescribeFlowStatusRequest { flow_id },
            )
            .await?;
        Ok(response.status)
    }

    /// Databases of an instance with their change tracking settings
    pub async fn describe_dbs_normal(&self, instance_id: &str) -> Result<Vec<DbNormalDetail>, ApiError> {
        let response: DescribeDbsNormalResponse = self
            .client
            .call(
                SERVICE,
                VERSION,
                "DescribeDBsNormal",
                &DescribeDbsNormalRequest {
                    instance_id: instance_id.to_string(),
                },
            )
            .await?;
        Ok(response.db_list)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyDatabaseCtRequest {
    pub instance_id: String,
    #[serde(rename = "DBNames")]
    pub db_names: Vec<String>,
    pub modify_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_retention_day: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ModifyDatabaseCtResponse {
    flow_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeFlowStatusRequest {
    flow_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeFlowStatusResponse {
    status: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeDbsNormalRequest {
    instance_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeDbsNormalResponse {
    #[serde(rename = "DBList", default)]
    db_list: Vec<DbNormalDetail>,
}

/// One database as reported by DescribeDBsNormal
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DbNormalDetail {
    pub name: String,
    /// "0" when change tracking is off
    #[serde(default)]
    pub is_db_chaining_on: String,
    /// Days, as a decimal string
    #[serde(default)]
    pub retention_period: String,
    #[serde(default)]
    pub is_cdc_enabled: String,
}

impl DbNormalDetail {
    pub fn change_tracking_enabled(&self) -> bool {
        self.is_db_chaining_on != "0"
    }

    /// Retention period in days, zero when the API sends nothing usable
    pub fn retention_days(&self) -> i64 {
        self.retention_period.trim().parse().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use mockito::{Matcher, Server};

    #[test]
    fn modify_request_uses_api_field_names() {
        let request = ModifyDatabaseCtRequest {
            instance_id: "mssql-1".to_string(),
            db_names: vec!["db1".to_string()],
            modify_type: "enable".to_string(),
            change_retention_day: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"InstanceId": "mssql-1", "DBNames": ["db1"], "ModifyType": "enable"})
        );
    }

    #[test]
    fn detail_flags() {
        let detail = DbNormalDetail {
            name: "db1".to_string(),
            is_db_chaining_on: "0".to_string(),
            retention_period: "7".to_string(),
            is_cdc_enabled: String::new(),
        };
        assert!(!detail.change_tracking_enabled());
        assert_eq!(detail.retention_days(), 7);
    }

    #[tokio::test]
    async fn describe_dbs_normal_returns_list() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeDBsNormal")
            .match_body(Matcher::Json(serde_json::json!({"InstanceId": "mssql-1"})))
            .with_body(
                r#"{"Response":{"TotalCount":1,"DBList":[{"Name":"db1","IsDbChainingOn":"1","RetentionPeriod":"5"}],"RequestId":"r"}}"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let dbs = client.sqlserver().describe_dbs_normal("mssql-1").await.unwrap();

        assert_eq!(dbs.len(), 1);
        assert!(dbs[0].change_tracking_enabled());
        assert_eq!(dbs[0].retention_days(), 5);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn describe_dbs_normal_tolerates_missing_list() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body(r#"{"Response":{"TotalCount":0,"RequestId":"r"}}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let dbs = client.sqlserver().describe_dbs_normal("mssql-1").await.unwrap();
        assert!(dbs.is_empty());
    }
}
