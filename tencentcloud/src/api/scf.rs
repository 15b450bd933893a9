//! Serverless Cloud Function API implementation

use super::common::Filter;
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "scf";
const VERSION: &str = "2018-04-16";

/// Page size used when listing triggers
pub const TRIGGER_PAGE_LIMIT: i64 = 100;

/// Serverless Cloud Function API operations
pub struct ScfApi<'a> {
    client: &'a Client,
}

impl<'a> ScfApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn get_request_status(&self, request: &GetRequestStatusRequest) -> Result<Vec<RequestStatus>, ApiError> {
        let response: GetRequestStatusResponse = self
            .client
            .call(SERVICE, VERSION, "GetRequestStatus", request)
            .await?;
        Ok(response.data)
    }

    /// Every trigger of a function, following pages until all are read
    pub async fn list_triggers(&self, query: &ListTriggersQuery) -> Result<Vec<TriggerInfo>, ApiError> {
        let mut triggers = Vec::new();
        let mut offset = 0;

        loop {
            let request = ListTriggersRequest {
                query,
                offset,
                limit: TRIGGER_PAGE_LIMIT,
            };
            let response: ListTriggersResponse = self
                .client
                .call(SERVICE, VERSION, "ListTriggers", &request)
                .await?;

            let page_len = response.triggers.len() as i64;
            triggers.extend(response.triggers);
            tracing::debug!(
                "ListTriggers page at offset {} returned {} of {}",
                offset,
                page_len,
                response.total_count
            );

            if page_len < TRIGGER_PAGE_LIMIT || triggers.len() as i64 >= response.total_count {
                break;
            }
            offset += page_len;
        }

        Ok(triggers)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetRequestStatusRequest {
    pub function_name: String,
    pub function_request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetRequestStatusResponse {
    #[serde(default)]
    data: Vec<RequestStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestStatus {
    pub function_name: String,
    #[serde(default)]
    pub ret_msg: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub ret_code: Option<i64>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub mem_usage: Option<f64>,
    #[serde(default)]
    pub retry_num: Option<i64>,
}

/// Filter and ordering options for ListTriggers
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListTriggersQuery {
    pub function_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// `add_time` or `mod_time`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    /// `ASC` or `DESC`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ListTriggersRequest<'q> {
    #[serde(flatten)]
    query: &'q ListTriggersQuery,
    offset: i64,
    limit: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListTriggersResponse {
    #[serde(default)]
    total_count: i64,
    #[serde(default)]
    triggers: Vec<TriggerInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TriggerInfo {
    pub enable: i64,
    pub qualifier: String,
    pub trigger_name: String,
    #[serde(rename = "Type")]
    pub trigger_type: String,
    pub trigger_desc: String,
    pub available_status: String,
    pub custom_argument: String,
    pub add_time: String,
    pub mod_time: String,
    pub resource_id: String,
    pub bind_status: String,
    pub trigger_attribute: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use mockito::{Matcher, Server};

    fn trigger_page(start: usize, count: usize) -> Vec<serde_json::Value> {
        (start..start + count)
            .map(|i| serde_json::json!({"TriggerName": format!("t{}", i), "Type": "timer", "Enable": 1}))
            .collect()
    }

    #[tokio::test]
    async fn list_triggers_follows_pages() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("POST", "/")
            .match_header("x-tc-action", "ListTriggers")
            .match_body(Matcher::PartialJson(
                serde_json::json!({"FunctionName": "fn", "Offset": 0, "Limit": 100}),
            ))
            .with_body(
                serde_json::json!({"Response": {"TotalCount": 130, "Triggers": trigger_page(0, 100), "RequestId": "r1"}})
                    .to_string(),
            )
            .create_async()
            .await;
        let second = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(serde_json::json!({"Offset": 100})))
            .with_body(
                serde_json::json!({"Response": {"TotalCount": 130, "Triggers": trigger_page(100, 30), "RequestId": "r2"}})
                    .to_string(),
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let triggers = client
            .scf()
            .list_triggers(&ListTriggersQuery {
                function_name: "fn".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(triggers.len(), 130);
        assert_eq!(triggers[129].trigger_name, "t129");
        assert_eq!(triggers[0].trigger_type, "timer");
        first.assert_async().await;
        second.assert_async().await;
    }

    #[test]
    fn query_flattens_into_request() {
        let query = ListTriggersQuery {
            function_name: "fn".to_string(),
            namespace: Some("default".to_string()),
            order_by: Some("add_time".to_string()),
            order: Some("DESC".to_string()),
            filters: vec![],
        };
        let request = ListTriggersRequest {
            query: &query,
            offset: 0,
            limit: TRIGGER_PAGE_LIMIT,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "FunctionName": "fn",
                "Namespace": "default",
                "OrderBy": "add_time",
                "Order": "DESC",
                "Offset": 0,
                "Limit": 100
            })
        );
    }

    #[tokio::test]
    async fn get_request_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "GetRequestStatus")
            .with_body(
                r#"{"Response":{"TotalCount":1,"Data":[{"FunctionName":"fn","RetMsg":"ok","RequestId":"req-a","StartTime":"2023-01-01 00:00:00","RetCode":0,"Duration":1.5,"MemUsage":8.0,"RetryNum":0}],"RequestId":"r"}}"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let statuses = client
            .scf()
            .get_request_status(&GetRequestStatusRequest {
                function_name: "fn".to_string(),
                function_request_id: "req-a".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].ret_code, Some(0));
        assert_eq!(statuses[0].duration, Some(1.5));
    }
}
