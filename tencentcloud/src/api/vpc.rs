//! VPC API implementation

use super::common::EmptyResponse;
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "vpc";
const VERSION: &str = "2017-03-12";

/// VPC API operations
pub struct VpcApi<'a> {
    client: &'a Client,
}

impl<'a> VpcApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn describe_flow_logs(&self, flow_log_id: &str) -> Result<Vec<FlowLog>, ApiError> {
        let response: DescribeFlowLogsResponse = self
            .client
            .call(
                SERVICE,
                VERSION,
                "DescribeFlowLogs",
                &DescribeFlowLogsRequest {
                    flow_log_id: flow_log_id.to_string(),
                },
            )
            .await?;
        Ok(response.flow_log)
    }

    pub async fn enable_flow_logs(&self, flow_log_ids: &[String]) -> Result<(), ApiError> {
        let _: EmptyResponse = self
            .client
            .call(SERVICE, VERSION, "EnableFlowLogs", &FlowLogIdsRequest { flow_log_ids })
            .await?;
        Ok(())
    }

    pub async fn disable_flow_logs(&self, flow_log_ids: &[String]) -> Result<(), ApiError> {
        let _: EmptyResponse = self
            .client
            .call(SERVICE, VERSION, "DisableFlowLogs", &FlowLogIdsRequest { flow_log_ids })
            .await?;
        Ok(())
    }

    /// Publish route items to CCN
    pub async fn notify_routes(&self, route_table_id: &str, route_item_ids: &[String]) -> Result<(), ApiError> {
        let _: EmptyResponse = self
            .client
            .call(
                SERVICE,
                VERSION,
                "NotifyRoutes",
                &RouteItemsRequest {
                    route_table_id,
                    route_item_ids,
                },
            )
            .await?;
        Ok(())
    }

    /// Withdraw route items from CCN
    pub async fn withdraw_notify_routes(
        &self,
        route_table_id: &str,
        route_item_ids: &[String],
    ) -> Result<(), ApiError> {
        let _: EmptyResponse = self
            .client
            .call(
                SERVICE,
                VERSION,
                "WithdrawNotifyRoutes",
                &RouteItemsRequest {
                    route_table_id,
                    route_item_ids,
                },
            )
            .await?;
        Ok(())
    }

    /// One route table, None when it does not exist
    pub async fn describe_route_table(&self, route_table_id: &str) -> Result<Option<RouteTable>, ApiError> {
        let request = DescribeRouteTablesRequest {
            route_table_ids: vec![route_table_id.to_string()],
        };

        let response: DescribeRouteTablesResponse = match self
            .client
            .call(SERVICE, VERSION, "DescribeRouteTables", &request)
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(response
            .route_table_set
            .into_iter()
            .find(|table| table.route_table_id == route_table_id))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeFlowLogsRequest {
    flow_log_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeFlowLogsResponse {
    #[serde(default)]
    flow_log: Vec<FlowLog>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlowLog {
    pub flow_log_id: String,
    #[serde(default)]
    pub flow_log_name: String,
    #[serde(default)]
    pub enable: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct FlowLogIdsRequest<'r> {
    flow_log_ids: &'r [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct RouteItemsRequest<'r> {
    route_table_id: &'r str,
    route_item_ids: &'r [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeRouteTablesRequest {
    route_table_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeRouteTablesResponse {
    #[serde(default)]
    route_table_set: Vec<RouteTable>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RouteTable {
    pub route_table_id: String,
    #[serde(default)]
    pub route_set: Vec<Route>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Route {
    #[serde(default)]
    pub route_item_id: String,
    #[serde(rename = "PublishedToVbc", default)]
    pub published_to_vbc: bool,
}

impl RouteTable {
    /// Route items among `ids` that are currently published
    pub fn published_items(&self, ids: &[String]) -> Vec<String> {
        self.route_set
            .iter()
            .filter(|route| route.published_to_vbc && ids.contains(&route.route_item_id))
            .map(|route| route.route_item_id.clone())
            .collect()
    }
}
