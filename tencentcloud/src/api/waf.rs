//! Web Application Firewall API implementation

use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "waf";
const VERSION: &str = "2018-01-25";

/// Web Application Firewall API operations
pub struct WafApi<'a> {
    client: &'a Client,
}

impl<'a> WafApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn describe_ports(&self, request: &DescribePortsRequest) -> Result<DescribePortsResponse, ApiError> {
        self.client
            .call(SERVICE, VERSION, "DescribePorts", request)
            .await
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribePortsRequest {
    /// `sparta-waf` or `clb-waf`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,
    #[serde(rename = "InstanceID", skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribePortsResponse {
    #[serde(default)]
    pub http_ports: Option<Vec<String>>,
    #[serde(default)]
    pub https_ports: Option<Vec<String>>,
    pub request_id: String,
}
