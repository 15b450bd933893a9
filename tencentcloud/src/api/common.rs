//! Common types for the Tencent Cloud API envelope

use serde::{Deserialize, Serialize};

/// Every response is wrapped as `{"Response": {...}}`
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    #[serde(rename = "Response")]
    pub response: serde_json::Value,
}

/// The fields every response body carries
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseMeta {
    #[serde(default)]
    pub request_id: String,
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiErrorBody {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Response body for actions that only return a request id
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmptyResponse {
    #[serde(default)]
    pub request_id: String,
}

/// Name/values filter used by list APIs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
}
