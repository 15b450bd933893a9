use thiserror::Error;

/// Error codes the API uses for conditions that clear up on their own
const RETRYABLE_CODE_PREFIXES: &[&str] = &[
    "InternalError",
    "RequestLimitExceeded",
    "ResourceInUse",
    "ResourceUnavailable",
    "ResourceBusy",
    "FailedOperation.OperationConflict",
    "FailedOperation.InstanceBusy",
    "FailedOperation.TaskConflict",
    "UnsupportedOperation.InstanceStatusNotAllowed",
    "ClientNetworkError",
    "ServerNetworkError",
];

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("[TencentCloudSDKError] Code={code}, Message={message}, RequestId={request_id}")]
    Api {
        code: String,
        message: String,
        request_id: String,
    },

    #[error("API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to sign request: {0}")]
    Signing(String),

    /// A describe call answered without the object being asked for
    #[error("{0} not found")]
    NotFound(String),

    /// Raised by polling loops when the remote operation fails or stalls
    #[error("{0}")]
    Operation(String),

    #[error("timeout while waiting for state to become '{target}' (last state: '{last}')")]
    WaitTimeout { target: String, last: String },
}

impl ApiError {
    /// Transient errors that are worth retrying within the budget
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Request(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ApiError::Api { code, .. } => RETRYABLE_CODE_PREFIXES
                .iter()
                .any(|prefix| code.starts_with(prefix)),
            ApiError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// API error code, if the API answered with one
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// True when the API reports the addressed object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
            || self.code().is_some_and(|code| {
                code.starts_with("ResourceNotFound")
                    || code.starts_with("InvalidParameter.NotFound")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(code: &str) -> ApiError {
        ApiError::Api {
            code: code.to_string(),
            message: "m".to_string(),
            request_id: "r".to_string(),
        }
    }

    #[test]
    fn transient_codes_are_retryable() {
        assert!(api("InternalError").is_retryable());
        assert!(api("InternalError.DBError").is_retryable());
        assert!(api("RequestLimitExceeded").is_retryable());
        assert!(api("ResourceInUse.Instance").is_retryable());
        assert!(api("FailedOperation.InstanceBusy").is_retryable());
    }

    #[test]
    fn permanent_codes_are_not_retryable() {
        assert!(!api("InvalidParameter").is_retryable());
        assert!(!api("AuthFailure.SignatureFailure").is_retryable());
        assert!(!api("ResourceNotFound.JobNotExist").is_retryable());
        assert!(!ApiError::Operation("flow failed".to_string()).is_retryable());
    }

    #[test]
    fn server_errors_and_throttling_are_retryable() {
        let status = |status| ApiError::HttpStatus {
            status,
            body: String::new(),
        };
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(400).is_retryable());
    }

    #[test]
    fn not_found_codes() {
        assert!(api("ResourceNotFound.FlowLogNotExist").is_not_found());
        assert!(ApiError::NotFound("sync job sync-1".to_string()).is_not_found());
        assert!(!api("InternalError").is_not_found());
    }

    #[test]
    fn display_carries_code_and_request_id() {
        let text = api("InvalidParameter").to_string();
        assert!(text.contains("Code=InvalidParameter"));
        assert!(text.contains("RequestId=r"));
    }
}
