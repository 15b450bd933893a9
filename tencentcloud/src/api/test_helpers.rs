//! Test helpers for the Tencent Cloud API

use super::{Client, ClientConfig, Credential, RetryPolicy};
use std::time::Duration;

/// Retry budgets short enough for unit tests
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        read: Duration::from_millis(200),
        write: Duration::from_millis(200),
        interval: Duration::from_millis(5),
    }
}

pub fn create_test_client(url: &str) -> Client {
    let credential = Credential {
        secret_id: "AKIDtest".to_string(),
        secret_key: "secret".to_string(),
        token: None,
    };
    Client::new(
        ClientConfig::new(credential, "ap-guangzhou")
            .with_endpoint(url)
            .with_retry(fast_retry()),
    )
    .unwrap()
}
