//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use tencentcloud::api::{Client, ClientConfig, Credential, RetryPolicy};
use tencentcloud::TencentCloudProviderData;
use tfplug::data_source::ConfigureDataSourceRequest;
use tfplug::resource::ConfigureResourceRequest;
use tfplug::types::{AttributePath, Dynamic, DynamicValue};

pub fn provider_data(url: &str) -> TencentCloudProviderData {
    let credential = Credential {
        secret_id: "AKIDtest".to_string(),
        secret_key: "secret".to_string(),
        token: None,
    };
    let client = Client::new(
        ClientConfig::new(credential, "ap-guangzhou")
            .with_endpoint(url)
            .with_retry(RetryPolicy {
                read: Duration::from_millis(200),
                write: Duration::from_millis(200),
                interval: Duration::from_millis(5),
            }),
    )
    .unwrap();
    TencentCloudProviderData::new(client)
}

pub fn configure_resource(url: &str) -> ConfigureResourceRequest {
    ConfigureResourceRequest {
        provider_data: Some(Arc::new(provider_data(url))),
    }
}

pub fn configure_data_source(url: &str) -> ConfigureDataSourceRequest {
    ConfigureDataSourceRequest {
        provider_data: Some(Arc::new(provider_data(url))),
    }
}

/// Wraps a response body in the API envelope
pub fn response(body: serde_json::Value) -> String {
    let mut body = body;
    body["RequestId"] = serde_json::json!("req-test");
    serde_json::json!({ "Response": body }).to_string()
}

pub fn error_response(code: &str) -> String {
    serde_json::json!({
        "Response": {
            "Error": { "Code": code, "Message": "mocked" },
            "RequestId": "req-test"
        }
    })
    .to_string()
}

pub fn state(values: &[(&str, Dynamic)]) -> DynamicValue {
    let mut state = DynamicValue::object();
    for (name, value) in values {
        state
            .set_value(&AttributePath::new(*name), value.clone())
            .unwrap();
    }
    state
}

pub fn text(value: &str) -> Dynamic {
    Dynamic::String(value.to_string())
}

pub fn get_string(state: &DynamicValue, name: &str) -> String {
    state.get_string(&AttributePath::new(name)).unwrap()
}
