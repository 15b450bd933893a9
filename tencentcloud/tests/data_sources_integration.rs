//! Data source reads against a mocked API

mod common;

use common::{configure_data_source, get_string, response, state, text};
use mockito::{Matcher, Server};
use std::collections::HashMap;
use std::path::PathBuf;
use tencentcloud::data_sources::{
    CynosdbBackupDownloadUrlDataSource, ScfRequestStatusDataSource, ScfTriggersDataSource,
    WafPortsDataSource,
};
use tencentcloud::id::ids_hash;
use tfplug::context::Context;
use tfplug::data_source::{DataSource, DataSourceWithConfigure, ReadDataSourceRequest};
use tfplug::types::{AttributePath, Dynamic, DynamicValue};

fn read_request(type_name: &str, config: DynamicValue) -> ReadDataSourceRequest {
    ReadDataSourceRequest {
        type_name: type_name.to_string(),
        config,
        provider_meta: None,
        client_capabilities: Default::default(),
    }
}

fn output_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("tencentcloud-it-{}", std::process::id()))
        .join(name)
}

#[tokio::test(flavor = "multi_thread")]
async fn waf_ports_writes_result_file() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DescribePorts")
        .match_body(Matcher::Json(serde_json::json!({"Edition": "clb-waf"})))
        .with_body(response(serde_json::json!({
            "HttpPorts": ["80", "8080", "80"],
            "HttpsPorts": ["443"]
        })))
        .create_async()
        .await;

    let mut data_source = WafPortsDataSource::new();
    data_source
        .configure(Context::new(), configure_data_source(&server.url()))
        .await;

    let path = output_path("waf_ports.json");
    let config = state(&[
        ("edition", text("clb-waf")),
        ("result_output_file", text(&path.to_string_lossy())),
    ]);
    let response = data_source
        .read(Context::new(), read_request(data_source.type_name(), config))
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(get_string(&response.state, "id"), "req-test");
    assert_eq!(
        response
            .state
            .get_string_list(&AttributePath::new("http_ports"))
            .unwrap(),
        vec!["80", "8080"]
    );

    let written: serde_json::Value =
        serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
    assert_eq!(
        written,
        serde_json::json!({"http_ports": ["80", "8080", "80"], "https_ports": ["443"]})
    );
    mock.assert_async().await;

    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn backup_download_url() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DescribeBackupDownloadUrl")
        .match_body(Matcher::Json(
            serde_json::json!({"ClusterId": "cynosdbmysql-1", "BackupId": 42}),
        ))
        .with_body(response(serde_json::json!({"DownloadUrl": "https://backup/1.xb"})))
        .create_async()
        .await;

    let mut data_source = CynosdbBackupDownloadUrlDataSource::new();
    data_source
        .configure(Context::new(), configure_data_source(&server.url()))
        .await;

    let config = state(&[
        ("cluster_id", text("cynosdbmysql-1")),
        ("backup_id", Dynamic::Number(42.0)),
    ]);
    let response = data_source
        .read(Context::new(), read_request(data_source.type_name(), config))
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(get_string(&response.state, "id"), "cynosdbmysql-1");
    assert_eq!(
        get_string(&response.state, "download_url"),
        "https://backup/1.xb"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn request_status_lists_invocations() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("POST", "/")
        .match_header("x-tc-action", "GetRequestStatus")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "FunctionName": "fn",
            "FunctionRequestId": "req-a"
        })))
        .with_body(response(serde_json::json!({
            "TotalCount": 1,
            "Data": [{
                "FunctionName": "fn",
                "RetMsg": "ok",
                "RequestId": "req-a",
                "StartTime": "2023-01-01 00:00:00",
                "RetCode": 0,
                "Duration": 1.5,
                "MemUsage": 8.0,
                "RetryNum": 0
            }]
        })))
        .create_async()
        .await;

    let mut data_source = ScfRequestStatusDataSource::new();
    data_source
        .configure(Context::new(), configure_data_source(&server.url()))
        .await;

    let config = state(&[
        ("function_name", text("fn")),
        ("function_request_id", text("req-a")),
    ]);
    let response = data_source
        .read(Context::new(), read_request(data_source.type_name(), config))
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(get_string(&response.state, "id"), ids_hash(&["fn"]));

    let data = response.state.get_list(&AttributePath::new("data")).unwrap();
    assert_eq!(data.len(), 1);
    let fields = data[0].as_map().unwrap();
    assert_eq!(fields["ret_msg"], text("ok"));
    assert_eq!(fields["duration"], Dynamic::Number(1.5));
}

#[tokio::test(flavor = "multi_thread")]
async fn triggers_pass_filters_and_ordering() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .match_header("x-tc-action", "ListTriggers")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "FunctionName": "fn",
            "OrderBy": "add_time",
            "Order": "DESC",
            "Filters": [{"Name": "Type", "Values": ["timer"]}]
        })))
        .with_body(response(serde_json::json!({
            "TotalCount": 2,
            "Triggers": [
                {"TriggerName": "daily", "Type": "timer", "Enable": 1, "TriggerDesc": "0 0 * * *"},
                {"TriggerName": "hourly", "Type": "timer", "Enable": 0}
            ]
        })))
        .create_async()
        .await;

    let mut data_source = ScfTriggersDataSource::new();
    data_source
        .configure(Context::new(), configure_data_source(&server.url()))
        .await;

    let config = state(&[
        ("function_name", text("fn")),
        ("order_by", text("add_time")),
        ("order", text("DESC")),
        (
            "filters",
            Dynamic::List(vec![Dynamic::Map(HashMap::from([
                ("name".to_string(), text("Type")),
                ("values".to_string(), Dynamic::List(vec![text("timer")])),
            ]))]),
        ),
    ]);
    let response = data_source
        .read(Context::new(), read_request(data_source.type_name(), config))
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(
        get_string(&response.state, "id"),
        ids_hash(&["daily", "hourly"])
    );

    let triggers = response
        .state
        .get_list(&AttributePath::new("triggers"))
        .unwrap();
    assert_eq!(triggers.len(), 2);
    let first = triggers[0].as_map().unwrap();
    assert_eq!(first["trigger_desc"], text("0 0 * * *"));
    assert_eq!(first["enable"], Dynamic::Number(1.0));
    mock.assert_async().await;
}

#[tokio::test]
async fn read_before_configure_keeps_config() {
    let data_source = ScfTriggersDataSource::new();
    let config = state(&[("function_name", text("fn"))]);

    let response = data_source
        .read(
            Context::new(),
            read_request(data_source.type_name(), config.clone()),
        )
        .await;

    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.state, config);
}
