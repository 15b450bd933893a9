//! CynosDB API implementation

use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "cynosdb";
const VERSION: &str = "2019-01-07";

/// CynosDB API operations
pub struct CynosdbApi<'a> {
    client: &'a Client,
}

impl<'a> CynosdbApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Download address of one backup
    pub async fn describe_backup_download_url(
        &self,
        cluster_id: &str,
        backup_id: i64,
    ) -> Result<Option<String>, ApiError> {
        let response: DescribeBackupDownloadUrlResponse = self
            .client
            .call(
                SERVICE,
                VERSION,
                "DescribeBackupDownloadUrl",
                &DescribeBackupDownloadUrlRequest {
                    cluster_id,
                    backup_id,
                },
            )
            .await?;
        Ok(response.download_url)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeBackupDownloadUrlRequest<'r> {
    cluster_id: &'r str,
    backup_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeBackupDownloadUrlResponse {
    #[serde(default)]
    download_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use crate::api::test_helpers::create_test_client;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn describe_backup_download_url() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeBackupDownloadUrl")
            .match_body(Matcher::Json(
                serde_json::json!({"ClusterId": "cynosdbmysql-1", "BackupId": 42}),
            ))
            .with_body(r#"{"Response":{"DownloadUrl":"https://backup/1.xb","RequestId":"r"}}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let url = client
            .cynosdb()
            .describe_backup_download_url("cynosdbmysql-1", 42)
            .await
            .unwrap();

        assert_eq!(url.as_deref(), Some("https://backup/1.xb"));
        mock.assert_async().await;
    }
}
