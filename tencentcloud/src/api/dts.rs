//! Data Transmission Service API implementation

use super::common::EmptyResponse;
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "dts";
const VERSION: &str = "2021-12-06";

pub const SYNC_JOB_PAUSED: &str = "Paused";

/// Data Transmission Service API operations
pub struct DtsApi<'a> {
    client: &'a Client,
}

impl<'a> DtsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn pause_sync_job(&self, job_id: &str) -> Result<(), ApiError> {
        let _: EmptyResponse = self
            .client
            .call(SERVICE, VERSION, "PauseSyncJob", &JobIdRequest { job_id })
            .await?;
        Ok(())
    }

    pub async fn describe_sync_job(&self, job_id: &str) -> Result<Option<SyncJobInfo>, ApiError> {
        let response: DescribeSyncJobsResponse = self
            .client
            .call(SERVICE, VERSION, "DescribeSyncJobs", &JobIdRequest { job_id })
            .await?;
        Ok(response.job_list.into_iter().find(|job| job.job_id == job_id))
    }

    /// Current status of a sync job. A job missing from the listing is an
    /// error so waits on it stop at once.
    pub async fn sync_job_status(&self, job_id: &str) -> Result<String, ApiError> {
        self.describe_sync_job(job_id)
            .await?
            .map(|job| job.status)
            .ok_or_else(|| ApiError::NotFound(format!("sync job {}", job_id)))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct JobIdRequest<'r> {
    job_id: &'r str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeSyncJobsResponse {
    #[serde(default)]
    job_list: Vec<SyncJobInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SyncJobInfo {
    pub job_id: String,
    #[serde(default)]
    pub job_name: String,
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn sync_job_status_reads_job_list() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeSyncJobs")
            .match_body(Matcher::Json(serde_json::json!({"JobId": "sync-1"})))
            .with_body(
                r#"{"Response":{"TotalCount":1,"JobList":[{"JobId":"sync-1","Status":"Paused"}],"RequestId":"r"}}"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let status = client.dts().sync_job_status("sync-1").await.unwrap();
        assert_eq!(status, SYNC_JOB_PAUSED);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body(r#"{"Response":{"TotalCount":0,"JobList":[],"RequestId":"r"}}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let err = client.dts().sync_job_status("sync-1").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "sync job sync-1 not found");
    }
}
