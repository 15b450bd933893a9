//! Managed Prometheus (monitor) API implementation

use super::common::EmptyResponse;
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "monitor";
const VERSION: &str = "2018-07-24";

/// Managed Prometheus API operations
pub struct MonitorApi<'a> {
    client: &'a Client,
}

impl<'a> MonitorApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Create a scrape job, returns the new job id
    pub async fn create_scrape_job(&self, request: &CreateScrapeJobRequest) -> Result<String, ApiError> {
        let response: CreateScrapeJobResponse = self
            .client
            .call(SERVICE, VERSION, "CreatePrometheusScrapeJob", request)
            .await?;
        Ok(response.job_id)
    }

    /// Look up one scrape job, None when it no longer exists
    pub async fn describe_scrape_job(
        &self,
        instance_id: &str,
        agent_id: &str,
        job_id: &str,
    ) -> Result<Option<ScrapeJob>, ApiError> {
        let request = DescribeScrapeJobsRequest {
            instance_id: instance_id.to_string(),
            agent_id: agent_id.to_string(),
            job_ids: vec![job_id.to_string()],
        };

        let response: DescribeScrapeJobsResponse = self
            .client
            .call(SERVICE, VERSION, "DescribePrometheusScrapeJobs", &request)
            .await?;

        Ok(response.scrape_jobs.into_iter().find(|job| job.id == job_id))
    }

    pub async fn update_scrape_job(&self, request: &UpdateScrapeJobRequest) -> Result<(), ApiError> {
        let _: EmptyResponse = self
            .client
            .call(SERVICE, VERSION, "UpdatePrometheusScrapeJob", request)
            .await?;
        Ok(())
    }

    pub async fn delete_scrape_job(
        &self,
        instance_id: &str,
        agent_id: &str,
        job_id: &str,
    ) -> Result<(), ApiError> {
        let request = DeleteScrapeJobsRequest {
            instance_id: instance_id.to_string(),
            agent_id: agent_id.to_string(),
            job_ids: vec![job_id.to_string()],
        };
        let _: EmptyResponse = self
            .client
            .call(SERVICE, VERSION, "DeletePrometheusScrapeJobs", &request)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateScrapeJobRequest {
    pub instance_id: String,
    pub agent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateScrapeJobResponse {
    job_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateScrapeJobRequest {
    pub job_id: String,
    pub instance_id: String,
    pub agent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeScrapeJobsRequest {
    instance_id: String,
    agent_id: String,
    job_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeScrapeJobsResponse {
    #[serde(default)]
    scrape_jobs: Vec<ScrapeJob>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DeleteScrapeJobsRequest {
    instance_id: String,
    agent_id: String,
    job_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScrapeJob {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub config: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn describe_scrape_job_filters_by_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribePrometheusScrapeJobs")
            .match_body(Matcher::Json(serde_json::json!({
                "InstanceId": "prom-1",
                "AgentId": "agent-1",
                "JobIds": ["job-1"]
            })))
            .with_body(
                r#"{"Response":{"ScrapeJobs":[{"Id":"job-1","Name":"demo","AgentId":"agent-1","Config":"job_name: demo"}],"TotalCount":1,"RequestId":"r"}}"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let job = client
            .monitor()
            .describe_scrape_job("prom-1", "agent-1", "job-1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(job.config.as_deref(), Some("job_name: demo"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn describe_scrape_job_missing() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body(r#"{"Response":{"ScrapeJobs":[],"TotalCount":0,"RequestId":"r"}}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let job = client
            .monitor()
            .describe_scrape_job("prom-1", "agent-1", "job-1")
            .await
            .unwrap();
        assert!(job.is_none());
    }
}
