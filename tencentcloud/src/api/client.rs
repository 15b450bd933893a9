use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::common::{ApiEnvelope, ResponseMeta};
use super::error::ApiError;
use super::retry::RetryPolicy;
use super::sign::{self, Credential};

pub const DEFAULT_DOMAIN: &str = "tencentcloudapi.com";
pub const DEFAULT_PROTOCOL: &str = "https";

/// Tencent Cloud API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    config: ClientConfig,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credential: Credential,
    pub region: String,
    /// `https` or `http`
    pub protocol: String,
    pub domain: String,
    /// Base URL used for every service instead of `{service}.{domain}`
    pub endpoint: Option<String>,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(credential: Credential, region: impl Into<String>) -> Self {
        Self {
            credential,
            region: region.into(),
            protocol: DEFAULT_PROTOCOL.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            endpoint: None,
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into().to_lowercase();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Client {
    /// Create a new API client
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        if config.protocol != "https" && config.protocol != "http" {
            return Err(ApiError::InvalidEndpoint(format!(
                "unsupported protocol '{}', expected HTTPS or HTTP",
                config.protocol
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                config,
            }),
        })
    }

    pub fn region(&self) -> &str {
        &self.inner.config.region
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.inner.config.retry
    }

    /// URL that requests for `service` are posted to
    pub fn service_url(&self, service: &str) -> Result<Url, ApiError> {
        let config = &self.inner.config;
        let raw = match &config.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("{}://{}.{}", config.protocol, service, config.domain),
        };

        let url = Url::parse(&raw).map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", raw, e)))?;
        if url.host_str().is_none() {
            return Err(ApiError::InvalidEndpoint(format!("{}: missing host", raw)));
        }
        Ok(url)
    }

    /// Invoke one API action and decode the `Response` object
    pub async fn call<Req, Resp>(
        &self,
        service: &str,
        version: &str,
        action: &str,
        request: &Req,
    ) -> Result<Resp, ApiError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let config = &self.inner.config;
        let url = self.service_url(service)?;
        let host = host_header(&url);

        let payload =
            serde_json::to_string(request).map_err(|e| ApiError::Parse(e.to_string()))?;
        let timestamp = chrono::Utc::now().timestamp();
        let authorization =
            sign::authorization(&config.credential, service, &host, timestamp, &payload)?;

        let mut builder = self
            .inner
            .http_client
            .post(url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, sign::CONTENT_TYPE)
            .header("X-TC-Action", action)
            .header("X-TC-Version", version)
            .header("X-TC-Timestamp", timestamp.to_string())
            .header("X-TC-Region", &config.region);
        if let Some(token) = &config.credential.token {
            builder = builder.header("X-TC-Token", token);
        }

        let response = builder.body(payload.clone()).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                "api[{}] returned HTTP {}, request body [{}], response body [{}]",
                action,
                status,
                payload,
                text
            );
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: ApiEnvelope = serde_json::from_str(&text).map_err(|e| {
            ApiError::Parse(format!("api[{}] invalid response body: {}", action, e))
        })?;
        let meta: ResponseMeta = serde_json::from_value(envelope.response.clone())
            .map_err(|e| ApiError::Parse(format!("api[{}] invalid response: {}", action, e)))?;

        if let Some(error) = meta.error {
            tracing::debug!(
                "api[{}] failed, request body [{}], reason [{}: {}]",
                action,
                payload,
                error.code,
                error.message
            );
            return Err(ApiError::Api {
                code: error.code,
                message: error.message,
                request_id: meta.request_id,
            });
        }

        tracing::debug!(
            "api[{}] success, request body [{}], response body [{}]",
            action,
            payload,
            text
        );

        serde_json::from_value(envelope.response)
            .map_err(|e| ApiError::Parse(format!("api[{}] unexpected response: {}", action, e)))
    }

    /// SQL Server API operations
    pub fn sqlserver(&self) -> crate::api::sqlserver::SqlserverApi<'_> {
        crate::api::sqlserver::SqlserverApi::new(self)
    }

    /// ClickHouse (cdwch) API operations
    pub fn cdwch(&self) -> crate::api::cdwch::CdwchApi<'_> {
        crate::api::cdwch::CdwchApi::new(self)
    }

    /// Managed Prometheus API operations
    pub fn monitor(&self) -> crate::api::monitor::MonitorApi<'_> {
        crate::api::monitor::MonitorApi::new(self)
    }

    /// VPC API operations
    pub fn vpc(&self) -> crate::api::vpc::VpcApi<'_> {
        crate::api::vpc::VpcApi::new(self)
    }

    /// Data Transmission Service API operations
    pub fn dts(&self) -> crate::api::dts::DtsApi<'_> {
        crate::api::dts::DtsApi::new(self)
    }

    /// Web Application Firewall API operations
    pub fn waf(&self) -> crate::api::waf::WafApi<'_> {
        crate::api::waf::WafApi::new(self)
    }

    /// CynosDB API operations
    pub fn cynosdb(&self) -> crate::api::cynosdb::CynosdbApi<'_> {
        crate::api::cynosdb::CynosdbApi::new(self)
    }

    /// Serverless Cloud Function API operations
    pub fn scf(&self) -> crate::api::scf::ScfApi<'_> {
        crate::api::scf::ScfApi::new(self)
    }
}

/// Host header value reqwest will send for `url`
fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}
