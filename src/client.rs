//! Service client seam and its HTTP implementation.
//!
//! [`JobClient`] is everything the job and backend layers need from the
//! service. [`SuperstaqClient`] implements it over HTTPS; tests implement it
//! with scripted doubles.
//!
//! | Method | Endpoint |
//! |--------|----------|
//! | `get_job()` | `GET /job/{id}` |
//! | `create_job()` | `POST /jobs` |
//! | `compile()` | `POST /compile`, `/aqt_compile`, `/qscout_compile` |
//! | `target_info()` | `POST /target_info` |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::circuit::SerializedCircuits;
use crate::compile::{CompileEndpoint, CompileRequest};
use crate::error::{SuperstaqError, SuperstaqResult};
use crate::job::JobPayload;

/// Default service host.
pub const DEFAULT_REMOTE_HOST: &str = "https://superstaq.super.tech";
/// API version path segment.
pub const API_VERSION: &str = "v0.2.0";

const API_KEY_ENV: &str = "SUPERSTAQ_API_KEY";
const REMOTE_HOST_ENV: &str = "SUPERSTAQ_REMOTE_HOST";

/// Operations the service exposes to this crate.
#[async_trait]
pub trait JobClient: Send + Sync {
    /// Latest status and data of one sub-job.
    async fn get_job(&self, job_id: &str) -> SuperstaqResult<JobPayload>;

    /// Submit a circuit batch; the service answers with one id per circuit.
    async fn create_job(&self, request: &CreateJobRequest) -> SuperstaqResult<CreateJobResponse>;

    /// Compile a circuit batch through `endpoint`, returning the raw response.
    async fn compile(
        &self,
        endpoint: CompileEndpoint,
        request: &CompileRequest,
    ) -> SuperstaqResult<serde_json::Value>;

    /// Raw target information for `target`.
    async fn target_info(&self, target: &str) -> SuperstaqResult<serde_json::Value>;

    /// Default bound for waiting on a job.
    fn max_retry_duration(&self) -> Duration {
        ClientConfig::DEFAULT_MAX_RETRY
    }
}

/// Body of `POST /jobs`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateJobRequest {
    /// Circuits to execute.
    #[serde(flatten)]
    pub circuits: SerializedCircuits,
    /// Shots per circuit.
    pub repetitions: u32,
    /// Target name, e.g. `ibmq_qasm_simulator`.
    pub target: String,
    /// Execution method (`dry-run`, `statevector`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// JSON-encoded option object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
}

/// Response of `POST /jobs`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateJobResponse {
    /// One id per submitted circuit, in submission order.
    pub job_ids: Vec<String>,
}

/// HTTP client configuration.
#[derive(Clone, PartialEq)]
pub struct ClientConfig {
    /// API key sent in the `Authorization` header.
    pub api_key: String,
    /// Scheme and host, without the version segment.
    pub remote_host: String,
    /// API version path segment.
    pub api_version: String,
    /// Default bound for waiting on a job.
    pub max_retry_duration: Duration,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Default bound for waiting on a job (one hour).
    pub const DEFAULT_MAX_RETRY: Duration = Duration::from_secs(3600);

    /// Create a configuration against the public service.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            remote_host: DEFAULT_REMOTE_HOST.to_string(),
            api_version: API_VERSION.to_string(),
            max_retry_duration: Self::DEFAULT_MAX_RETRY,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Read `SUPERSTAQ_API_KEY` and, if set, `SUPERSTAQ_REMOTE_HOST`.
    pub fn from_env() -> SuperstaqResult<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            SuperstaqError::Configuration(format!("{API_KEY_ENV} is not set"))
        })?;
        let mut config = Self::new(api_key);
        if let Ok(host) = std::env::var(REMOTE_HOST_ENV) {
            config.remote_host = host;
        }
        Ok(config)
    }

    /// Point the client at another host.
    pub fn with_remote_host(mut self, remote_host: impl Into<String>) -> Self {
        self.remote_host = remote_host.into();
        self
    }

    /// Use another API version.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Set the default bound for waiting on a job.
    pub fn with_max_retry_duration(mut self, max_retry: Duration) -> Self {
        self.max_retry_duration = max_retry;
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// `{remote_host}/{api_version}`.
    pub fn base_url(&self) -> String {
        format!(
            "{}/{}",
            self.remote_host.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }

    fn validate(&self) -> SuperstaqResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(SuperstaqError::Configuration(format!(
                "an API key is required; pass one explicitly or set {API_KEY_ENV}"
            )));
        }
        if !(self.remote_host.starts_with("http://") || self.remote_host.starts_with("https://"))
        {
            return Err(SuperstaqError::Configuration(format!(
                "remote host must be an http(s) URL, got {:?}",
                self.remote_host
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("remote_host", &self.remote_host)
            .field("api_version", &self.api_version)
            .field("max_retry_duration", &self.max_retry_duration)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// HTTP client for the Superstaq API.
#[derive(Debug, Clone)]
pub struct SuperstaqClient {
    http: ReqwestClient,
    config: ClientConfig,
}

impl SuperstaqClient {
    /// Create a client from a validated configuration.
    pub fn new(config: ClientConfig) -> SuperstaqResult<Self> {
        config.validate()?;
        let http = ReqwestClient::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SuperstaqError::Configuration(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> SuperstaqResult<T> {
        self.request(Method::GET, path, None::<&()>).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> SuperstaqResult<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> SuperstaqResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.config.base_url(), path);
        debug!("{} {}", method, url);

        let mut request = self.add_headers(self.http.request(method, &url));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            SuperstaqError::from(e)
        })?;

        Self::handle_response(response).await
    }

    fn add_headers(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(header::AUTHORIZATION, &self.config.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-Client-Name", env!("CARGO_PKG_NAME"))
            .header("X-Client-Version", env!("CARGO_PKG_VERSION"))
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> SuperstaqResult<T> {
        let status = response.status();
        if status.is_success() {
            let body = response.bytes().await?;
            return Ok(serde_json::from_slice(&body)?);
        }

        let code = status.as_u16();
        let message = response.text().await.unwrap_or_default();
        error!("Service returned {}: {}", code, message);
        match code {
            401 | 403 => Err(SuperstaqError::Authentication(message)),
            404 => Err(SuperstaqError::NotFound(message)),
            _ => Err(SuperstaqError::Api {
                status: code,
                message,
            }),
        }
    }
}

#[derive(Serialize)]
struct TargetInfoRequest<'a> {
    target: &'a str,
}

#[async_trait]
impl JobClient for SuperstaqClient {
    async fn get_job(&self, job_id: &str) -> SuperstaqResult<JobPayload> {
        self.get(&format!("/job/{job_id}")).await
    }

    async fn create_job(&self, request: &CreateJobRequest) -> SuperstaqResult<CreateJobResponse> {
        self.post("/jobs", request).await
    }

    async fn compile(
        &self,
        endpoint: CompileEndpoint,
        request: &CompileRequest,
    ) -> SuperstaqResult<serde_json::Value> {
        self.post(endpoint.path(), request).await
    }

    async fn target_info(&self, target: &str) -> SuperstaqResult<serde_json::Value> {
        self.post("/target_info", &TargetInfoRequest { target }).await
    }

    fn max_retry_duration(&self) -> Duration {
        self.config.max_retry_duration
    }
}
