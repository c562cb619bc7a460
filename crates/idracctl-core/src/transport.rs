//! HTTP transport to the controller
//!
//! The workflows only need two verbs, so the seam is a small async trait.
//! [`HttpTransport`] is the reqwest implementation used by the CLI; tests use
//! in-memory implementations.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, LOCATION};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::TransportError;
use crate::task::{TaskCallback, TaskMonitor};

/// User agent string for idracctl HTTP requests
const IDRACCTL_USER_AGENT: &str = concat!("idracctl/", env!("CARGO_PKG_VERSION"));

/// Result of a transport call
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Successful response from the controller
#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    pub status: u16,
    /// `Location` header, set for created jobs and task monitors
    pub location: Option<String>,
    /// Parsed JSON body; `None` for empty or non-JSON bodies
    pub body: Option<Value>,
}

impl RestResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self {
            status,
            location: None,
            body,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Job id from the `Location` header (`.../Jobs/JID_123` -> `JID_123`)
    pub fn job_id(&self) -> Option<&str> {
        self.location
            .as_deref()
            .and_then(|l| l.trim_end_matches('/').rsplit('/').next())
            .filter(|id| id.starts_with("JID_"))
    }
}

/// Request primitives the workflows are built on
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET a resource
    async fn get(&self, uri: &str) -> TransportResult<RestResponse>;

    /// POST a JSON body, typically to an action target
    async fn post(&self, uri: &str, body: &Value) -> TransportResult<RestResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for &T {
    async fn get(&self, uri: &str) -> TransportResult<RestResponse> {
        (**self).get(uri).await
    }

    async fn post(&self, uri: &str, body: &Value) -> TransportResult<RestResponse> {
        (**self).post(uri, body).await
    }
}

/// Connection settings for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Controller base URL (e.g., https://10.0.0.20)
    pub base_url: String,
    pub username: String,
    pub password: Option<String>,
    /// Accept self-signed certificates
    pub insecure: bool,
    /// Per-request timeout
    pub timeout: Duration,
    /// How often a task monitor is polled after a 202
    pub task_poll_interval: Duration,
    /// Upper bound for waiting on a task monitor
    pub task_timeout: Duration,
}

impl HttpTransportConfig {
    pub fn new(base_url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: None,
            insecure: false,
            timeout: Duration::from_secs(60),
            task_poll_interval: Duration::from_secs(1),
            task_timeout: Duration::from_secs(600),
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_task_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.task_poll_interval = interval;
        self.task_timeout = timeout;
        self
    }
}

/// Redfish transport over reqwest
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    config: HttpTransportConfig,
    on_task: Option<TaskCallback>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.config.username)
            .field("insecure", &self.config.insecure)
            .finish()
    }
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> TransportResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| TransportError::InvalidUri {
            uri: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(IDRACCTL_USER_AGENT)
            .default_headers(headers)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.insecure)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            config,
            on_task: None,
        })
    }

    /// Report task monitor progress to `callback`
    pub fn with_task_callback(mut self, callback: TaskCallback) -> Self {
        self.on_task = Some(callback);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a path or absolute URI against the controller base URL
    pub fn resolve(&self, uri: &str) -> TransportResult<Url> {
        resolve_uri(&self.base_url, uri)
    }

    async fn send(&self, request: reqwest::RequestBuilder, uri: &str) -> TransportResult<RestResponse> {
        let request = request.basic_auth(&self.config.username, self.config.password.as_deref());
        let response = request.send().await?;
        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            None
        } else {
            serde_json::from_str::<Value>(&text).ok()
        };

        trace!(uri, status = status.as_u16(), "response received");

        if !status.is_success() {
            return Err(TransportError::from_status(status.as_u16(), uri, body));
        }

        Ok(RestResponse {
            status: status.as_u16(),
            location,
            body,
        })
    }

    async fn follow_task(&self, accepted: RestResponse) -> TransportResult<RestResponse> {
        let Some(location) = accepted.location.clone() else {
            return Ok(accepted);
        };
        let monitor_url = self.resolve(&location)?;

        debug!(task = %monitor_url, "following task monitor");
        let monitor = TaskMonitor::new(
            monitor_url.as_str(),
            self.config.task_poll_interval,
            self.config.task_timeout,
        );
        let completed = monitor
            .wait(self, self.on_task.as_ref())
            .await?;

        // Keep the original Location so callers can still see the job id
        Ok(RestResponse {
            location: completed.location.or(accepted.location),
            ..completed
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, uri: &str) -> TransportResult<RestResponse> {
        let url = self.resolve(uri)?;
        debug!(uri = %url, "GET");
        self.send(self.client.get(url.clone()), url.as_str()).await
    }

    async fn post(&self, uri: &str, body: &Value) -> TransportResult<RestResponse> {
        let url = self.resolve(uri)?;
        debug!(uri = %url, "POST");
        let response = self
            .send(self.client.post(url.clone()).json(body), url.as_str())
            .await?;

        if response.status == StatusCode::ACCEPTED.as_u16() && is_task_monitor(&response) {
            return self.follow_task(response).await;
        }
        Ok(response)
    }
}

/// A 202 whose `Location` points at a task monitor rather than a job resource
fn is_task_monitor(response: &RestResponse) -> bool {
    response
        .location
        .as_deref()
        .is_some_and(|l| l.contains("/TaskService/") || l.contains("/TaskMonitor"))
}

/// Resolve `uri` against `base`; absolute URIs are returned unchanged
pub fn resolve_uri(base: &Url, uri: &str) -> TransportResult<Url> {
    base.join(uri).map_err(|e| TransportError::InvalidUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })
}
