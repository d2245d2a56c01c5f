// REST HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, bearer auth, a per-call
// deadline, and a bounded retry loop. Endpoint modules (devices, events,
// etc.) are implemented as inherent methods in separate files to keep this
// module focused on transport mechanics.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::join_all;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::rest::endpoints::EndpointTable;
use crate::transport::TransportConfig;

// ── Credentials ──────────────────────────────────────────────────────

/// Source of the bearer token. Consulted on every attempt, so a rotated
/// token is picked up without rebuilding the client.
pub trait CredentialStore: Send + Sync {
    fn bearer_token(&self) -> Option<SecretString>;
}

/// No authentication.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialStore for NoCredentials {
    fn bearer_token(&self) -> Option<SecretString> {
        None
    }
}

/// A fixed token.
#[derive(Debug, Clone)]
pub struct StaticToken(SecretString);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }
}

impl CredentialStore for StaticToken {
    fn bearer_token(&self) -> Option<SecretString> {
        Some(self.0.clone())
    }
}

// ── Retry policy ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Default: 3.
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further retry. Default: 1s.
    pub base_delay: Duration,

    /// Statuses retried in addition to 500/502/503/504.
    pub extra_retry_statuses: Vec<u16>,

    /// Retry POST requests that were not marked idempotent.
    pub retry_post: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            extra_retry_statuses: Vec::new(),
            retry_post: false,
        }
    }
}

impl RetryPolicy {
    /// `base_delay * 2^attempt`, saturating.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// Timeouts, connect failures, and server-side transient statuses.
    pub fn should_retry(&self, err: &Error) -> bool {
        match err {
            Error::Status { status, .. } => {
                err.is_transient() || self.extra_retry_statuses.contains(status)
            }
            _ => err.is_transient(),
        }
    }
}

// ── Request description ──────────────────────────────────────────────

/// Everything needed to issue (and re-issue) one request.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    idempotent: bool,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let idempotent = method != Method::POST;
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            idempotent,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn query_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Mark a POST as safe to repeat.
    pub fn idempotent(mut self) -> Self {
        self.idempotent = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_idempotent(&self) -> bool {
        self.idempotent
    }
}

// ── Batch results ────────────────────────────────────────────────────

#[derive(Debug)]
pub struct BatchItem<T> {
    pub request: RequestSpec,
    pub result: Result<T, Error>,
}

/// Per-request outcomes of [`RestClient::batch`], in request order.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    pub items: Vec<BatchItem<T>>,
}

impl<T> BatchOutcome<T> {
    pub fn successes(&self) -> impl Iterator<Item = &T> {
        self.items.iter().filter_map(|item| item.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&RequestSpec, &Error)> {
        self.items
            .iter()
            .filter_map(|item| item.result.as_ref().err().map(|e| (&item.request, e)))
    }

    pub fn all_succeeded(&self) -> bool {
        self.items.iter().all(|item| item.result.is_ok())
    }

    pub fn into_results(self) -> Vec<Result<T, Error>> {
        self.items.into_iter().map(|item| item.result).collect()
    }
}

// ── RestClient ───────────────────────────────────────────────────────

/// Settings for [`RestClient`].
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub endpoints: EndpointTable,
    pub transport: TransportConfig,
}

impl RestConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            endpoints: EndpointTable::default(),
            transport: TransportConfig::default(),
        }
    }
}

/// HTTP client for the dashboard backend. Cheap to clone.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    retry: RetryPolicy,
    endpoints: Arc<EndpointTable>,
    credentials: Arc<dyn CredentialStore>,
}

impl RestClient {
    pub fn new(config: RestConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self, Error> {
        let http = config.transport.build_client()?;
        Ok(Self::with_client(http, config, credentials))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        config: RestConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            http,
            base_url: config.base_url,
            timeout: config.timeout,
            retry: config.retry,
            endpoints: Arc::new(config.endpoints),
            credentials,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoints(&self) -> &EndpointTable {
        &self.endpoints
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // ── URL building ─────────────────────────────────────────────────

    /// `{base}{path}?{query}`. The base path prefix (e.g. `/api/v1`) is kept.
    pub(crate) fn url_for(&self, spec: &RequestSpec) -> Result<Url, Error> {
        let full = format!(
            "{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            spec.path
        );
        let mut url = Url::parse(&full)?;
        if !spec.query.is_empty() {
            url.query_pairs_mut().extend_pairs(spec.query.iter());
        }
        Ok(url)
    }

    // ── Request execution ────────────────────────────────────────────

    /// Send a request, retrying transient failures per the retry policy.
    pub async fn send(&self, spec: &RequestSpec) -> Result<Bytes, Error> {
        let retryable = spec.is_idempotent() || self.retry.retry_post;
        let mut attempt: u32 = 0;

        loop {
            let err = match self.execute_once(spec).await {
                Ok(body) => return Ok(body),
                Err(e) => e,
            };

            if !retryable || !self.retry.should_retry(&err) {
                return Err(err);
            }

            if attempt >= self.retry.max_retries {
                return Err(Error::RetriesExhausted {
                    attempts: attempt + 1,
                    last: Box::new(err),
                });
            }

            let delay = self.retry.delay_for(attempt);
            attempt += 1;
            warn!(
                error = %err,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                path = spec.path(),
                "request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Send a request and decode its JSON body.
    pub async fn request<T: DeserializeOwned>(&self, spec: &RequestSpec) -> Result<T, Error> {
        let body = self.send(spec).await?;
        decode(&body)
    }

    /// Run `specs` concurrently. One failure never aborts the others.
    pub async fn batch<T: DeserializeOwned>(&self, specs: Vec<RequestSpec>) -> BatchOutcome<T> {
        let results = join_all(specs.iter().map(|spec| self.request::<T>(spec))).await;
        BatchOutcome {
            items: specs
                .into_iter()
                .zip(results)
                .map(|(request, result)| BatchItem { request, result })
                .collect(),
        }
    }

    /// One attempt: send, read the body, and check the status, all under
    /// the per-call deadline.
    async fn execute_once(&self, spec: &RequestSpec) -> Result<Bytes, Error> {
        let url = self.url_for(spec)?;
        debug!("{} {}", spec.method, url);

        let mut request = self
            .http
            .request(spec.method.clone(), url)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(token) = self.credentials.bearer_token() {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &spec.body {
            request = request.json(body);
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, Error>((status, body))
        };

        let (status, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| Error::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })??;

        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body)
    }
}

/// Decode a JSON body. An empty body decodes as `null`.
pub(crate) fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    let input: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        body
    };
    serde_json::from_slice(input).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: String::from_utf8_lossy(body).into_owned(),
    })
}
