//! HTTP client for the platform APIs.
//!
//! [`ApiClient`] owns the connection pool, base endpoint, User-Agent and the
//! transport retry policy. Resource code talks to it through a
//! [`ScopedClient`], which binds the credentials and cancellation token of one
//! operation.
//!
//! Transport retries (network errors, 429 and 5xx responses) happen here and
//! are independent of the resource-level polling in [`crate::wait`].

use std::time::Duration;

use reqwest::{header, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::Credentials;
use crate::error::ProviderError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Transport-level retry policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound for a single delay.
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
    /// HTTP statuses that trigger a retry.
    pub retry_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: crate::config::DEFAULT_MAX_RETRIES,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
            retry_status_codes: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// A policy with the given retry budget.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Set the initial backoff.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Set the maximum backoff.
    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let delay_ms = self.initial_backoff.as_millis() as f64 * factor;
        Duration::from_millis(delay_ms.min(self.max_backoff.as_millis() as f64) as u64)
    }

    /// Whether a response status should be retried.
    pub fn should_retry(&self, status: StatusCode) -> bool {
        self.retry_status_codes.contains(&status.as_u16())
    }
}

/// Shared HTTP client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    endpoint: String,
    retry: RetryConfig,
    user_agent: String,
}

impl ApiClient {
    /// Create a client for `endpoint`.
    pub fn new(
        endpoint: &str,
        retry: RetryConfig,
        user_agent_suffix: Option<&str>,
    ) -> Result<Self, ProviderError> {
        let mut user_agent = format!("confluent-provider/{}", env!("CARGO_PKG_VERSION"));
        if let Some(suffix) = user_agent_suffix.filter(|s| !s.is_empty()) {
            user_agent.push(' ');
            user_agent.push_str(suffix);
        }

        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(user_agent.clone())
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            retry,
            user_agent,
        })
    }

    /// The base endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The User-Agent sent with every request.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Resolve `path` against the base endpoint. Absolute URLs pass through.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
        }
    }

    /// Bind credentials and a cancellation token for one operation.
    pub fn scoped(
        &self,
        credentials: Option<&Credentials>,
        cancel: &CancellationToken,
    ) -> ScopedClient<'_> {
        ScopedClient {
            client: self,
            credentials: credentials.cloned(),
            cancel: cancel.clone(),
        }
    }
}

/// A client bound to the credentials and cancellation of one operation.
#[derive(Debug, Clone)]
pub struct ScopedClient<'a> {
    client: &'a ApiClient,
    credentials: Option<Credentials>,
    cancel: CancellationToken,
}

impl<'a> ScopedClient<'a> {
    /// The cancellation token of this operation.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// `GET` and decode the response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        let body = self.send(Method::GET, path, None).await?;
        decode(body)
    }

    /// `POST` a JSON body and decode the response.
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        let body = self
            .send(Method::POST, path, Some(serde_json::to_value(body)?))
            .await?;
        decode(body)
    }

    /// `PATCH` a JSON body and decode the response.
    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        let body = self
            .send(Method::PATCH, path, Some(serde_json::to_value(body)?))
            .await?;
        decode(body)
    }

    /// `PUT` an optional JSON body, ignoring the response body.
    pub async fn put<B: Serialize>(&self, path: &str, body: Option<&B>) -> Result<(), ProviderError> {
        let body = body.map(serde_json::to_value).transpose()?;
        self.send(Method::PUT, path, body).await?;
        Ok(())
    }

    /// `POST` a JSON body, ignoring the response body.
    pub async fn post_empty<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ProviderError> {
        self.send(Method::POST, path, Some(serde_json::to_value(body)?))
            .await?;
        Ok(())
    }

    /// `DELETE` a resource.
    pub async fn delete(&self, path: &str) -> Result<(), ProviderError> {
        self.send(Method::DELETE, path, None).await?;
        Ok(())
    }

    /// Send a request with transport retries.
    ///
    /// Returns the decoded JSON body, or `None` for an empty body.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, ProviderError> {
        let url = self.client.url(path);
        let retry = &self.client.retry;
        let mut attempt: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(ProviderError::Cancelled);
            }
            attempt += 1;

            let mut request = self
                .client
                .http
                .request(method.clone(), &url)
                .header(header::ACCEPT, "application/json");
            if let Some(credentials) = &self.credentials {
                request = request.basic_auth(&credentials.key, Some(&credentials.secret));
            }
            if let Some(json) = &body {
                request = request.json(json);
            }

            debug!(method = %method, url = %url, attempt, "Sending request");
            let response = tokio::select! {
                _ = self.cancel.cancelled() => return Err(ProviderError::Cancelled),
                response = request.send() => response,
            };

            let wait = match response {
                Ok(response) => {
                    let status = response.status();
                    debug!(method = %method, url = %url, status = %status, attempt, "Received response");

                    if retry.should_retry(status) && attempt <= retry.max_retries {
                        let retry_after = response
                            .headers()
                            .get(header::RETRY_AFTER)
                            .and_then(|v| v.to_str().ok())
                            .and_then(parse_retry_after);
                        let wait = retry_after
                            .unwrap_or_else(|| retry.backoff(attempt))
                            .min(retry.max_backoff);
                        warn!(
                            url = %url,
                            status = %status,
                            attempt,
                            wait_ms = wait.as_millis() as u64,
                            "Transient error, retrying with backoff"
                        );
                        wait
                    } else {
                        return handle_response(response).await;
                    }
                }
                Err(e) if attempt <= retry.max_retries && is_transient(&e) => {
                    let wait = retry.backoff(attempt);
                    warn!(
                        url = %url,
                        error = %e,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        "Request failed, retrying with backoff"
                    );
                    wait
                }
                Err(e) => return Err(ProviderError::Transport(e)),
            };

            tokio::select! {
                _ = self.cancel.cancelled() => return Err(ProviderError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_request()
}

async fn handle_response(response: reqwest::Response) -> Result<Option<Value>, ProviderError> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response.text().await?;

    if status.is_success() {
        if text.trim().is_empty() {
            return Ok(None);
        }
        trace!(url = %url, body = %text, "Response body");
        return Ok(Some(serde_json::from_str(&text)?));
    }

    let message = error_message(&text);
    if status == StatusCode::NOT_FOUND {
        return Err(ProviderError::NotFound(message));
    }
    Err(ProviderError::Api {
        status: status.as_u16(),
        message,
    })
}

fn decode<T: DeserializeOwned>(body: Option<Value>) -> Result<T, ProviderError> {
    Ok(serde_json::from_value(body.unwrap_or(Value::Null))?)
}

/// Extract the server's error message from a response body.
///
/// Understands `{"errors":[{"detail": ..}]}`, `{"error":{"message": ..}}`,
/// `{"message": ..}` and falls back to the raw body.
pub fn error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };

    if let Some(errors) = json.get("errors").and_then(Value::as_array) {
        let details: Vec<&str> = errors
            .iter()
            .filter_map(|e| {
                e.get("detail")
                    .or_else(|| e.get("title"))
                    .and_then(Value::as_str)
            })
            .collect();
        if !details.is_empty() {
            return details.join("; ");
        }
    }
    if let Some(message) = json
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
    {
        return message.to_string();
    }
    if let Some(message) = json.get("message").and_then(Value::as_str) {
        return message.to_string();
    }
    body.trim().to_string()
}

/// Parse a `Retry-After` header given in whole seconds.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
