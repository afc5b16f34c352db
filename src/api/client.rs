//! HTTP client for the lookup API.
//!
//! Every call is a single JSON `POST` to `base_url + endpoint`, bounded by a
//! timeout, and every failure comes back as a classified [`ApiError`].

use super::error::{ApiError, ClientBuildError, parse_retry_after};
use crate::telemetry::{Logger, preview};
use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sent on every outbound request.
pub const USER_AGENT: &str = concat!("lookup-mcp/", env!("CARGO_PKG_VERSION"));

/// Authorization schemes recognized at the front of a credential.
const KNOWN_SCHEMES: &[&str] = &["Bearer", "Basic", "Token", "ApiKey", "Api-Key", "Digest"];

/// Immutable connection settings, built once at startup.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL including any shared path prefix (e.g. `https://kb.example.com/api/v1`).
    pub base_url: String,
    /// Raw or pre-formatted credential.
    pub credential: String,
    pub timeout: Duration,
    /// Scheme prepended to a bare credential.
    pub default_scheme: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("credential", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("default_scheme", &self.default_scheme)
            .finish()
    }
}

impl ClientConfig {
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Build the `Authorization` header value.
///
/// A credential that already starts with a recognized scheme (or the default
/// scheme) is passed through unchanged; a bare one gets `default_scheme`
/// prepended.
pub fn authorization_value(credential: &str, default_scheme: &str) -> String {
    let credential = credential.trim();
    if let Some((scheme, rest)) = credential.split_once(' ') {
        let known = KNOWN_SCHEMES
            .iter()
            .chain(std::iter::once(&default_scheme))
            .any(|s| s.eq_ignore_ascii_case(scheme));
        if known && !rest.trim().is_empty() {
            return credential.to_string();
        }
    }
    format!("{default_scheme} {credential}")
}

fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

fn looks_like_html(body: &str) -> bool {
    let head: String = body
        .trim_start()
        .chars()
        .take(14)
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Classify a success-status body before handing it out as JSON.
///
/// HTML is rejected without ever reaching the JSON parser. A missing
/// content type is tolerated; a declared non-JSON one is not.
pub fn classify_body(
    raw: &str,
    content_type: Option<&str>,
) -> Result<serde_json::Value, ApiError> {
    if looks_like_html(raw) {
        return Err(ApiError::MalformedResponse {
            preview: preview(raw),
            reason: "received an HTML page instead of JSON; the endpoint path is likely wrong, \
                     the request was redirected to a login page, or the server is misconfigured"
                .to_string(),
        });
    }

    if let Some(ct) = content_type {
        if !is_json_media_type(ct) {
            return Err(ApiError::MalformedResponse {
                preview: preview(raw),
                reason: format!("expected a JSON content type but got '{ct}'"),
            });
        }
    }

    serde_json::from_str(raw).map_err(|e| ApiError::MalformedResponse {
        preview: preview(raw),
        reason: format!("body is not valid JSON: {e}"),
    })
}

/// Render a transport error with its full source chain.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Shared, read-only API client.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    logger: Arc<dyn Logger>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(config: ClientConfig, logger: Arc<dyn Logger>) -> Result<Self, ClientBuildError> {
        let mut auth = HeaderValue::from_str(&authorization_value(
            &config.credential,
            &config.default_scheme,
        ))
        .map_err(|_| ClientBuildError::InvalidCredential)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            config,
            logger,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full URL for `endpoint`: the base URL and the endpoint concatenated verbatim.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url, endpoint)
    }

    /// POST `body` to `endpoint` and return the parsed JSON reply.
    pub async fn request<B>(&self, endpoint: &str, body: &B) -> Result<serde_json::Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(endpoint);
        let started = Instant::now();
        self.logger
            .debug("api request", &json!({ "url": url, "endpoint": endpoint }));

        // Dropping the send future on timeout aborts the connection.
        let result = match tokio::time::timeout(self.config.timeout, self.send(&url, endpoint, body))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout {
                timeout_ms: self.config.timeout_ms(),
            }),
        };

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &result {
            Ok(_) => self.logger.debug(
                "api request succeeded",
                &json!({ "url": url, "elapsed_ms": elapsed_ms }),
            ),
            Err(e) => self.logger.warn(
                "api request failed",
                &json!({
                    "url": url,
                    "kind": e.kind().as_str(),
                    "error": e.to_string(),
                    "elapsed_ms": elapsed_ms,
                }),
            ),
        }
        result
    }

    /// Like [`request`](Self::request), then deserialize into `T`.
    ///
    /// A reply of the wrong shape is a [`ApiError::MalformedResponse`].
    pub async fn request_as<T, B>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let value = self.request(endpoint, body).await?;
        let raw = value.to_string();
        serde_json::from_value(value).map_err(|e| ApiError::MalformedResponse {
            preview: preview(&raw),
            reason: format!("unexpected JSON shape: {e}"),
        })
    }

    async fn send<B>(
        &self,
        url: &str,
        endpoint: &str,
        body: &B,
    ) -> Result<serde_json::Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string);
            let body = response.text().await.unwrap_or_default();
            self.logger.error(
                "api returned an error status",
                &json!({
                    "url": url,
                    "status": status.as_u16(),
                    "body_preview": preview(&body),
                }),
            );

            return Err(match status.as_u16() {
                401 => ApiError::Auth,
                404 => ApiError::NotFound {
                    endpoint: endpoint.to_string(),
                },
                429 => ApiError::RateLimit {
                    retry_after_secs: parse_retry_after(retry_after.as_deref()),
                },
                other => ApiError::Server { status: other },
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        // The body can only be consumed once: read it raw, then classify.
        let raw = response
            .text()
            .await
            .map_err(|e| self.classify_transport(&e))?;

        classify_body(&raw, content_type.as_deref()).inspect_err(|e| {
            self.logger.error(
                "api returned an unusable body",
                &json!({
                    "url": url,
                    "status": status.as_u16(),
                    "content_type": content_type,
                    "error": e.to_string(),
                }),
            );
        })
    }

    fn classify_transport(&self, err: &reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout {
                timeout_ms: self.config.timeout_ms(),
            }
        } else {
            ApiError::Network(describe(err))
        }
    }
}
