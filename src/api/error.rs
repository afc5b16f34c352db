//! Classified failures of outbound API calls.

use thiserror::Error;

/// Retry hint used when a 429 carries no usable `retry-after` header.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Every way an API call can fail, after classification.
///
/// Raw transport errors never leave the client; they are mapped onto one of
/// these variants first.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// 401 from the backend.
    #[error("authentication failed: the API rejected the configured credential")]
    Auth,

    /// 429 from the backend.
    #[error("rate limited by the API; retry after {retry_after_secs}s")]
    RateLimit { retry_after_secs: u64 },

    /// 404 from the backend.
    #[error("the API has no resource at '{endpoint}'")]
    NotFound { endpoint: String },

    /// Any other non-success status.
    #[error("API returned HTTP {status}")]
    Server { status: u16 },

    /// A success status whose body was HTML, not JSON, or unparsable.
    #[error("malformed API response: {reason} (body starts with: {preview})")]
    MalformedResponse { preview: String, reason: String },

    /// No response within the configured timeout.
    #[error("API request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Connection refused, DNS failure, reset, ...
    #[error("network failure: {0}")]
    Network(String),
}

/// Discriminant of [`ApiError`], for logging and policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    Auth,
    RateLimit,
    NotFound,
    Server,
    MalformedResponse,
    Timeout,
    Network,
}

impl ApiErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::RateLimit => "rate_limit",
            Self::NotFound => "not_found",
            Self::Server => "server_error",
            Self::MalformedResponse => "malformed_response",
            Self::Timeout => "timeout",
            Self::Network => "network_failure",
        }
    }
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ApiError {
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            Self::Auth => ApiErrorKind::Auth,
            Self::RateLimit { .. } => ApiErrorKind::RateLimit,
            Self::NotFound { .. } => ApiErrorKind::NotFound,
            Self::Server { .. } => ApiErrorKind::Server,
            Self::MalformedResponse { .. } => ApiErrorKind::MalformedResponse,
            Self::Timeout { .. } => ApiErrorKind::Timeout,
            Self::Network(_) => ApiErrorKind::Network,
        }
    }

    /// Whether a caller may reasonably try the same call again later.
    ///
    /// The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimit { .. } | Self::Timeout { .. } | Self::Network(_) => true,
            Self::Server { status } => *status >= 500,
            Self::Auth | Self::NotFound { .. } | Self::MalformedResponse { .. } => false,
        }
    }

    /// One-line hint for the person reading a degraded tool response.
    pub fn remedy(&self) -> String {
        match self {
            Self::Auth => "check LOOKUP_API_KEY".to_string(),
            Self::RateLimit { retry_after_secs } => {
                format!("try again in {retry_after_secs} seconds")
            }
            Self::NotFound { .. } => "check that LOOKUP_API_URL includes the API prefix".to_string(),
            Self::Server { .. } | Self::Network(_) => "the API may be down; try again later".to_string(),
            Self::MalformedResponse { .. } => {
                "LOOKUP_API_URL probably points at a web page rather than the API".to_string()
            }
            Self::Timeout { .. } => {
                "the API is slow; raise LOOKUP_API_TIMEOUT_MS or retry".to_string()
            }
        }
    }
}

/// Failure to construct an [`ApiClient`](super::ApiClient).
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("credential contains characters not allowed in an HTTP header")]
    InvalidCredential,

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Parse a `retry-after` header value in whole seconds.
///
/// HTTP dates and garbage fall back to [`DEFAULT_RETRY_AFTER_SECS`].
pub fn parse_retry_after(value: Option<&str>) -> u64 {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_after_parsed() {
        assert_eq!(parse_retry_after(Some("45")), 45);
        assert_eq!(parse_retry_after(Some(" 7 ")), 7);
    }

    #[test]
    fn test_retry_after_defaults() {
        assert_eq!(parse_retry_after(None), 60);
        assert_eq!(parse_retry_after(Some("Wed, 21 Oct 2015 07:28:00 GMT")), 60);
    }

    #[test]
    fn test_retry_policy() {
        assert!(!ApiError::Auth.is_retryable());
        assert!(ApiError::RateLimit { retry_after_secs: 1 }.is_retryable());
        assert!(ApiError::Server { status: 503 }.is_retryable());
        assert!(!ApiError::Server { status: 418 }.is_retryable());
        assert!(ApiError::Timeout { timeout_ms: 10 }.is_retryable());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ApiError::Network("refused".into()).kind().as_str(), "network_failure");
        assert_eq!(
            ApiError::MalformedResponse {
                preview: String::new(),
                reason: String::new()
            }
            .kind(),
            ApiErrorKind::MalformedResponse
        );
    }
}
