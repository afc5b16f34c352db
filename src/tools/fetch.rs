//! Explicit outcome of a tool's data-fetch step.
//!
//! Fallback decisions are branches on [`Fetched`], not caught errors.

use crate::api::{ApiClient, ApiError};
use crate::mcp::ContentBlock;
use serde::Deserialize;

/// Why a tool is serving demo data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradedReason {
    /// No base URL or credential configured.
    NotConfigured,
    /// The API call failed with a classified error.
    ApiUnavailable(ApiError),
}

impl DegradedReason {
    /// Sentence shown under a degraded response.
    pub fn explain(&self) -> String {
        match self {
            Self::NotConfigured => "Showing bundled demo data because no API is configured \
                                    (set LOOKUP_API_URL and LOOKUP_API_KEY to query live data)."
                .to_string(),
            Self::ApiUnavailable(err) => format!(
                "Showing bundled demo data because the live API call failed ({}): {}. Hint: {}.",
                err.kind(),
                err,
                err.remedy()
            ),
        }
    }
}

/// Result of fetching data for a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    /// Fresh data from the API.
    Live(T),
    /// Demo data standing in for the API.
    Degraded { data: T, reason: DegradedReason },
    /// The API failed and the tool has no fallback.
    Failed(ApiError),
}

impl<T> Fetched<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Self::Live(data) => Fetched::Live(f(data)),
            Self::Degraded { data, reason } => Fetched::Degraded {
                data: f(data),
                reason,
            },
            Self::Failed(err) => Fetched::Failed(err),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Fetch from the API, substituting `fallback()` when the API is missing or
/// any classified error occurs.
pub async fn with_fallback<'a, T, F, Fut>(
    api: Option<&'a ApiClient>,
    fetch: F,
    fallback: impl FnOnce() -> T,
) -> Fetched<T>
where
    F: FnOnce(&'a ApiClient) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let Some(api) = api else {
        return Fetched::Degraded {
            data: fallback(),
            reason: DegradedReason::NotConfigured,
        };
    };
    match fetch(api).await {
        Ok(data) => Fetched::Live(data),
        Err(err) => Fetched::Degraded {
            data: fallback(),
            reason: DegradedReason::ApiUnavailable(err),
        },
    }
}

/// A backend reply: either ready-made MCP text content, or a domain payload.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ApiReply<T> {
    Content { content: Vec<ContentBlock> },
    Data(T),
}

impl<T> ApiReply<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiReply<U> {
        match self {
            Self::Content { content } => ApiReply::Content { content },
            Self::Data(data) => ApiReply::Data(f(data)),
        }
    }
}
