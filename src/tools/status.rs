use super::fetch::{ApiReply, Fetched};
use super::parse_args;
use super::render::{Render, render_fetched};
use crate::api::ApiClient;
use crate::mcp::{Tool, ToolError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::fmt::Write as _;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

/// `/status` reply.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusPayload {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub articles: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct StatusReport {
    pub base_url: String,
    pub timeout_ms: u64,
    pub payload: StatusPayload,
}

impl Render for StatusReport {
    fn render(&self) -> String {
        let mut out = String::from("## API status\n\n");
        let _ = writeln!(out, "- **status:** {}", self.payload.status);
        if let Some(version) = &self.payload.version {
            let _ = writeln!(out, "- **version:** {version}");
        }
        if let Some(articles) = self.payload.articles {
            let _ = writeln!(out, "- **articles:** {articles}");
        }
        let _ = writeln!(out, "- **base URL:** {}", self.base_url);
        let _ = write!(out, "- **timeout:** {}ms", self.timeout_ms);
        out
    }
}

const DEMO_MODE: &str = "## API status\n\n\
    - **status:** not configured\n\
    - **mode:** demo data\n\n\
    Set LOOKUP_API_URL and LOOKUP_API_KEY to connect the live API.";

/// Reports connectivity to the configured API.
///
/// Unlike the lookup tools this one never falls back: an API failure is the
/// answer being asked for, so it surfaces as a tool error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiStatusTool;

#[async_trait]
impl Tool for ApiStatusTool {
    fn name(&self) -> &str {
        "api_status"
    }

    fn description(&self) -> &str {
        "Check whether the knowledge-base API is configured and reachable."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn call(
        &self,
        args: serde_json::Value,
        api: Option<&ApiClient>,
    ) -> Result<String, ToolError> {
        let NoArgs {} = parse_args(args)?;
        let Some(api) = api else {
            return Ok(DEMO_MODE.to_string());
        };

        let fetched = match api
            .request_as::<ApiReply<StatusPayload>, _>("/status", &json!({}))
            .await
        {
            Ok(reply) => Fetched::Live(reply.map(|payload| StatusReport {
                base_url: api.config().base_url.clone(),
                timeout_ms: api.config().timeout_ms(),
                payload,
            })),
            Err(err) => Fetched::Failed(err),
        };
        render_fetched(&fetched)
    }
}
