use super::fetch::{ApiReply, DegradedReason, Fetched};
use super::render::{Render, render_fetched};
use super::{GlossaryEntry, non_blank, parse_args};
use crate::api::{ApiClient, ApiError};
use crate::demo;
use crate::mcp::{Tool, ToolError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Write as _;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefineTermArgs {
    pub term: String,
}

#[derive(Debug, Clone)]
pub enum Definition {
    Found(GlossaryEntry),
    Unknown { term: String, similar: Vec<String> },
}

impl Definition {
    fn unknown(term: &str) -> Self {
        Self::Unknown {
            term: term.to_string(),
            similar: demo::similar_terms(term),
        }
    }

    fn from_demo(term: &str) -> Self {
        demo::define(term).map_or_else(|| Self::unknown(term), Self::Found)
    }
}

impl Render for Definition {
    fn render(&self) -> String {
        match self {
            Self::Found(entry) => {
                let mut out = format!("**{}**: {}", entry.term, entry.definition);
                if !entry.related.is_empty() {
                    let related: Vec<String> =
                        entry.related.iter().map(|r| format!("`{r}`")).collect();
                    let _ = write!(out, "\n\nRelated: {}", related.join(", "));
                }
                out
            }
            Self::Unknown { term, similar } => {
                let mut out = format!("No definition found for \"{term}\".");
                if !similar.is_empty() {
                    out.push_str("\n\nKnown terms you could try:\n");
                    for s in similar {
                        let _ = writeln!(out, "- {s}");
                    }
                }
                out
            }
        }
    }
}

/// Glossary lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefineTermTool;

impl DefineTermTool {
    async fn lookup(
        args: &DefineTermArgs,
        api: Option<&ApiClient>,
    ) -> Fetched<ApiReply<Definition>> {
        let term = args.term.as_str();
        let Some(api) = api else {
            return Fetched::Degraded {
                data: ApiReply::Data(Definition::from_demo(term)),
                reason: DegradedReason::NotConfigured,
            };
        };

        match api
            .request_as::<ApiReply<GlossaryEntry>, _>("/glossary/lookup", args)
            .await
        {
            Ok(reply) => Fetched::Live(reply.map(Definition::Found)),
            Err(ApiError::NotFound { .. }) => {
                Fetched::Live(ApiReply::Data(Definition::unknown(term)))
            }
            Err(err) => Fetched::Degraded {
                data: ApiReply::Data(Definition::from_demo(term)),
                reason: DegradedReason::ApiUnavailable(err),
            },
        }
    }
}

#[async_trait]
impl Tool for DefineTermTool {
    fn name(&self) -> &str {
        "define_term"
    }

    fn description(&self) -> &str {
        "Look up the definition of a term from the knowledge-base glossary."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "term": {
                    "type": "string",
                    "minLength": 1,
                    "maxLength": 100,
                    "description": "Term to define, for example \"rate limit\""
                }
            },
            "required": ["term"],
            "additionalProperties": false
        })
    }

    async fn call(
        &self,
        args: serde_json::Value,
        api: Option<&ApiClient>,
    ) -> Result<String, ToolError> {
        let mut args: DefineTermArgs = parse_args(args)?;
        args.term = non_blank("term", &args.term)?;
        let fetched = Self::lookup(&args, api).await;
        render_fetched(&fetched)
    }
}
