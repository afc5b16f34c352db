//! The tools this server exposes.
//!
//! Each tool fetches structured data (from the API, or from the bundled demo
//! dataset when the API is absent or failing) and renders it as markdown.
//!
//! | tool | endpoint suffix | fallback |
//! |------|-----------------|----------|
//! | `search_articles` | `/search` | demo search |
//! | `get_article` | `/articles/get` | demo lookup |
//! | `list_categories` | none | bundled data only |
//! | `define_term` | `/glossary/lookup` | demo glossary |
//! | `api_status` | `/status` | none |

pub mod article;
pub mod categories;
pub mod fetch;
pub mod glossary;
pub mod render;
pub mod search;
pub mod status;

pub use article::GetArticleTool;
pub use categories::ListCategoriesTool;
pub use fetch::{ApiReply, DegradedReason, Fetched};
pub use glossary::DefineTermTool;
pub use render::Render;
pub use search::SearchArticlesTool;
pub use status::ApiStatusTool;

use crate::mcp::{RegistryError, ToolError, ToolRegistry, Violation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A knowledge-base article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlossaryEntry {
    pub term: String,
    pub definition: String,
    #[serde(default)]
    pub related: Vec<String>,
}

/// Registry holding every tool, in listing order.
pub fn default_registry() -> Result<ToolRegistry, RegistryError> {
    ToolRegistry::new()
        .with_tool(Arc::new(SearchArticlesTool))?
        .with_tool(Arc::new(GetArticleTool))?
        .with_tool(Arc::new(ListCategoriesTool))?
        .with_tool(Arc::new(DefineTermTool))?
        .with_tool(Arc::new(ApiStatusTool))
}

/// Deserialize already schema-checked arguments into a typed struct.
pub(crate) fn parse_args<T: DeserializeOwned>(args: serde_json::Value) -> Result<T, ToolError> {
    serde_json::from_value(args)
        .map_err(|e| ToolError::InvalidArguments(vec![Violation::new("arguments", e.to_string())]))
}

/// Trimmed `value`, or an argument violation for `field` if nothing is left.
pub(crate) fn non_blank(field: &str, value: &str) -> Result<String, ToolError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ToolError::InvalidArguments(vec![Violation::new(
            field,
            "must contain non-whitespace text",
        )]))
    } else {
        Ok(trimmed.to_string())
    }
}
