use super::fetch::{ApiReply, with_fallback};
use super::render::{Render, render_fetched};
use super::{Article, non_blank, parse_args};
use crate::api::ApiClient;
use crate::demo;
use crate::mcp::{Tool, ToolError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Write as _;

pub const DEFAULT_LIMIT: u32 = 5;
pub const MAX_LIMIT: u32 = 25;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// `/search` reply.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPayload {
    pub results: Vec<Article>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Search hits plus the query that produced them.
#[derive(Debug, Clone)]
pub struct SearchResults {
    pub query: String,
    pub category: Option<String>,
    pub limit: usize,
    pub articles: Vec<Article>,
    pub total: Option<u64>,
}

impl Render for SearchResults {
    fn render(&self) -> String {
        let scope = self
            .category
            .as_deref()
            .map(|c| format!(" in `{c}`"))
            .unwrap_or_default();

        if self.articles.is_empty() {
            let categories: Vec<String> = demo::categories()
                .into_iter()
                .map(|(name, _)| format!("`{name}`"))
                .collect();
            return format!(
                "No articles found for \"{}\"{scope}.\n\n\
                 Try:\n\
                 - fewer or more general words\n\
                 - a different category ({})\n\
                 - `list_categories` to browse what exists",
                self.query,
                categories.join(", ")
            );
        }

        let shown = self.articles.len().min(self.limit);
        let mut out = format!("## Results for \"{}\"{scope}\n\n", self.query);
        for (n, a) in self.articles.iter().take(self.limit).enumerate() {
            let _ = writeln!(out, "{}. **{}** (`{}`, {})", n + 1, a.title, a.id, a.category);
            if !a.summary.is_empty() {
                let _ = writeln!(out, "   {}", a.summary);
            }
            if let Some(url) = &a.url {
                let _ = writeln!(out, "   {url}");
            }
        }
        let total = self
            .total
            .unwrap_or(u64::try_from(self.articles.len()).unwrap_or(u64::MAX));
        let _ = write!(
            out,
            "\nShowing {shown} of {total}. Use `get_article` with an id for the full entry."
        );
        out
    }
}

/// Full-text article search.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchArticlesTool;

#[async_trait]
impl Tool for SearchArticlesTool {
    fn name(&self) -> &str {
        "search_articles"
    }

    fn description(&self) -> &str {
        "Search knowledge-base articles by keywords, optionally within one category."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "minLength": 1,
                    "maxLength": 200,
                    "description": "Keywords to search for"
                },
                "category": {
                    "type": "string",
                    "description": "Restrict results to this category (see list_categories)"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_LIMIT,
                    "description": "Maximum number of results (default 5)"
                }
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    async fn call(
        &self,
        args: serde_json::Value,
        api: Option<&ApiClient>,
    ) -> Result<String, ToolError> {
        let mut args: SearchArgs = parse_args(args)?;
        args.query = non_blank("query", &args.query)?;
        args.category = args
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let limit = args.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        args.limit = Some(limit);
        let limit = limit as usize;

        let fetched = with_fallback(
            api,
            |api| api.request_as::<ApiReply<SearchPayload>, _>("/search", &args),
            || {
                ApiReply::Data(SearchPayload {
                    results: demo::search(&args.query, args.category.as_deref(), limit),
                    total: None,
                })
            },
        )
        .await;

        let fetched = fetched.map(|reply| {
            reply.map(|payload| SearchResults {
                query: args.query.clone(),
                category: args.category.clone(),
                limit,
                articles: payload.results,
                total: payload.total,
            })
        });
        render_fetched(&fetched)
    }
}
