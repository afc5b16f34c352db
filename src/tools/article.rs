use super::fetch::{ApiReply, DegradedReason, Fetched};
use super::render::{Render, render_fetched};
use super::{Article, non_blank, parse_args};
use crate::api::{ApiClient, ApiError};
use crate::demo;
use crate::mcp::{Tool, ToolError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Write as _;

const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetArticleArgs {
    pub id: String,
}

/// Outcome of an id lookup.
#[derive(Debug, Clone)]
pub enum ArticleLookup {
    Found(Article),
    Missing { id: String, suggestions: Vec<Article> },
}

impl ArticleLookup {
    fn missing(id: &str) -> Self {
        Self::Missing {
            id: id.to_string(),
            suggestions: demo::suggest_articles(id, MAX_SUGGESTIONS),
        }
    }

    fn from_demo(id: &str) -> Self {
        demo::article(id).map_or_else(|| Self::missing(id), Self::Found)
    }
}

impl Render for ArticleLookup {
    fn render(&self) -> String {
        match self {
            Self::Found(a) => {
                let mut out = format!("# {}\n\n", a.title);
                let _ = writeln!(out, "- **id:** `{}`", a.id);
                if !a.category.is_empty() {
                    let _ = writeln!(out, "- **category:** {}", a.category);
                }
                if !a.tags.is_empty() {
                    let _ = writeln!(out, "- **tags:** {}", a.tags.join(", "));
                }
                if let Some(url) = &a.url {
                    let _ = writeln!(out, "- **link:** {url}");
                }
                if !a.summary.is_empty() {
                    let _ = write!(out, "\n{}", a.summary);
                }
                out
            }
            Self::Missing { id, suggestions } => {
                let mut out = format!("No article with id `{id}` exists.\n");
                if !suggestions.is_empty() {
                    out.push_str("\nDid you mean:\n");
                    for a in suggestions {
                        let _ = writeln!(out, "- `{}`: {}", a.id, a.title);
                    }
                }
                out.push_str("\nUse `search_articles` to find the right id.");
                out
            }
        }
    }
}

/// Fetch one article by id.
///
/// A 404 from the API means the article does not exist; other failures fall
/// back to the demo dataset.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetArticleTool;

impl GetArticleTool {
    async fn lookup(
        args: &GetArticleArgs,
        api: Option<&ApiClient>,
    ) -> Fetched<ApiReply<ArticleLookup>> {
        let id = args.id.as_str();
        let Some(api) = api else {
            return Fetched::Degraded {
                data: ApiReply::Data(ArticleLookup::from_demo(id)),
                reason: DegradedReason::NotConfigured,
            };
        };

        match api
            .request_as::<ApiReply<Article>, _>("/articles/get", args)
            .await
        {
            Ok(reply) => Fetched::Live(reply.map(ArticleLookup::Found)),
            Err(ApiError::NotFound { .. }) => {
                Fetched::Live(ApiReply::Data(ArticleLookup::missing(id)))
            }
            Err(err) => Fetched::Degraded {
                data: ApiReply::Data(ArticleLookup::from_demo(id)),
                reason: DegradedReason::ApiUnavailable(err),
            },
        }
    }
}

#[async_trait]
impl Tool for GetArticleTool {
    fn name(&self) -> &str {
        "get_article"
    }

    fn description(&self) -> &str {
        "Fetch a single knowledge-base article by its id (for example kb-301)."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "minLength": 1,
                    "maxLength": 64,
                    "description": "Article id as returned by search_articles"
                }
            },
            "required": ["id"],
            "additionalProperties": false
        })
    }

    async fn call(
        &self,
        args: serde_json::Value,
        api: Option<&ApiClient>,
    ) -> Result<String, ToolError> {
        let mut args: GetArticleArgs = parse_args(args)?;
        args.id = non_blank("id", &args.id)?;
        let fetched = Self::lookup(&args, api).await;
        render_fetched(&fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_article() {
        let text = GetArticleTool.call(json!({"id": "kb-501"}), None).await.unwrap();
        assert!(text.starts_with("# Troubleshooting HTML responses"));
        assert!(text.contains("- **id:** `kb-501`"));
        assert!(text.contains("> Note:"));
    }

    #[tokio::test]
    async fn test_unknown_id_suggests() {
        let text = GetArticleTool.call(json!({"id": "kb-299"}), None).await.unwrap();
        assert!(text.contains("No article with id `kb-299` exists."));
        assert!(text.contains("`kb-201`"));
        assert!(text.contains("search_articles"));
    }

    #[test]
    fn test_missing_without_suggestions_still_actionable() {
        let text = ArticleLookup::Missing {
            id: "x".into(),
            suggestions: vec![],
        }
        .render();
        assert!(!text.contains("Did you mean"));
        assert!(text.contains("search_articles"));
    }
}
