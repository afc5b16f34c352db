use super::parse_args;
use super::render::Render;
use crate::api::ApiClient;
use crate::demo;
use crate::mcp::{Tool, ToolError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::fmt::Write as _;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

#[derive(Debug, Clone)]
pub struct CategoryList(pub Vec<(String, usize)>);

impl Render for CategoryList {
    fn render(&self) -> String {
        if self.0.is_empty() {
            return "No categories are available.".to_string();
        }
        let mut out = String::from("## Categories\n\n");
        for (name, count) in &self.0 {
            let noun = if *count == 1 { "article" } else { "articles" };
            let _ = writeln!(out, "- `{name}` ({count} {noun})");
        }
        out.push_str("\nPass a category to `search_articles` to narrow a search.");
        out
    }
}

/// Browse the article categories. Served from bundled data; the API is never
/// contacted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListCategoriesTool;

#[async_trait]
impl Tool for ListCategoriesTool {
    fn name(&self) -> &str {
        "list_categories"
    }

    fn description(&self) -> &str {
        "List the knowledge-base categories and how many articles each holds."
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
        _api: Option<&ApiClient>,
    ) -> Result<String, ToolError> {
        let NoArgs {} = parse_args(args)?;
        Ok(CategoryList(demo::categories()).render())
    }
}
