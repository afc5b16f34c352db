//! Markdown rendering of tool results.

use super::fetch::{ApiReply, Fetched};
use crate::mcp::{ContentBlock, ToolError};

/// Turns a structured result into the text block returned to the assistant.
pub trait Render {
    fn render(&self) -> String;
}

impl<T: Render> Render for ApiReply<T> {
    fn render(&self) -> String {
        match self {
            Self::Content { content } => content
                .iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => text.as_str(),
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
            Self::Data(data) => data.render(),
        }
    }
}

/// Render a fetch outcome. Degraded data gets an explanatory note; a failed
/// fetch becomes a [`ToolError::Api`].
pub fn render_fetched<T: Render>(fetched: &Fetched<T>) -> Result<String, ToolError> {
    match fetched {
        Fetched::Live(data) => Ok(data.render()),
        Fetched::Degraded { data, reason } => Ok(format!(
            "{}\n\n> Note: {}",
            data.render().trim_end(),
            reason.explain()
        )),
        Fetched::Failed(err) => Err(ToolError::Api(err.clone())),
    }
}
