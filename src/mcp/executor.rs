//! Bridges a dispatched `tools/call` to its handler.

use super::error::ToolError;
use super::registry::Tool;
use super::types::CallToolResult;
use super::validation::{render_violations, validate};
use crate::api::ApiClient;
use crate::telemetry::Logger;
use futures::FutureExt;
use serde_json::json;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Runs tools with the shared API client.
///
/// Invalid arguments come back as a successful text result so the assistant
/// can correct itself; classified API failures the tool chose not to absorb
/// come back as `Err`.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    api: Option<Arc<ApiClient>>,
    logger: Arc<dyn Logger>,
}

impl ToolExecutor {
    pub fn new(api: Option<Arc<ApiClient>>, logger: Arc<dyn Logger>) -> Self {
        Self { api, logger }
    }

    /// Whether tools get a live API client or run on demo data only.
    pub fn has_api(&self) -> bool {
        self.api.is_some()
    }

    pub async fn execute(
        &self,
        tool: &dyn Tool,
        raw_args: serde_json::Value,
    ) -> Result<CallToolResult, ToolError> {
        let args = if raw_args.is_null() {
            json!({})
        } else {
            raw_args
        };

        let schema = tool.input_schema();
        let violations = validate(&schema, &args);
        if !violations.is_empty() {
            self.logger.info(
                "tool arguments rejected",
                &json!({
                    "tool": tool.name(),
                    "violations": violations.iter().map(ToString::to_string).collect::<Vec<_>>(),
                }),
            );
            return Ok(CallToolResult::text(render_violations(
                tool.name(),
                &violations,
                &schema,
            )));
        }

        let call = tool.call(args, self.api.as_deref());
        let outcome = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(ToolError::Execution(format!(
                "tool '{}' panicked: {}",
                tool.name(),
                panic_message(panic.as_ref())
            ))),
        };

        match outcome {
            Ok(text) => {
                self.logger
                    .debug("tool call succeeded", &json!({ "tool": tool.name(), "chars": text.len() }));
                Ok(CallToolResult::text(text))
            }
            Err(ToolError::InvalidArguments(violations)) => Ok(CallToolResult::text(
                render_violations(tool.name(), &violations, &schema),
            )),
            Err(err) => {
                let mut context = json!({ "tool": tool.name(), "error": err.to_string() });
                if let ToolError::Api(api_err) = &err {
                    context["kind"] = json!(api_err.kind().as_str());
                }
                self.logger.error("tool call failed", &context);
                Err(err)
            }
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
