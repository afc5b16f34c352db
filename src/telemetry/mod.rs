//! Logging setup and the injected logging capability.
//!
//! Stdout carries protocol frames, so every subscriber installed here writes
//! to stderr. Components never reach for a global logger; they receive an
//! `Arc<dyn Logger>` when constructed.

use crate::config::{LogFormat, LoggingConfig};
use std::sync::{Arc, Mutex};
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Maximum number of characters of a response body copied into log context.
pub const PREVIEW_CHARS: usize = 200;

/// Initialize the process-wide tracing subscriber.
///
/// The verbosity comes from `config.level` (read once here); `RUST_LOG`
/// wins when set.
pub fn init(config: &LoggingConfig) {
    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,lookup_mcp={}", config.level)));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer(config.format, std::io::stderr))
        .init();
}

/// Formatting layer for `format`. No file or line fields: events logged
/// through [`TracingLogger`] would all point at the wrapper.
fn fmt_layer<S, W>(format: LogFormat, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .compact()
            .with_writer(writer)
            .boxed(),
    }
}

/// Truncate `body` to at most [`PREVIEW_CHARS`] characters on a char boundary.
pub fn preview(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// Leveled diagnostic sink handed to the server and the API client.
pub trait Logger: Send + Sync + std::fmt::Debug {
    /// Record one message with structured context.
    fn log(&self, level: Level, message: &str, context: &serde_json::Value);

    fn debug(&self, message: &str, context: &serde_json::Value) {
        self.log(Level::Debug, message, context);
    }

    fn info(&self, message: &str, context: &serde_json::Value) {
        self.log(Level::Info, message, context);
    }

    fn warn(&self, message: &str, context: &serde_json::Value) {
        self.log(Level::Warn, message, context);
    }

    fn error(&self, message: &str, context: &serde_json::Value) {
        self.log(Level::Error, message, context);
    }
}

/// Forwards to `tracing` events under the crate target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str, context: &serde_json::Value) {
        match level {
            Level::Debug => tracing::debug!(target: "lookup_mcp", context = %context, "{message}"),
            Level::Info => tracing::info!(target: "lookup_mcp", context = %context, "{message}"),
            Level::Warn => tracing::warn!(target: "lookup_mcp", context = %context, "{message}"),
            Level::Error => tracing::error!(target: "lookup_mcp", context = %context, "{message}"),
        }
    }
}

/// A recorded log line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub context: serde_json::Value,
}

/// Keeps every record in memory. Used by tests and by embedders that want to
/// inspect diagnostics without a subscriber.
#[derive(Debug, Default, Clone)]
pub struct MemoryLogger {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Records at or above `level`.
    pub fn at_least(&self, level: Level) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.level >= level)
            .collect()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: Level, message: &str, context: &serde_json::Value) {
        if let Ok(mut guard) = self.records.lock() {
            guard.push(LogRecord {
                level,
                message: message.to_string(),
                context: context.clone(),
            });
        }
    }
}
