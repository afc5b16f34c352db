//! Lookup MCP server
//!
//! Entry point: load configuration, wire the API client and tool registry,
//! then serve JSON-RPC on stdin/stdout until EOF or a termination signal.

#![allow(clippy::unused_async)]

use anyhow::Context;
use lookup_mcp::api::ApiClient;
use lookup_mcp::config::AppConfig;
use lookup_mcp::mcp::{McpServer, ServerInfo};
use lookup_mcp::telemetry::{self, Logger, TracingLogger};
use lookup_mcp::tools::default_registry;
use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load().context("failed to load configuration")?;
    telemetry::init(&config.logging);

    let logger: Arc<dyn Logger> = Arc::new(TracingLogger);

    let api = match config
        .api
        .client_config()
        .context("invalid API configuration")?
    {
        Some(client_config) => {
            info!(
                name: "api.configured",
                base_url = %client_config.base_url,
                timeout_ms = client_config.timeout_ms(),
                "Live API configured"
            );
            Some(Arc::new(
                ApiClient::new(client_config, Arc::clone(&logger))
                    .context("failed to build API client")?,
            ))
        }
        None => {
            warn!(
                name: "api.unconfigured",
                "No API URL or key configured; tools will serve demo data"
            );
            None
        }
    };

    let registry = Arc::new(default_registry().context("failed to register tools")?);
    let server = McpServer::new(
        ServerInfo {
            name: config.server.name.clone(),
            version: config.server.version.clone(),
        },
        registry,
        api,
        logger,
    );

    let summary = server
        .serve_until(
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
            shutdown_signal(),
        )
        .await
        .context("stdio transport failed")?;

    info!(
        name: "server.exit",
        reason = ?summary.reason,
        lines_read = summary.lines_read,
        responses_written = summary.responses_written,
        "Server stopped"
    );

    // The runtime would otherwise wait on the blocking stdin read, which only
    // returns once the host closes the pipe.
    let _ = std::io::Write::flush(&mut std::io::stdout());
    std::process::exit(0)
}

/// Resolves on Ctrl-C, or on SIGTERM where available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(name: "signal.install_failed", error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(name: "signal.install_failed", error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!(name: "signal.interrupt", "Interrupt received, shutting down"),
        () = terminate => info!(name: "signal.terminate", "Terminate received, shutting down"),
    }
}
