//! Lookup MCP server
//!
//! A Model Context Protocol tool server speaking line-delimited JSON-RPC over
//! stdio. Tools query a remote knowledge-base API and fall back to a bundled
//! demo dataset when the API is unconfigured or failing.
//!
//! # Architecture
//!
//! - **Protocol**: JSON-RPC framing, method dispatch and argument validation
//! - **API client**: one timeout-bounded `POST` per call, with every failure
//!   classified before it reaches a tool
//! - **Tools**: fetch, fall back explicitly, render markdown
//!
//! # Modules
//!
//! - [`mcp`]: JSON-RPC types, tool registry, executor and server loop
//! - [`api`]: outbound HTTP client and error classification
//! - [`tools`]: the tool handlers
//! - [`demo`]: bundled demo dataset
//! - [`config`]: layered configuration
//! - [`telemetry`]: stderr logging and the injected logger

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod api;
pub mod config;
pub mod demo;
pub mod mcp;
pub mod telemetry;
pub mod tools;
