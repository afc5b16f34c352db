//! Outbound client for the lookup API.
//!
//! The base URL carries any shared path prefix (`https://kb.example.com/api/v1`);
//! tools pass only their own suffix (`/search`). Nothing normalizes or
//! de-duplicates path segments.

pub mod client;
pub mod error;

pub use client::{ApiClient, ClientConfig, authorization_value, classify_body};
pub use error::{ApiError, ApiErrorKind, ClientBuildError};
