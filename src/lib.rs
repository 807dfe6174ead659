#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]

//! testutil - helpers for writing tests against HTTP backends
//!
//! ## Features
//! - Scriptable HTTP server answering with pre-programmed status/body sequences
//! - Observation of the last request and of the body write outcome
//! - File write/exists/read helpers
//! - Generic JSON parsing
//! - Rounding for approximate floating point comparisons
//!
//! ## Usage
//! ```rust,ignore
//! use testutil::TestServer;
//! use axum::http::StatusCode;
//!
//! async fn example() -> testutil::Result<()> {
//!     let server = TestServer::start().await?;
//!     server.set_statuses([StatusCode::NOT_FOUND, StatusCode::OK]).await;
//!
//!     let response = server.get("/").await?;
//!     assert_eq!(response.status(), StatusCode::NOT_FOUND);
//!     assert!(server.observation().await.body_write_error.is_none());
//!
//!     server.close().await
//! }
//! ```

/// Server configuration
pub mod config;
/// Error handling types and utilities
pub mod error;
/// File write/exists/read helpers
pub mod file;
/// Generic JSON parsing
pub mod json;
/// Logging configuration for tests
pub mod logging;
/// Query string parsing and encoding
pub mod query;
/// Rounding for approximate comparisons
pub mod round;
/// Response scripts: which status and body to answer with
pub mod script;
/// Scripted value sequences
pub mod sequence;
/// The scriptable HTTP test server
pub mod server;
/// Response writers with observable write outcomes
pub mod writer;

// Re-export common types
pub use config::ServerConfig;
pub use error::{Result, TestUtilError};
pub use file::{file_exists, read_file, try_read_file, write_file};
pub use json::{parse_json, try_parse_json};
pub use query::{parse_query, url_with_query, QueryValues};
pub use round::{round, round_fixed, round_fixed_slice, round_slice};
pub use script::{Script, ScriptConfig};
pub use sequence::Sequence;
pub use server::{Observation, RecordedRequest, RequestInfo, ServerState, TestServer};
pub use writer::WriteError;
