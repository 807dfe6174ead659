use thiserror::Error;
use std::io;

/// Custom result type alias for the crate
pub type Result<T> = std::result::Result<T, TestUtilError>;

/// Errors returned by the test helpers and the scripted server
#[derive(Debug, Error)]
pub enum TestUtilError {
    /// I/O errors
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Scripted server lifecycle errors
    #[error("Server error: {0}")]
    Server(String),
}
