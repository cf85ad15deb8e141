//! Error handling module for the gcsimt CLI.
//!
//! Structured error types built with `thiserror`. The binary entry point
//! wraps them in `anyhow` for context.

use thiserror::Error;

/// Main error type for the gcsimt CLI application.
#[derive(Error, Debug)]
pub enum GcsimtError {
    /// Configuration file could not be found, parsed or written.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Command-line or configuration values rejected before simulating.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The simulation engine refused a request.
    #[error("Simulation error: {0}")]
    Simulation(#[from] gcsim::SimError),

    /// Error when IO operations fail.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error when JSON serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using GcsimtError.
pub type Result<T> = std::result::Result<T, GcsimtError>;
