//! # Error Types
//!
//! Custom error types for Pattern Pilot using `thiserror`.

use thiserror::Error;

/// Main error type for Pattern Pilot
#[derive(Debug, Error)]
pub enum PilotError {
    /// Command packet with the wrong length
    #[error("Command packet must be {expected} bytes, got {actual}")]
    CommandLength { expected: usize, actual: usize },

    /// Command references a pattern outside the onboard catalog
    #[error("Pattern {pattern_id} is outside the catalog ({catalog_size} entries)")]
    PatternOutOfRange { pattern_id: u16, catalog_size: usize },

    /// Destination buffer cannot hold a whole packet
    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// Telemetry packet with the wrong length
    #[error("Telemetry packet must be {expected} bytes, got {actual}")]
    TelemetryLength { expected: usize, actual: usize },

    /// Malformed catalog data
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Telemetry log or sensor trace encoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Pattern Pilot
pub type Result<T> = std::result::Result<T, PilotError>;
