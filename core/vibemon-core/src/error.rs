//! Error types for vibemon-core operations.
//!
//! Delivery failures are not errors: an unreachable target is a normal
//! condition the dispatcher tolerates and logs. The variants here cover the
//! conditions that are reported back to the operator (nothing configured,
//! invalid lock mode) plus internal I/O failures that the cache logs and
//! swallows.

use std::path::PathBuf;

/// All errors that can occur in vibemon-core operations.
#[derive(Debug, thiserror::Error)]
pub enum VibemonError {
    #[error("No monitor target available. Set VIBEMON_DESKTOP_URL, VIBEMON_ESP32_URL, or VIBEMON_SERIAL_PORT")]
    NoTarget,

    #[error("No ESP32 target available. Set VIBEMON_ESP32_URL or VIBEMON_SERIAL_PORT")]
    NoEsp32Target,

    #[error("Invalid mode: {0}. Valid modes: first-project, on-thinking")]
    InvalidLockMode(String),

    #[error("I/O error: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using VibemonError.
pub type Result<T> = std::result::Result<T, VibemonError>;
