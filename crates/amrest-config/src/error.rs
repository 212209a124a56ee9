//! Error types for configuration loading and resolution.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a file failed for a reason other than it being absent.
    #[error("failed to read {}", path.display())]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// File that could not be read.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// The configuration file was not a valid settings document.
    #[error("invalid configuration file {}: {source}", path.display())]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Source JSON error.
        source: serde_json::Error,
    },
    /// A field contained an unusable value.
    #[error("invalid value for {field}: {reason}")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Human-readable reason for the failure.
        reason: String,
    },
}
