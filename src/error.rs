//! Unified error types for Sapling with fail-open handling.
//!
//! The learning engine itself never fails: missing data degrades to
//! conservative defaults. Errors only arise at the edges, where the engine
//! talks to files, configuration, or a persistence collaborator. Those
//! callers can use [`FailOpen`] to log and fall back instead of surfacing
//! the failure to a learner-facing screen.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Sapling operations.
#[derive(Error, Debug)]
pub enum SaplingError {
    /// I/O errors from snapshot or config files.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON or TOML serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading or validation errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// Failures reported by a persistence collaborator.
    #[error("persistence error: {message}")]
    Persistence { message: String },

    /// Caller-supplied input that cannot be interpreted.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

/// A specialized Result type for Sapling operations.
pub type Result<T> = std::result::Result<T, SaplingError>;

impl SaplingError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

impl From<io::Error> for SaplingError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for SaplingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Logs the error as a warning and returns a safe value instead.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}

/// Process exit codes for the `sapling` binary.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;

    /// The command ran but reported a failure (bad input, unwritable snapshot).
    pub const ERROR: i32 = 1;

    /// Configuration could not be used.
    pub const CONFIG: i32 = 2;
}
