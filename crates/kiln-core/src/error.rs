//! Error types for the Kiln application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Kiln workspace.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. Every gateway failure is
/// caught at the manager boundary and converted into a user-visible notice;
/// none of these variants should ever escape as a panic.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum KilnError {
    /// File open/read/write failure reported by a gateway.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Serial device open/close/read/write failure.
    #[error("Device error: {message}")]
    Device { message: String },

    /// A user-triggered action whose preconditions were not met.
    /// Rejected before any gateway call is made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Build or run invocation failure.
    #[error("Toolchain error: {0}")]
    Toolchain(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl KilnError {
    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Device error
    pub fn device(message: impl Into<String>) -> Self {
        Self::Device {
            message: message.into(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Toolchain error
    pub fn toolchain(message: impl Into<String>) -> Self {
        Self::Toolchain(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is an IO error
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Check if this is a Device error
    pub fn is_device(&self) -> bool {
        matches!(self, Self::Device { .. })
    }

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<std::io::Error> for KilnError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for KilnError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for KilnError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for KilnError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (transitional, used at binary boundaries)
impl From<anyhow::Error> for KilnError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<String> for KilnError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, KilnError>`.
pub type Result<T> = std::result::Result<T, KilnError>;
