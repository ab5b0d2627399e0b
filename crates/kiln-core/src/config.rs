//! Application configuration domain model.

use serde::{Deserialize, Serialize};

/// Root configuration for the Kiln shell.
///
/// Loaded from `config.toml` by the infrastructure layer; every field has a
/// default so a missing or partial file always yields a usable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KilnConfig {
    /// Extension appended to user-chosen save paths that lack one.
    pub default_extension: String,
    /// Content placed in a freshly created document.
    pub new_file_template: String,
    /// Baud rate used when opening a serial port.
    pub baud_rate: u32,
    /// Timeout for a single serial read, in milliseconds.
    pub read_timeout_ms: u64,
    /// Interval between auto-read polls, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            default_extension: "rs".to_string(),
            new_file_template: "// Write your Rust code here\n".to_string(),
            baud_rate: 9600,
            read_timeout_ms: 1000,
            poll_interval_ms: 500,
        }
    }
}
