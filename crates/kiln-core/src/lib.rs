//! Kiln session core.
//!
//! The state model behind a desktop code-editing shell for embedded Rust
//! boards: the multi-document tab manager, the serial-device session state
//! machine, the keyboard shortcut router, and the workbench controller that
//! ties them together.
//!
//! Everything that touches the outside world goes through the trait seams in
//! [`gateway`]; the infrastructure crate provides the real implementations
//! and the presentation layer renders manager state and forwards intents.

pub mod config;
pub mod document;
pub mod error;
pub mod gateway;
pub mod notice;
pub mod serial;
pub mod shortcut;
pub mod workbench;

// Re-export common error type
pub use error::{KilnError, Result};
