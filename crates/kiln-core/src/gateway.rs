//! Gateway trait seams.
//!
//! All file-system, device, toolchain, dialog, and process operations the
//! core performs go through these traits. The core never touches the outside
//! world directly, which keeps every manager testable with in-memory mocks.
//!
//! Each call either resolves with a typed result or fails with a
//! [`KilnError`](crate::error::KilnError); no operation is fire-and-forget
//! from the caller's perspective.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;

/// File read/write access to the user's workspace.
#[async_trait]
pub trait WorkspaceGateway: Send + Sync {
    /// Reads the full text content of a file.
    async fn read_file(&self, path: &Path) -> Result<String>;

    /// Writes `content` to `path`, replacing any existing content.
    async fn write_file(&self, path: &Path, content: &str) -> Result<()>;
}

/// Control of the single serial-device connection.
///
/// The implementation owns at most one open port at a time; opening a port
/// while another is open is an implementation-level error.
#[async_trait]
pub trait DeviceGateway: Send + Sync {
    /// Enumerates the identifiers of currently attached serial ports.
    async fn list_ports(&self) -> Result<Vec<String>>;

    /// Opens the named port.
    async fn open_port(&self, port: &str) -> Result<()>;

    /// Closes the open port. Fails when no port is open.
    async fn close_port(&self) -> Result<()>;

    /// Performs a single bounded read, returning the raw text chunk.
    async fn read_chunk(&self) -> Result<String>;

    /// Writes `data` to the open port.
    async fn write_chunk(&self, data: &str) -> Result<()>;

    /// Returns descriptive text about the attached board.
    async fn board_info(&self) -> Result<String>;
}

/// Build/run invocations for the project containing a source file.
#[async_trait]
pub trait ToolchainGateway: Send + Sync {
    /// Builds the project that owns `main_file`, returning informational text.
    async fn build(&self, main_file: &Path) -> Result<String>;

    /// Runs the project that owns `main_file`, returning its combined output.
    async fn run(&self, main_file: &Path) -> Result<String>;
}

/// Native file dialogs.
///
/// `Ok(None)` means the user dismissed the dialog; callers treat that as a
/// silent abort of the enclosing operation, not as an error.
#[async_trait]
pub trait DialogGateway: Send + Sync {
    /// Asks the user for a file to open.
    async fn pick_open_path(&self) -> Result<Option<PathBuf>>;

    /// Asks the user for a save location. `default_extension` is advertised
    /// to the dialog but enforcement happens in the document manager.
    async fn pick_save_path(&self, default_extension: &str) -> Result<Option<PathBuf>>;
}

/// Window/process lifecycle control.
#[async_trait]
pub trait ShellGateway: Send + Sync {
    /// Requests that the hosting process terminate.
    async fn request_exit(&self) -> Result<()>;
}
