//! Workspace file access over `tokio::fs`.

use std::path::Path;

use async_trait::async_trait;
use kiln_core::error::{KilnError, Result};
use kiln_core::gateway::WorkspaceGateway;
use tokio::fs;

/// The production [`WorkspaceGateway`], backed by the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioFsGateway;

impl TokioFsGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WorkspaceGateway for TokioFsGateway {
    async fn read_file(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path)
            .await
            .map_err(|e| KilnError::io(format!("Failed to read file: {e}")))
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| KilnError::io(format!("Failed to create directory: {e}")))?;
        }
        fs::write(path, content)
            .await
            .map_err(|e| KilnError::io(format!("Failed to write file: {e}")))
    }
}
