//! Build/run invocations over `cargo` subprocesses.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use kiln_core::error::{KilnError, Result};
use kiln_core::gateway::ToolchainGateway;
use tokio::process::Command;
use tracing::info;

/// The production [`ToolchainGateway`], shelling out to `cargo`.
///
/// The project root is located by walking the ancestors of the active source
/// file until a directory containing `Cargo.toml` is found.
#[derive(Debug, Default, Clone, Copy)]
pub struct CargoToolchainGateway;

impl CargoToolchainGateway {
    pub fn new() -> Self {
        Self
    }

    async fn invoke(&self, subcommand: &str, main_file: &Path) -> Result<String> {
        let root = project_root(main_file)?;
        info!(subcommand, root = %root.display(), "invoking cargo");

        let output = Command::new("cargo")
            .arg(subcommand)
            .current_dir(&root)
            .output()
            .await
            .map_err(|e| KilnError::toolchain(format!("Failed to launch cargo: {e}")))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        if output.status.success() {
            Ok(text)
        } else {
            Err(KilnError::toolchain(text))
        }
    }
}

#[async_trait]
impl ToolchainGateway for CargoToolchainGateway {
    async fn build(&self, main_file: &Path) -> Result<String> {
        self.invoke("build", main_file).await
    }

    async fn run(&self, main_file: &Path) -> Result<String> {
        self.invoke("run", main_file).await
    }
}

/// Finds the nearest ancestor of `main_file` that contains a `Cargo.toml`.
fn project_root(main_file: &Path) -> Result<PathBuf> {
    for ancestor in main_file.ancestors().skip(1) {
        if ancestor.join("Cargo.toml").is_file() {
            return Ok(ancestor.to_path_buf());
        }
    }
    Err(KilnError::toolchain(format!(
        "No Cargo.toml found above {}",
        main_file.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_project_root_walks_ancestors() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), "[package]").unwrap();
        let nested = dir.path().join("src").join("bin");
        std::fs::create_dir_all(&nested).unwrap();

        let root = project_root(&nested.join("main.rs")).unwrap();
        assert_eq!(root, dir.path());
    }

    #[test]
    fn test_missing_manifest_is_toolchain_error() {
        let dir = TempDir::new().unwrap();
        let err = project_root(&dir.path().join("main.rs")).unwrap_err();
        assert!(matches!(err, KilnError::Toolchain(_)));
    }
}
