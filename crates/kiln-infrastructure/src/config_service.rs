//! Cached loading of the Kiln configuration file.

use std::path::PathBuf;
use std::sync::Arc;

use kiln_core::config::KilnConfig;
use kiln_core::error::{KilnError, Result};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Loads and caches `config.toml`.
///
/// The first load reads the file from disk; if the file is missing the
/// defaults are written out so the user has something to edit. Subsequent
/// loads return the cached value until [`invalidate`](Self::invalidate) is
/// called.
pub struct ConfigService {
    path: PathBuf,
    cache: Arc<RwLock<Option<KilnConfig>>>,
}

impl ConfigService {
    /// Creates a service over the default location
    /// (`<config dir>/kiln/config.toml`).
    pub fn new() -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| KilnError::config("Could not determine config directory"))?;
        Ok(Self::with_path(base.join("kiln").join("config.toml")))
    }

    /// Creates a service over an explicit file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the configuration, reading it from disk on first use.
    pub async fn load(&self) -> Result<KilnConfig> {
        if let Some(config) = self.cache.read().await.as_ref() {
            debug!("using cached config");
            return Ok(config.clone());
        }

        let config = if self.path.is_file() {
            let text = tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|e| KilnError::config(format!("Failed to read config: {e}")))?;
            toml::from_str(&text)?
        } else {
            info!(path = %self.path.display(), "config file missing, writing defaults");
            let config = KilnConfig::default();
            self.write(&config).await?;
            config
        };

        *self.cache.write().await = Some(config.clone());
        Ok(config)
    }

    /// Persists `config` and refreshes the cache.
    pub async fn save(&self, config: &KilnConfig) -> Result<()> {
        self.write(config).await?;
        *self.cache.write().await = Some(config.clone());
        Ok(())
    }

    /// Drops the cached value so the next load re-reads the file.
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    async fn write(&self, config: &KilnConfig) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| KilnError::config(format!("Failed to create config dir: {e}")))?;
        }
        let text = toml::to_string_pretty(config)?;
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| KilnError::config(format!("Failed to write config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_yields_defaults_and_writes_them() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kiln").join("config.toml");
        let service = ConfigService::with_path(path.clone());

        let config = service.load().await.unwrap();
        assert_eq!(config, KilnConfig::default());
        assert!(path.is_file());
    }

    #[tokio::test]
    async fn test_load_uses_cache_until_invalidated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "baud_rate = 115200").unwrap();
        let service = ConfigService::with_path(path.clone());

        assert_eq!(service.load().await.unwrap().baud_rate, 115200);

        // Change the file behind the cache.
        std::fs::write(&path, "baud_rate = 57600").unwrap();
        assert_eq!(service.load().await.unwrap().baud_rate, 115200);

        service.invalidate().await;
        assert_eq!(service.load().await.unwrap().baud_rate, 57600);
    }

    #[tokio::test]
    async fn test_save_refreshes_cache() {
        let dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(dir.path().join("config.toml"));

        let mut config = service.load().await.unwrap();
        config.baud_rate = 250_000;
        service.save(&config).await.unwrap();

        assert_eq!(service.load().await.unwrap().baud_rate, 250_000);
    }

    #[tokio::test]
    async fn test_invalid_toml_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "baud_rate = \"fast\"").unwrap();
        let service = ConfigService::with_path(path);

        let err = service.load().await.unwrap_err();
        assert!(matches!(err, KilnError::Serialization { .. }));
    }
}
