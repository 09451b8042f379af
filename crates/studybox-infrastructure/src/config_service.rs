//! Configuration service.
//!
//! Loads `AppConfig` from `config.toml`, writing a default file on first use,
//! and caches it for the lifetime of the service.

use crate::paths::StudyPaths;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use studybox_core::config::AppConfig;
use studybox_core::error::{Result, StudyError};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    config: Arc<RwLock<Option<AppConfig>>>,
}

impl ConfigService {
    pub fn new(paths: &StudyPaths) -> Result<Self> {
        Ok(Self {
            path: paths.config_file()?,
            config: Arc::new(RwLock::new(None)),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Returns the configuration, reading the file on first access.
    pub fn get_config(&self) -> Result<AppConfig> {
        if let Some(cached) = self
            .config
            .read()
            .map_err(|_| StudyError::internal("config cache poisoned"))?
            .as_ref()
        {
            return Ok(cached.clone());
        }

        let loaded = self.load_config()?;
        *self
            .config
            .write()
            .map_err(|_| StudyError::internal("config cache poisoned"))? = Some(loaded.clone());
        Ok(loaded)
    }

    /// Like [`get_config`](Self::get_config), but never fails: a broken file
    /// is logged and the defaults are used.
    pub fn get_config_or_default(&self) -> AppConfig {
        self.get_config().unwrap_or_else(|err| {
            warn!(path = %self.path.display(), error = %err, "[Config] Falling back to defaults");
            AppConfig::default()
        })
    }

    fn load_config(&self) -> Result<AppConfig> {
        if !self.path.exists() {
            let default_config = AppConfig::default();
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&self.path, toml::to_string_pretty(&default_config)?)?;
            info!(path = %self.path.display(), "[Config] Wrote default configuration");
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
