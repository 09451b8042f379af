//! Unified path management for studybox files.
//!
//! ```text
//! ~/.config/studybox/          # Config directory
//! ├── config.toml              # Application configuration
//! └── secret.json              # API keys
//!
//! ~/.local/share/studybox/     # Data directory
//! ├── state.json               # Last study bundle and settings
//! └── transcripts/             # <video_id>.json caption files
//! ```
//!
//! A base path replaces both roots, which keeps tests inside a temp dir.

use std::path::{Path, PathBuf};
use studybox_core::error::{Result, StudyError};

const APP_DIR: &str = "studybox";

#[derive(Debug, Clone, Default)]
pub struct StudyPaths {
    base_path: Option<PathBuf>,
}

impl StudyPaths {
    pub fn new(base_path: Option<&Path>) -> Self {
        Self {
            base_path: base_path.map(Path::to_path_buf),
        }
    }

    pub fn config_dir(&self) -> Result<PathBuf> {
        match &self.base_path {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or_else(|| StudyError::config("Cannot find home directory")),
        }
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.base_path {
            Some(base) => Ok(base.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or_else(|| StudyError::config("Cannot find home directory")),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Path to `secret.json`. Keep it readable by the owner only.
    pub fn secret_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("secret.json"))
    }

    pub fn state_file(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("state.json"))
    }

    pub fn transcripts_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("transcripts"))
    }
}
