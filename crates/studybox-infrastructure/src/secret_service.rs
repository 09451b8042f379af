//! Credential loading.
//!
//! The `GEMINI_API_KEY` environment variable wins; otherwise the key comes
//! from `secret.json` (`{"gemini": {"api_key": "..."}}`).

use crate::paths::StudyPaths;
use std::fs;
use std::path::PathBuf;
use studybox_core::config::SecretConfig;
use studybox_core::error::{Result, StudyError};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone)]
pub struct SecretService {
    path: PathBuf,
}

impl SecretService {
    pub fn new(paths: &StudyPaths) -> Result<Self> {
        Ok(Self {
            path: paths.secret_file()?,
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Reads `secret.json`; a missing or blank file yields an empty config.
    pub fn load_secrets(&self) -> Result<SecretConfig> {
        if !self.path.exists() {
            return Ok(SecretConfig::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(SecretConfig::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Resolves the Gemini API key or fails with `MissingCredential`.
    pub fn gemini_api_key(&self) -> Result<String> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        let secrets = self.load_secrets()?;
        select_api_key(from_env, &secrets).ok_or_else(|| {
            StudyError::MissingCredential(format!(
                "set {API_KEY_ENV} or add gemini.api_key to {}",
                self.path.display()
            ))
        })
    }
}

fn select_api_key(from_env: Option<String>, secrets: &SecretConfig) -> Option<String> {
    from_env
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .or_else(|| {
            secrets
                .gemini
                .as_ref()
                .map(|gemini| gemini.api_key.trim().to_string())
                .filter(|key| !key.is_empty())
        })
}
