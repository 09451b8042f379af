//! File-backed client state.
//!
//! One JSON document holds every persisted value under a fixed key. Values
//! are stored as raw JSON so an unreadable entry only loses that entry.

use crate::paths::StudyPaths;
use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use studybox_core::bundle::StudyBundle;
use studybox_core::error::Result;
use studybox_core::request::Settings;
use studybox_core::state::StateRepository;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub const LAST_BUNDLE_KEY: &str = "studybox.lastBundle";
pub const SETTINGS_KEY: &str = "studybox.settings";

type StateDocument = BTreeMap<String, serde_json::Value>;

pub struct FileStateRepository {
    file: AtomicJsonFile<StateDocument>,
    /// Serializes access from this process; the file lock covers others.
    guard: Mutex<()>,
}

impl FileStateRepository {
    pub fn new(paths: &StudyPaths) -> Result<Self> {
        Ok(Self::at(paths.state_file()?))
    }

    pub fn at(path: std::path::PathBuf) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
            guard: Mutex::new(()),
        }
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let _guard = self.guard.lock().await;
        let Some(mut document) = self.file.load()? else {
            return Ok(None);
        };
        let Some(value) = document.remove(key) else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(err) => {
                warn!(key, error = %err, "[State] Ignoring unreadable entry");
                Ok(None)
            }
        }
    }

    async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let _guard = self.guard.lock().await;
        self.file.update(StateDocument::new(), |document| {
            document.insert(key.to_string(), value);
            Ok(())
        })?;
        debug!(key, "[State] Saved");
        Ok(())
    }
}

#[async_trait]
impl StateRepository for FileStateRepository {
    async fn load_bundle(&self) -> Result<Option<StudyBundle>> {
        self.get(LAST_BUNDLE_KEY).await
    }

    async fn save_bundle(&self, bundle: &StudyBundle) -> Result<()> {
        self.put(LAST_BUNDLE_KEY, bundle).await
    }

    async fn load_settings(&self) -> Result<Settings> {
        Ok(self.get(SETTINGS_KEY).await?.unwrap_or_default())
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.put(SETTINGS_KEY, settings).await
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.guard.lock().await;
        self.file.update(StateDocument::new(), |document| {
            document.remove(LAST_BUNDLE_KEY);
            document.remove(SETTINGS_KEY);
            Ok(())
        })
    }
}
