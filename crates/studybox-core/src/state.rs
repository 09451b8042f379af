//! State repository trait.

use async_trait::async_trait;

use crate::bundle::StudyBundle;
use crate::error::Result;
use crate::request::Settings;

/// Persistent key/value state that survives restarts: the last displayed
/// bundle and the user's settings.
#[async_trait]
pub trait StateRepository: Send + Sync {
    async fn load_bundle(&self) -> Result<Option<StudyBundle>>;

    /// Replaces the stored bundle.
    async fn save_bundle(&self, bundle: &StudyBundle) -> Result<()>;

    /// Removes both the bundle and the settings.
    async fn clear(&self) -> Result<()>;

    /// Stored settings, or the defaults when none were saved.
    async fn load_settings(&self) -> Result<Settings>;

    async fn save_settings(&self, settings: &Settings) -> Result<()>;
}
