//! Composition root: wires configuration, credentials, the provider client
//! and the file-backed collaborators into the use case.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use studybox_application::{GenerationService, StudyUseCase};
use studybox_core::config::AppConfig;
use studybox_infrastructure::{
    ConfigService, FileStateRepository, FileTranscriptSource, PlainTextExtractor, SecretService,
    StudyPaths,
};
use studybox_interaction::GeminiClient;
use tracing::debug;

/// Everything that works without a provider.
pub struct Workspace {
    pub paths: StudyPaths,
    pub config: AppConfig,
    pub state: Arc<FileStateRepository>,
}

impl Workspace {
    pub fn open(home: Option<&Path>) -> Result<Self> {
        let paths = StudyPaths::new(home);
        let config = ConfigService::new(&paths)
            .context("Failed to locate the config file")?
            .get_config_or_default();
        let state = Arc::new(
            FileStateRepository::new(&paths).context("Failed to locate the state file")?,
        );
        Ok(Self {
            paths,
            config,
            state,
        })
    }

    pub fn generation_service(&self) -> Result<Arc<GenerationService>> {
        let api_key = SecretService::new(&self.paths)?
            .gemini_api_key()
            .context("No Gemini API key configured")?;
        let client = Arc::new(GeminiClient::new(api_key));
        let transcripts_dir = self.paths.transcripts_dir()?;
        debug!(dir = %transcripts_dir.display(), "[App] Transcript directory");

        Ok(Arc::new(GenerationService::new(
            client.clone(),
            client,
            Arc::new(FileTranscriptSource::new(transcripts_dir)),
            Arc::new(PlainTextExtractor),
            &self.config,
        )))
    }

    /// Builds the use case and restores the last bundle and settings.
    pub async fn study(&self) -> Result<StudyUseCase> {
        let study = StudyUseCase::new(
            self.generation_service()?,
            self.state.clone(),
            self.config.layout,
        );
        study
            .restore()
            .await
            .context("Failed to restore the last session")?;
        Ok(study)
    }
}
