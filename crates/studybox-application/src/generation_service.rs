//! Generation dispatch.
//!
//! One entry point per endpoint: a [`GenerationRequest`] goes through the
//! prompt compiler, the model resolver, the retry orchestrator and the
//! response validator, in that order.

use std::sync::Arc;
use studybox_core::config::{AppConfig, LimitsConfig};
use studybox_core::error::{Result, StudyError};
use studybox_core::prompt::{compile_chat, compile_prompt};
use studybox_core::provider::{ModelCatalog, TextGenerator};
use studybox_core::request::{
    ChatRequest, ChatRole, GenerationRequest, Settings, SourceMaterial,
};
use studybox_core::response::{StructuredResult, parse};
use studybox_core::transcript::{DocumentExtractor, TranscriptSource, extract_video_id};
use studybox_interaction::{ModelResolver, RetryOrchestrator};
use tracing::{info, warn};

/// Raw material as the user supplied it, before extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceInput {
    /// Only the typed topic.
    Topic,
    /// An uploaded file.
    File { mime_type: String, data: Vec<u8> },
    /// A link to a video whose captions are the material.
    Video { url: String },
}

pub struct GenerationService {
    orchestrator: RetryOrchestrator,
    resolver: ModelResolver,
    transcripts: Arc<dyn TranscriptSource>,
    documents: Arc<dyn DocumentExtractor>,
    limits: LimitsConfig,
}

impl GenerationService {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        catalog: Arc<dyn ModelCatalog>,
        transcripts: Arc<dyn TranscriptSource>,
        documents: Arc<dyn DocumentExtractor>,
        config: &AppConfig,
    ) -> Self {
        Self {
            orchestrator: RetryOrchestrator::new(generator, config.generation.clone()),
            resolver: ModelResolver::new(catalog, &config.generation),
            transcripts,
            documents,
            limits: config.limits,
        }
    }

    pub async fn resolve_model(&self) -> String {
        self.resolver.resolve_model().await
    }

    /// Turns user input into source material.
    ///
    /// Fails with `InvalidInput` for an empty topic without a file, a link
    /// that is not a recognizable video, a video without captions, or a
    /// document with no extractable text. Images pass through untouched.
    pub async fn prepare_source(&self, topic: &str, input: SourceInput) -> Result<SourceMaterial> {
        match input {
            SourceInput::Topic => {
                if topic.trim().is_empty() {
                    return Err(StudyError::invalid_input(
                        "enter a topic or attach a file",
                    ));
                }
                Ok(SourceMaterial::Text(topic.trim().to_string()))
            }
            SourceInput::Video { url } => {
                let video_id = extract_video_id(&url).ok_or_else(|| {
                    StudyError::invalid_input(format!("'{url}' is not a recognizable video link"))
                })?;
                let segments = self.transcripts.fetch_transcript(&video_id).await?;
                Ok(SourceMaterial::Transcript(segments))
            }
            SourceInput::File { mime_type, data } => {
                if mime_type.starts_with("image/") {
                    return Ok(SourceMaterial::Image { mime_type, data });
                }
                let text = self.documents.extract_text(&data, &mime_type).await;
                if text.trim().is_empty() {
                    return Err(StudyError::invalid_input(format!(
                        "no text could be extracted from the {mime_type} document"
                    )));
                }
                Ok(SourceMaterial::Document { text })
            }
        }
    }

    /// Builds the default `generate` request for the given input.
    pub async fn prepare_generate(
        &self,
        topic: &str,
        input: SourceInput,
        settings: Settings,
    ) -> Result<GenerationRequest> {
        let label = match (&input, topic.trim()) {
            (SourceInput::Video { .. }, _) => "Video transcript".to_string(),
            (_, "") => "Uploaded material".to_string(),
            (_, topic) => topic.to_string(),
        };
        let source = self.prepare_source(topic, input).await?;
        Ok(GenerationRequest::Generate {
            topic: label,
            source,
            settings,
        })
    }

    /// Runs one action end to end and returns its validated result.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<StructuredResult> {
        let action = request.action();
        let compiled = compile_prompt(request, &self.limits)?;
        let model = self.resolver.resolve_model().await;
        info!(%action, model = %model, "[Generate] Dispatching");

        let shape = compiled.shape;
        let result = self
            .orchestrator
            .execute_parsed(&compiled.parts, &model, |raw| parse(raw, &shape))
            .await;

        match &result {
            Ok(_) => info!(%action, "[Generate] Completed"),
            Err(err) => warn!(%action, error = %err, "[Generate] Failed"),
        }
        result
    }

    /// Answers the last user message, grounded in the request context.
    pub async fn chat(&self, request: &ChatRequest) -> Result<String> {
        match request.messages.last() {
            None => return Err(StudyError::invalid_input("chat needs at least one message")),
            Some(last) if last.role != ChatRole::User => {
                return Err(StudyError::invalid_input(
                    "the last chat message must come from the user",
                ));
            }
            Some(last) if last.content.trim().is_empty() => {
                return Err(StudyError::invalid_input("chat message is empty"));
            }
            Some(_) => {}
        }
        if request.context.trim().is_empty() {
            return Err(StudyError::invalid_input(
                "chat needs study material to ground its answers",
            ));
        }

        let compiled = compile_chat(request)?;
        let model = self.resolver.resolve_model().await;
        info!(model = %model, turns = request.messages.len(), "[Chat] Dispatching");
        let reply = self.orchestrator.execute(&compiled.parts, &model).await?;
        Ok(reply.trim().to_string())
    }
}
