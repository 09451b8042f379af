//! Test doubles shared by the application integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use studybox_application::GenerationService;
use studybox_core::bundle::StudyBundle;
use studybox_core::config::AppConfig;
use studybox_core::error::{Result, StudyError};
use studybox_core::provider::{
    ModelCatalog, ModelDescriptor, PromptParts, ProviderFailure, TextGenerator,
};
use studybox_core::request::Settings;
use studybox_core::state::StateRepository;
use studybox_core::transcript::{DocumentExtractor, TranscriptSegment, TranscriptSource};

pub const BUNDLE_REPLY: &str = r#"```json
{
  "title": "Photosynthesis",
  "summary": "Plants turn **light** into chemical energy.",
  "keyPoints": ["Chlorophyll absorbs light", "Oxygen is released"],
  "quiz": [
    {"question": "Which gas is released?", "options": ["Oxygen", "Neon"], "correctOption": "Oxygen"}
  ],
  "flashcards": [{"front": "Chlorophyll", "back": "Green pigment"}],
  "mindMapEdges": [
    {"source": "Photosynthesis", "target": "Light reactions"},
    {"source": "Photosynthesis", "target": "Calvin cycle"}
  ],
  "stats": {"accuracy": "95%", "timeSaved": "1 hour"}
}
```"#;

pub const EXPANSION_REPLY: &str = r#"{"newEdges": [
  {"source": "Calvin cycle", "target": "RuBisCO"},
  {"source": "Calvin cycle", "target": "G3P"}
]}"#;

pub const EXAM_REPLY: &str = r#"{"exam": [
  {"id": 1, "type": "mcq", "question": "Which gas is released?", "options": ["Oxygen", "Neon", "Argon", "Helium"], "correctAnswer": "Oxygen"},
  {"id": 2, "type": "mcq", "question": "Which pigment absorbs light?", "options": ["Chlorophyll", "Keratin", "Melanin", "Hemoglobin"], "correctAnswer": "Chlorophyll"},
  {"id": 3, "type": "mcq", "question": "Where does it happen?", "options": ["Chloroplast", "Ribosome", "Nucleus", "Vacuole"], "correctAnswer": "Chloroplast"},
  {"id": 4, "type": "text", "question": "Explain the Calvin cycle.", "correctAnswer": "Carbon fixation into sugar."},
  {"id": 5, "type": "text", "question": "Why do plants need water?", "correctAnswer": "It is split in the light reactions."}
]}"#;

pub const GRADING_REPLY: &str = r#"{
  "score": 60,
  "feedback": "Solid on the basics.",
  "corrections": [
    {"questionId": 1, "isCorrect": true, "remark": "Correct."},
    {"questionId": 2, "isCorrect": true, "remark": "Correct."},
    {"questionId": 3, "isCorrect": true, "remark": "Correct."},
    {"questionId": 4, "isCorrect": false, "remark": "Carbon fixation is missing."},
    {"questionId": 5, "isCorrect": false, "remark": "No answer given."}
  ]
}"#;

pub fn busy() -> ProviderFailure {
    ProviderFailure::Status {
        status_code: 503,
        message: "The model is overloaded".to_string(),
    }
}

/// Replays queued replies; once the script runs out every call is busy.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<std::result::Result<String, ProviderFailure>>>,
    prompts: Mutex<Vec<(String, PromptParts)>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<std::result::Result<String, ProviderFailure>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn push(&self, reply: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(reply.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> PromptParts {
        self.prompts.lock().unwrap().last().unwrap().1.clone()
    }

    pub fn last_model(&self) -> String {
        self.prompts.lock().unwrap().last().unwrap().0.clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        model: &str,
        prompt: &PromptParts,
    ) -> std::result::Result<String, ProviderFailure> {
        self.prompts
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(busy()))
    }
}

pub struct FakeCatalog(pub Vec<ModelDescriptor>);

impl FakeCatalog {
    pub fn flash() -> Arc<Self> {
        Arc::new(Self(vec![ModelDescriptor {
            name: "models/gemini-2.0-flash".to_string(),
            supported_generation_methods: vec!["generateContent".to_string()],
        }]))
    }
}

#[async_trait]
impl ModelCatalog for FakeCatalog {
    async fn list_models(&self) -> std::result::Result<Vec<ModelDescriptor>, ProviderFailure> {
        Ok(self.0.clone())
    }
}

/// Knows exactly one captioned video.
pub struct FakeTranscripts;

pub const CAPTIONED_VIDEO: &str = "https://www.youtube.com/watch?v=abcdefghijk";
pub const SILENT_VIDEO: &str = "https://youtu.be/zzzzzzzzzzz";

#[async_trait]
impl TranscriptSource for FakeTranscripts {
    async fn fetch_transcript(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
        if video_id == "abcdefghijk" {
            Ok(vec![
                TranscriptSegment {
                    offset_seconds: 0.0,
                    text: "Welcome to biology".to_string(),
                },
                TranscriptSegment {
                    offset_seconds: 90.0,
                    text: "Light hits the leaf".to_string(),
                },
            ])
        } else {
            Err(StudyError::invalid_input(format!(
                "video {video_id} has no captions"
            )))
        }
    }
}

pub struct Utf8Documents;

#[async_trait]
impl DocumentExtractor for Utf8Documents {
    async fn extract_text(&self, bytes: &[u8], _mime_type: &str) -> String {
        String::from_utf8(bytes.to_vec()).unwrap_or_default()
    }
}

#[derive(Default)]
pub struct MemoryState {
    pub bundle: Mutex<Option<StudyBundle>>,
    pub settings: Mutex<Option<Settings>>,
}

#[async_trait]
impl StateRepository for MemoryState {
    async fn load_bundle(&self) -> Result<Option<StudyBundle>> {
        Ok(self.bundle.lock().unwrap().clone())
    }

    async fn save_bundle(&self, bundle: &StudyBundle) -> Result<()> {
        *self.bundle.lock().unwrap() = Some(bundle.clone());
        Ok(())
    }

    async fn load_settings(&self) -> Result<Settings> {
        Ok(self.settings.lock().unwrap().clone().unwrap_or_default())
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        *self.settings.lock().unwrap() = Some(settings.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.bundle.lock().unwrap() = None;
        *self.settings.lock().unwrap() = None;
        Ok(())
    }
}

pub fn service(generator: Arc<ScriptedGenerator>) -> Arc<GenerationService> {
    Arc::new(GenerationService::new(
        generator,
        FakeCatalog::flash(),
        Arc::new(FakeTranscripts),
        Arc::new(Utf8Documents),
        &AppConfig::default(),
    ))
}
