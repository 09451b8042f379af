//! Study session use case.
//!
//! Drives the [`StudySession`] state machine around calls to the
//! [`GenerationService`]. The session lock is only held while a transition
//! is applied, never across a provider call, so a reset can supersede a
//! request that is still running.

use crate::generation_service::{GenerationService, SourceInput};
use std::sync::Arc;
use studybox_core::bundle::{MindMapEdge, StudyBundle};
use studybox_core::config::LayoutConfig;
use studybox_core::error::{Result, StudyError};
use studybox_core::exam::{ExamQuestion, Grading};
use studybox_core::graph::MindMapGraph;
use studybox_core::request::{ChatRequest, GenerationRequest, Settings};
use studybox_core::response::StructuredResult;
use studybox_core::session::{StudyPhase, StudySession, Ticket};
use studybox_core::state::StateRepository;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

pub struct StudyUseCase {
    service: Arc<GenerationService>,
    state: Arc<dyn StateRepository>,
    session: Mutex<StudySession>,
    settings: RwLock<Settings>,
    layout: LayoutConfig,
}

fn superseded() -> StudyError {
    StudyError::invalid_transition("apply the result", "the session was reset meanwhile")
}

fn unexpected(result: &StructuredResult) -> StudyError {
    StudyError::internal(format!("unexpected result kind: {result:?}"))
}

impl StudyUseCase {
    pub fn new(
        service: Arc<GenerationService>,
        state: Arc<dyn StateRepository>,
        layout: LayoutConfig,
    ) -> Self {
        Self {
            service,
            state,
            session: Mutex::new(StudySession::new(layout)),
            settings: RwLock::new(Settings::default()),
            layout,
        }
    }

    /// Reloads persisted settings and the last bundle, if any.
    pub async fn restore(&self) -> Result<()> {
        let settings = self.state.load_settings().await?;
        *self.settings.write().await = settings;

        if let Some(bundle) = self.state.load_bundle().await? {
            info!(title = %bundle.title, "[Study] Restored last bundle");
            *self.session.lock().await = StudySession::restore(bundle, self.layout);
        }
        Ok(())
    }

    // ============================================================================
    // Read access
    // ============================================================================

    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    pub async fn update_settings(&self, settings: Settings) -> Result<()> {
        self.state.save_settings(&settings).await?;
        *self.settings.write().await = settings;
        Ok(())
    }

    pub async fn phase(&self) -> StudyPhase {
        self.session.lock().await.phase()
    }

    pub async fn bundle(&self) -> Option<StudyBundle> {
        self.session.lock().await.bundle().cloned()
    }

    pub async fn graph(&self) -> MindMapGraph {
        self.session.lock().await.graph().clone()
    }

    /// A copy of the whole session for display.
    pub async fn snapshot(&self) -> StudySession {
        self.session.lock().await.clone()
    }

    async fn fail(&self, ticket: Ticket, err: StudyError) -> StudyError {
        self.session.lock().await.fail(ticket, &err);
        err
    }

    // ============================================================================
    // Generation
    // ============================================================================

    /// `Idle|Ready -> Generating -> Ready`; persists the new bundle.
    pub async fn generate(&self, topic: &str, input: SourceInput) -> Result<StudyBundle> {
        let ticket = self.session.lock().await.begin_generation()?;
        let settings = self.settings().await;

        let outcome = self.produce_bundle(topic, input, settings).await;

        let bundle = match outcome {
            Ok(bundle) => bundle,
            Err(err) => return Err(self.fail(ticket, err).await),
        };
        if !self
            .session
            .lock()
            .await
            .complete_generation(ticket, bundle.clone())?
        {
            return Err(superseded());
        }

        if let Err(err) = self.state.save_bundle(&bundle).await {
            warn!(error = %err, "[Study] Could not persist bundle");
        }
        Ok(bundle)
    }

    async fn produce_bundle(
        &self,
        topic: &str,
        input: SourceInput,
        settings: Settings,
    ) -> Result<StudyBundle> {
        let request = self.service.prepare_generate(topic, input, settings).await?;
        match self.service.generate(&request).await? {
            StructuredResult::Bundle(bundle) => Ok(bundle),
            other => Err(unexpected(&other)),
        }
    }

    /// Adds sub-concepts under `label`; returns the edges the provider proposed.
    pub async fn expand(&self, label: &str) -> Result<Vec<MindMapEdge>> {
        let (ticket, context) = {
            let mut session = self.session.lock().await;
            let ticket = session.begin_expansion(label)?;
            (ticket, session.chat_context().unwrap_or_default())
        };
        let request = GenerationRequest::Expand {
            node_label: label.to_string(),
            context,
            settings: self.settings().await,
        };

        let new_edges = match self.service.generate(&request).await {
            Ok(StructuredResult::Expansion(edges)) => edges,
            Ok(other) => return Err(self.fail(ticket, unexpected(&other)).await),
            Err(err) => return Err(self.fail(ticket, err).await),
        };

        let bundle = {
            let mut session = self.session.lock().await;
            if !session.complete_expansion(ticket, &new_edges)? {
                return Err(superseded());
            }
            session.bundle().cloned()
        };
        if let Some(bundle) = bundle {
            if let Err(err) = self.state.save_bundle(&bundle).await {
                warn!(error = %err, "[Study] Could not persist expanded bundle");
            }
        }
        Ok(new_edges)
    }

    // ============================================================================
    // Exam
    // ============================================================================

    /// Generates a fresh question set and enters `ExamActive`.
    pub async fn start_exam(&self) -> Result<Vec<ExamQuestion>> {
        let (ticket, context) = {
            let mut session = self.session.lock().await;
            let ticket = session.begin_exam()?;
            (ticket, session.chat_context().unwrap_or_default())
        };
        let request = GenerationRequest::Exam {
            context,
            settings: self.settings().await,
        };

        let questions = match self.service.generate(&request).await {
            Ok(StructuredResult::Exam(questions)) => questions,
            Ok(other) => return Err(self.fail(ticket, unexpected(&other)).await),
            Err(err) => return Err(self.fail(ticket, err).await),
        };
        if !self
            .session
            .lock()
            .await
            .complete_exam(ticket, questions.clone())?
        {
            return Err(superseded());
        }
        Ok(questions)
    }

    pub async fn answer(&self, question_id: u32, answer: impl Into<String>) -> Result<()> {
        self.session.lock().await.submit_answer(question_id, answer)
    }

    /// `ExamActive -> Grading -> Graded`, or back to `ExamActive` on failure.
    pub async fn grade(&self) -> Result<Grading> {
        let (ticket, questions, answers, context) = {
            let mut session = self.session.lock().await;
            let ticket = session.begin_grading()?;
            let exam = session
                .exam()
                .cloned()
                .ok_or_else(|| StudyError::internal("grading without an exam"))?;
            (
                ticket,
                exam.questions,
                exam.answers,
                session.chat_context().unwrap_or_default(),
            )
        };
        let request = GenerationRequest::Grade {
            context,
            questions,
            answers,
            settings: self.settings().await,
        };

        let grading = match self.service.generate(&request).await {
            Ok(StructuredResult::Grading(grading)) => grading,
            Ok(other) => return Err(self.fail(ticket, unexpected(&other)).await),
            Err(err) => return Err(self.fail(ticket, err).await),
        };
        if !self
            .session
            .lock()
            .await
            .complete_grading(ticket, grading.clone())?
        {
            return Err(superseded());
        }
        Ok(grading)
    }

    /// Same questions again with answers and grading cleared.
    pub async fn retake(&self) -> Result<()> {
        self.session.lock().await.retake()
    }

    // ============================================================================
    // Chat
    // ============================================================================

    pub async fn open_chat(&self) -> Result<()> {
        self.session.lock().await.open_chat()
    }

    pub async fn close_chat(&self) -> Result<()> {
        self.session.lock().await.close_chat()
    }

    /// Sends `message` with the full history and the derived context.
    pub async fn chat(&self, message: &str) -> Result<String> {
        let (ticket, request) = {
            let mut session = self.session.lock().await;
            let ticket = session.begin_chat(message)?;
            let request = ChatRequest {
                messages: session.chat_history().to_vec(),
                context: session.chat_context().unwrap_or_default(),
                settings: self.settings.read().await.clone(),
            };
            (ticket, request)
        };

        let reply = match self.service.chat(&request).await {
            Ok(reply) => reply,
            Err(err) => return Err(self.fail(ticket, err).await),
        };
        if !self
            .session
            .lock()
            .await
            .complete_chat(ticket, reply.clone())?
        {
            return Err(superseded());
        }
        Ok(reply)
    }

    // ============================================================================
    // Reset
    // ============================================================================

    /// Clears the session and the persisted state.
    pub async fn reset(&self) -> Result<()> {
        self.session.lock().await.reset();
        *self.settings.write().await = Settings::default();
        self.state.clear().await?;
        info!("[Study] Session reset");
        Ok(())
    }
}
