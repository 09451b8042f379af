use super::chat_context::chat_context;
use super::phase::{RequestKind, StudyPhase, Ticket};
use crate::bundle::{MindMapEdge, StudyBundle};
use crate::config::LayoutConfig;
use crate::error::{Result, StudyError};
use crate::exam::{ExamQuestion, ExamSession, Grading};
use crate::graph::{self, MindMapGraph};
use crate::request::{ChatMessage, ChatRole};
use tracing::{debug, info, warn};

/// Session context owned by the state machine.
///
/// Holds the displayed study bundle, the accumulated mind-map edges and
/// their derived graph, the exam buffer and the chat history. At most one
/// external request is in flight; each `begin_*` call hands out a [`Ticket`]
/// and the matching `complete_*`/[`fail`](Self::fail) call consumes it.
/// Results only replace session state on confirmed success.
#[derive(Debug, Clone)]
pub struct StudySession {
    phase: StudyPhase,
    /// Phase to fall back to when a generate/exam request fails.
    resume_phase: StudyPhase,
    bundle: Option<StudyBundle>,
    edges: Vec<MindMapEdge>,
    graph: MindMapGraph,
    exam: Option<ExamSession>,
    chat: Vec<ChatMessage>,
    in_flight: Option<Ticket>,
    next_serial: u64,
    last_error: Option<String>,
    layout: LayoutConfig,
}

impl StudySession {
    pub fn new(layout: LayoutConfig) -> Self {
        Self {
            phase: StudyPhase::Idle,
            resume_phase: StudyPhase::Idle,
            bundle: None,
            edges: Vec::new(),
            graph: MindMapGraph::default(),
            exam: None,
            chat: Vec::new(),
            in_flight: None,
            next_serial: 0,
            last_error: None,
            layout,
        }
    }

    /// Re-opens a previously persisted bundle in the `Ready` phase.
    pub fn restore(bundle: StudyBundle, layout: LayoutConfig) -> Self {
        let mut session = Self::new(layout);
        session.install_bundle(bundle);
        session.phase = StudyPhase::Ready;
        session
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub fn phase(&self) -> StudyPhase {
        self.phase
    }

    pub fn bundle(&self) -> Option<&StudyBundle> {
        self.bundle.as_ref()
    }

    pub fn edges(&self) -> &[MindMapEdge] {
        &self.edges
    }

    pub fn graph(&self) -> &MindMapGraph {
        &self.graph
    }

    pub fn exam(&self) -> Option<&ExamSession> {
        self.exam.as_ref()
    }

    pub fn chat_history(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Grounding text for chat, derived from the current bundle.
    pub fn chat_context(&self) -> Option<String> {
        self.bundle.as_ref().map(chat_context)
    }

    // ============================================================================
    // Ticket handling
    // ============================================================================

    fn issue(&mut self, kind: RequestKind) -> Result<Ticket> {
        if let Some(current) = self.in_flight {
            return Err(StudyError::invalid_transition(
                format!("start {kind}"),
                format!("{} is in flight", current.kind),
            ));
        }
        self.next_serial += 1;
        let ticket = Ticket {
            serial: self.next_serial,
            kind,
        };
        self.in_flight = Some(ticket);
        debug!(kind = %kind, serial = ticket.serial, "[Session] Request started");
        Ok(ticket)
    }

    /// Consumes `ticket` if it is the one in flight.
    ///
    /// `Ok(false)` means the ticket was superseded and its result must be dropped.
    fn settle(&mut self, ticket: Ticket, kind: RequestKind) -> Result<bool> {
        if self.in_flight != Some(ticket) {
            info!(kind = %ticket.kind, "[Session] Discarding superseded result");
            return Ok(false);
        }
        if ticket.kind != kind {
            return Err(StudyError::internal(format!(
                "ticket for {} used to complete {kind}",
                ticket.kind
            )));
        }
        self.in_flight = None;
        Ok(true)
    }

    fn require_bundle(&self, action: &str) -> Result<&StudyBundle> {
        self.bundle
            .as_ref()
            .ok_or_else(|| StudyError::invalid_transition(action, "no study bundle is loaded"))
    }

    fn install_bundle(&mut self, bundle: StudyBundle) {
        self.edges = bundle.mind_map_edges.clone();
        self.graph = graph::build(&self.edges, &self.layout);
        self.bundle = Some(bundle);
    }

    // ============================================================================
    // Generation
    // ============================================================================

    /// Enters `Generating`. Refused while any request is in flight.
    pub fn begin_generation(&mut self) -> Result<Ticket> {
        if matches!(self.phase, StudyPhase::Generating | StudyPhase::Grading) {
            return Err(StudyError::invalid_transition("generate", self.phase));
        }
        let ticket = self.issue(RequestKind::Generate)?;
        self.resume_phase = self.phase;
        self.phase = StudyPhase::Generating;
        Ok(ticket)
    }

    /// Replaces the bundle, graph, exam and chat wholesale and enters `Ready`.
    pub fn complete_generation(&mut self, ticket: Ticket, bundle: StudyBundle) -> Result<bool> {
        if !self.settle(ticket, RequestKind::Generate)? {
            return Ok(false);
        }
        info!(title = %bundle.title, "[Session] Study bundle ready");
        self.install_bundle(bundle);
        self.exam = None;
        self.chat.clear();
        self.last_error = None;
        self.phase = StudyPhase::Ready;
        Ok(true)
    }

    // ============================================================================
    // Mind-map expansion
    // ============================================================================

    /// Starts expanding the node labelled `label`; the phase is unchanged.
    pub fn begin_expansion(&mut self, label: &str) -> Result<Ticket> {
        self.require_bundle("expand a node")?;
        if matches!(self.phase, StudyPhase::Generating | StudyPhase::Grading) {
            return Err(StudyError::invalid_transition("expand a node", self.phase));
        }
        if self.graph.node_for_label(label).is_none() {
            return Err(StudyError::not_found("mind-map node", label));
        }
        self.issue(RequestKind::Expand)
    }

    /// Merges the new edges and recomputes the graph.
    pub fn complete_expansion(&mut self, ticket: Ticket, new_edges: &[MindMapEdge]) -> Result<bool> {
        if !self.settle(ticket, RequestKind::Expand)? {
            return Ok(false);
        }
        let before = self.graph.nodes.len();
        self.edges = graph::merge_edges(&self.edges, new_edges);
        self.graph = graph::build(&self.edges, &self.layout);
        if let Some(bundle) = self.bundle.as_mut() {
            bundle.mind_map_edges = self.edges.clone();
        }
        info!(
            added_nodes = self.graph.nodes.len() - before,
            "[Session] Mind map expanded"
        );
        Ok(true)
    }

    // ============================================================================
    // Exam
    // ============================================================================

    /// Requests a fresh question set. Allowed once a bundle is displayed.
    pub fn begin_exam(&mut self) -> Result<Ticket> {
        self.require_bundle("start an exam")?;
        if !matches!(
            self.phase,
            StudyPhase::Ready | StudyPhase::ChatOpen | StudyPhase::ExamActive | StudyPhase::Graded
        ) {
            return Err(StudyError::invalid_transition("start an exam", self.phase));
        }
        let ticket = self.issue(RequestKind::StartExam)?;
        self.resume_phase = self.phase;
        Ok(ticket)
    }

    /// Installs a new exam with no answers and enters `ExamActive`.
    pub fn complete_exam(&mut self, ticket: Ticket, questions: Vec<ExamQuestion>) -> Result<bool> {
        if !self.settle(ticket, RequestKind::StartExam)? {
            return Ok(false);
        }
        info!(questions = questions.len(), "[Session] Exam started");
        self.exam = Some(ExamSession::new(questions));
        self.last_error = None;
        self.phase = StudyPhase::ExamActive;
        Ok(true)
    }

    pub fn submit_answer(&mut self, question_id: u32, answer: impl Into<String>) -> Result<()> {
        if self.phase != StudyPhase::ExamActive {
            return Err(StudyError::invalid_transition("answer a question", self.phase));
        }
        match self.exam.as_mut() {
            Some(exam) => exam.submit_answer(question_id, answer),
            None => Err(StudyError::internal("exam phase without an exam")),
        }
    }

    /// `ExamActive -> Grading`.
    pub fn begin_grading(&mut self) -> Result<Ticket> {
        if self.phase != StudyPhase::ExamActive {
            return Err(StudyError::invalid_transition("grade the exam", self.phase));
        }
        if self.exam.as_ref().is_none_or(|exam| exam.grading.is_some()) {
            return Err(StudyError::invalid_transition(
                "grade the exam",
                "there is no ungraded exam",
            ));
        }
        let ticket = self.issue(RequestKind::Grade)?;
        self.phase = StudyPhase::Grading;
        Ok(ticket)
    }

    /// `Grading -> Graded`, storing the one grading result.
    pub fn complete_grading(&mut self, ticket: Ticket, grading: Grading) -> Result<bool> {
        if !self.settle(ticket, RequestKind::Grade)? {
            return Ok(false);
        }
        let Some(exam) = self.exam.as_mut() else {
            return Err(StudyError::internal("grading without an exam"));
        };
        info!(score = grading.score, "[Session] Exam graded");
        exam.grading = Some(grading);
        self.last_error = None;
        self.phase = StudyPhase::Graded;
        Ok(true)
    }

    /// `Graded -> ExamActive`: same questions, answers and grading cleared.
    pub fn retake(&mut self) -> Result<()> {
        if self.phase != StudyPhase::Graded {
            return Err(StudyError::invalid_transition("retake the exam", self.phase));
        }
        if let Some(exam) = self.exam.as_mut() {
            exam.clear_attempt();
        }
        self.phase = StudyPhase::ExamActive;
        Ok(())
    }

    // ============================================================================
    // Chat
    // ============================================================================

    pub fn open_chat(&mut self) -> Result<()> {
        match self.phase {
            StudyPhase::Ready | StudyPhase::ChatOpen => {
                self.phase = StudyPhase::ChatOpen;
                Ok(())
            }
            other => Err(StudyError::invalid_transition("open chat", other)),
        }
    }

    pub fn close_chat(&mut self) -> Result<()> {
        match self.phase {
            StudyPhase::ChatOpen | StudyPhase::Ready => {
                self.phase = StudyPhase::Ready;
                Ok(())
            }
            other => Err(StudyError::invalid_transition("close chat", other)),
        }
    }

    /// Appends the user's message and starts a chat request.
    pub fn begin_chat(&mut self, message: impl Into<String>) -> Result<Ticket> {
        if self.phase != StudyPhase::ChatOpen {
            return Err(StudyError::invalid_transition("send a chat message", self.phase));
        }
        let message = message.into();
        if message.trim().is_empty() {
            return Err(StudyError::invalid_input("chat message is empty"));
        }
        let ticket = self.issue(RequestKind::Chat)?;
        self.chat.push(ChatMessage::user(message));
        Ok(ticket)
    }

    pub fn complete_chat(&mut self, ticket: Ticket, reply: impl Into<String>) -> Result<bool> {
        if !self.settle(ticket, RequestKind::Chat)? {
            return Ok(false);
        }
        self.chat.push(ChatMessage::ai(reply));
        Ok(true)
    }

    // ============================================================================
    // Failure and reset
    // ============================================================================

    /// Releases the in-flight gate after a failed request and returns to a
    /// stable phase: the phase the request started from for generate/exam,
    /// `ExamActive` without grading for grade, unchanged otherwise. A failed
    /// chat also drops the unanswered user message.
    pub fn fail(&mut self, ticket: Ticket, error: &StudyError) -> bool {
        if self.in_flight != Some(ticket) {
            return false;
        }
        self.in_flight = None;
        warn!(kind = %ticket.kind, error = %error, "[Session] Request failed");
        match ticket.kind {
            RequestKind::Generate | RequestKind::StartExam => self.phase = self.resume_phase,
            RequestKind::Grade => {
                if let Some(exam) = self.exam.as_mut() {
                    exam.grading = None;
                }
                self.phase = StudyPhase::ExamActive;
            }
            RequestKind::Chat => {
                if self.chat.last().is_some_and(|m| m.role == ChatRole::User) {
                    self.chat.pop();
                }
            }
            RequestKind::Expand => {}
        }
        self.last_error = Some(error.to_string());
        true
    }

    /// Clears bundle, graph, exam and chat atomically and returns to `Idle`.
    ///
    /// Any request still in flight is superseded; its result will be dropped.
    pub fn reset(&mut self) {
        if let Some(ticket) = self.in_flight.take() {
            info!(kind = %ticket.kind, "[Session] Reset supersedes in-flight request");
        }
        self.phase = StudyPhase::Idle;
        self.resume_phase = StudyPhase::Idle;
        self.bundle = None;
        self.edges.clear();
        self.graph = MindMapGraph::default();
        self.exam = None;
        self.chat.clear();
        self.last_error = None;
    }
}

impl Default for StudySession {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}
