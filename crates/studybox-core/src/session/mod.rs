//! Session/Exam state machine and the chat context derived from it.

mod chat_context;
mod phase;
mod study_session;

pub use chat_context::chat_context;
pub use phase::{RequestKind, StudyPhase, Ticket};
pub use study_session::StudySession;
