//! Session phase types.

use serde::{Deserialize, Serialize};
use strum::Display;

/// User-facing mode of a study session.
///
/// ```text
/// Idle -> Generating -> Ready <-> ChatOpen
/// Ready -> ExamActive -> Grading -> Graded -> ExamActive (retake)
/// any -> Idle (reset)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StudyPhase {
    #[default]
    Idle,
    Generating,
    Ready,
    ChatOpen,
    ExamActive,
    Grading,
    Graded,
}

/// Kind of external request a ticket was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RequestKind {
    Generate,
    Expand,
    StartExam,
    Grade,
    Chat,
}

/// Proof that the holder started the request currently in flight.
///
/// Completing or failing with a ticket that is no longer current (because
/// the session was reset meanwhile) is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub(crate) serial: u64,
    pub kind: RequestKind,
}
