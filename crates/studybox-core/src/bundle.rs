//! The study bundle produced by the default `generate` action.

use crate::error::{Result, StudyError};
use serde::{Deserialize, Serialize};

/// A directed concept relationship, expressed with raw labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MindMapEdge {
    pub source: String,
    pub target: String,
}

impl MindMapEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<String>,
    pub correct_option: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyStats {
    pub accuracy: String,
    pub time_saved: String,
}

/// Summary, key points, quiz, flashcards and mind-map edges for one topic.
///
/// Built atomically from one successful generation; use [`StudyBundle::validate`]
/// before handing one to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyBundle {
    pub title: String,
    /// Markdown.
    pub summary: String,
    pub key_points: Vec<String>,
    pub quiz: Vec<QuizItem>,
    pub flashcards: Vec<Flashcard>,
    pub mind_map_edges: Vec<MindMapEdge>,
    pub stats: StudyStats,
}

impl StudyBundle {
    /// Checks the structural invariants the provider is asked to honor.
    ///
    /// Every quiz item needs at least two options and a correct option that is
    /// one of them; mind-map labels must be non-blank.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(StudyError::malformed("study bundle has an empty title"));
        }
        for (index, item) in self.quiz.iter().enumerate() {
            if item.options.len() < 2 {
                return Err(StudyError::malformed(format!(
                    "quiz item {} has {} option(s), need at least 2",
                    index + 1,
                    item.options.len()
                )));
            }
            if !item.options.contains(&item.correct_option) {
                return Err(StudyError::malformed(format!(
                    "quiz item {}: correct option '{}' is not one of its options",
                    index + 1,
                    item.correct_option
                )));
            }
        }
        validate_edges(&self.mind_map_edges)
    }
}

/// Rejects edges with blank endpoints.
pub fn validate_edges(edges: &[MindMapEdge]) -> Result<()> {
    match edges
        .iter()
        .position(|edge| edge.source.trim().is_empty() || edge.target.trim().is_empty())
    {
        Some(index) => Err(StudyError::malformed(format!(
            "mind-map edge {} has a blank label",
            index + 1
        ))),
        None => Ok(()),
    }
}
