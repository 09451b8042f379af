//! Generation requests and user settings.

use crate::exam::ExamQuestion;
use crate::transcript::TranscriptSegment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// The four actions sharing the Generate endpoint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    #[default]
    Generate,
    Expand,
    Exam,
    Grade,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// User preferences that travel with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub language: String,
    pub difficulty: Difficulty,
    /// Playback speed for read-aloud; persisted only.
    pub voice_speed: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "English".to_string(),
            difficulty: Difficulty::Medium,
            voice_speed: 1.0,
        }
    }
}

/// Material the default `generate` action summarizes.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceMaterial {
    /// Free text typed by the user.
    Text(String),
    /// Text extracted from an uploaded document.
    Document { text: String },
    /// An uploaded image passed through as visual content.
    Image { mime_type: String, data: Vec<u8> },
    /// Caption track of a video.
    Transcript(Vec<TranscriptSegment>),
}

/// A user action ready to be compiled into a prompt.
///
/// Immutable once built; the dispatcher consumes it by reference.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest {
    Generate {
        topic: String,
        source: SourceMaterial,
        settings: Settings,
    },
    Expand {
        node_label: String,
        context: String,
        settings: Settings,
    },
    Exam {
        context: String,
        settings: Settings,
    },
    Grade {
        context: String,
        questions: Vec<ExamQuestion>,
        answers: BTreeMap<u32, String>,
        settings: Settings,
    },
}

impl GenerationRequest {
    pub fn action(&self) -> Action {
        match self {
            Self::Generate { .. } => Action::Generate,
            Self::Expand { .. } => Action::Expand,
            Self::Exam { .. } => Action::Exam,
            Self::Grade { .. } => Action::Grade,
        }
    }

    pub fn settings(&self) -> &Settings {
        match self {
            Self::Generate { settings, .. }
            | Self::Expand { settings, .. }
            | Self::Exam { settings, .. }
            | Self::Grade { settings, .. } => settings,
        }
    }
}

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatRole {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Ai,
            content: content.into(),
        }
    }
}

/// A grounded chat turn: the history plus the derived study context.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub context: String,
    pub settings: Settings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_action_parsing() {
        assert_eq!(Action::from_str("expand").unwrap(), Action::Expand);
        assert_eq!(Action::Grade.to_string(), "grade");
        assert!(Action::from_str("summarize").is_err());
    }

    #[test]
    fn test_settings_defaults_from_partial_json() {
        let settings: Settings = serde_json::from_str(r#"{"difficulty":"hard"}"#).unwrap();
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert_eq!(settings.language, "English");
        assert_eq!(settings.voice_speed, 1.0);
    }

    #[test]
    fn test_difficulty_is_case_insensitive() {
        assert_eq!(Difficulty::from_str("HARD").unwrap(), Difficulty::Hard);
    }
}
