//! Error types for studybox.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the whole studybox workspace.
///
/// Variants follow the failure taxonomy of the generation pipeline: bad user
/// input, provider failures (transient, terminal, exhausted), malformed
/// replies, and illegal session transitions, plus the usual storage and
/// configuration failures.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StudyError {
    /// The user supplied something unusable (empty topic, bad video link, empty document).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No API key is configured for the provider.
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// The provider reported it is temporarily busy.
    #[error("Provider busy: {0}")]
    ProviderTransient(String),

    /// The provider failed with a non-busy status or returned an empty reply.
    #[error("Provider failure: {0}")]
    ProviderTerminal(String),

    /// Every attempt of the retry budget failed.
    #[error("Service unavailable after {attempts} attempts: {last_error}")]
    ServiceUnavailable { attempts: u32, last_error: String },

    /// The provider rejected the request in a way retrying cannot fix.
    #[error("Provider error ({status_code}): {message}")]
    ProviderError { status_code: u16, message: String },

    /// The reply could not be parsed into the expected JSON contract.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The session state machine refused a transition.
    #[error("Invalid transition: cannot {action} while {state}")]
    InvalidTransition { action: String, state: String },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", "template"
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StudyError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates a MalformedResponse error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Creates an InvalidTransition error
    pub fn invalid_transition(action: impl Into<String>, state: impl std::fmt::Display) -> Self {
        Self::InvalidTransition {
            action: action.into(),
            state: state.to_string(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse(_))
    }

    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable { .. })
    }

    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }

    /// HTTP status used when the error leaves the Generate/Chat endpoints.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::MissingCredential(_) => 401,
            Self::ServiceUnavailable { .. } => 503,
            _ => 500,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for StudyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for StudyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for StudyError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for StudyError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<minijinja::Error> for StudyError {
    fn from(err: minijinja::Error) -> Self {
        Self::Serialization {
            format: "template".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, StudyError>`.
pub type Result<T> = std::result::Result<T, StudyError>;
