//! Provider-agnostic prompt representation and the generative-service seams.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who authored a block of prompt content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    Text(String),
    /// Binary content such as an uploaded image.
    InlineData { mime_type: String, data: Vec<u8> },
}

impl PromptPart {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::InlineData { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptContent {
    pub role: PromptRole,
    pub parts: Vec<PromptPart>,
}

/// A compiled prompt: system instruction plus ordered content blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptParts {
    pub system_instruction: String,
    pub contents: Vec<PromptContent>,
}

impl PromptParts {
    /// A single user turn.
    pub fn single(system_instruction: impl Into<String>, parts: Vec<PromptPart>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            contents: vec![PromptContent {
                role: PromptRole::User,
                parts,
            }],
        }
    }

    /// All text parts joined, mostly useful for logging and tests.
    pub fn text(&self) -> String {
        self.contents
            .iter()
            .flat_map(|content| content.parts.iter())
            .filter_map(PromptPart::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A single failed provider call, before retry classification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderFailure {
    /// Non-success HTTP status.
    #[error("status {status_code}: {message}")]
    Status { status_code: u16, message: String },
    /// Success status without any text in the reply.
    #[error("provider returned an empty reply")]
    EmptyReply,
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ProviderFailure {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

/// Turns a compiled prompt into raw reply text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        prompt: &PromptParts,
    ) -> std::result::Result<String, ProviderFailure>;
}

/// One entry of the provider's model listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    /// Provider name, e.g. `models/gemini-2.5-flash`.
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelDescriptor {
    /// The name without the `models/` prefix.
    pub fn model_id(&self) -> &str {
        self.name.strip_prefix("models/").unwrap_or(&self.name)
    }

    pub fn supports(&self, method: &str) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == method)
    }
}

/// Lists the models the provider currently offers.
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    async fn list_models(&self) -> std::result::Result<Vec<ModelDescriptor>, ProviderFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_descriptor_parsing() {
        let model: ModelDescriptor = serde_json::from_str(
            r#"{"name":"models/gemini-2.5-flash","supportedGenerationMethods":["generateContent","countTokens"]}"#,
        )
        .unwrap();
        assert_eq!(model.model_id(), "gemini-2.5-flash");
        assert!(model.supports("generateContent"));
        assert!(!model.supports("embedContent"));
    }

    #[test]
    fn test_prompt_text_skips_inline_data() {
        let prompt = PromptParts::single(
            "system",
            vec![
                PromptPart::Text("first".into()),
                PromptPart::InlineData {
                    mime_type: "image/png".into(),
                    data: vec![1, 2, 3],
                },
                PromptPart::Text("second".into()),
            ],
        );
        assert_eq!(prompt.text(), "first\nsecond");
    }
}
