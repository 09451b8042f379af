//! Generate and Chat endpoints.
//!
//! Wire DTOs in the JSON shapes clients send, and handlers that map every
//! failure to `{ "error": ... }` with an HTTP status.

use crate::generation_service::{GenerationService, SourceInput};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use studybox_core::bundle::{MindMapEdge, StudyBundle};
use studybox_core::error::{Result, StudyError};
use studybox_core::exam::{ExamQuestion, Grading};
use studybox_core::request::{Action, ChatMessage, ChatRequest, GenerationRequest, Settings};
use studybox_core::response::StructuredResult;

/// How the `topic` field is to be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Text,
    /// `topic` holds a video link.
    Youtube,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateApiRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default)]
    pub topic: String,
    /// Base64 file content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(rename = "type", default)]
    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answers: Option<BTreeMap<u32, String>>,
    /// The questions being graded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam: Option<Vec<ExamQuestion>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerateApiResponse {
    Expansion {
        #[serde(rename = "newEdges")]
        new_edges: Vec<MindMapEdge>,
    },
    Exam {
        exam: Vec<ExamQuestion>,
    },
    Grading(Grading),
    Bundle(StudyBundle),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatApiRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatApiResponse {
    pub reply: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A failed endpoint call: HTTP status plus the user-visible body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub body: ErrorBody,
}

impl From<StudyError> for ApiError {
    fn from(err: StudyError) -> Self {
        Self {
            status: err.http_status(),
            body: ErrorBody {
                error: err.to_string(),
            },
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.body.error, self.status)
    }
}

impl std::error::Error for ApiError {}

fn required(field: Option<String>, name: &str) -> Result<String> {
    field
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| StudyError::invalid_input(format!("'{name}' is required")))
}

fn decode_file(data: &str, mime_type: Option<String>) -> Result<SourceInput> {
    let data = BASE64_STANDARD
        .decode(data.trim())
        .map_err(|err| StudyError::invalid_input(format!("fileData is not valid base64: {err}")))?;
    let mime_type = mime_type
        .filter(|mime| !mime.trim().is_empty())
        .unwrap_or_else(|| "application/octet-stream".to_string());
    Ok(SourceInput::File { mime_type, data })
}

/// The Generate endpoint.
pub struct GenerateEndpoint {
    service: Arc<GenerationService>,
}

impl GenerateEndpoint {
    pub fn new(service: Arc<GenerationService>) -> Self {
        Self { service }
    }

    pub async fn handle(
        &self,
        request: GenerateApiRequest,
    ) -> std::result::Result<GenerateApiResponse, ApiError> {
        self.dispatch(request).await.map_err(ApiError::from)
    }

    /// Raw JSON in, `(status, JSON body)` out.
    pub async fn handle_json(&self, body: &str) -> (u16, serde_json::Value) {
        let request: GenerateApiRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(err) => {
                return error_json(ApiError::from(StudyError::invalid_input(format!(
                    "malformed request: {err}"
                ))));
            }
        };
        match self.handle(request).await {
            Ok(response) => to_json(&response),
            Err(err) => error_json(err),
        }
    }

    async fn dispatch(&self, request: GenerateApiRequest) -> Result<GenerateApiResponse> {
        let settings = request.settings.clone().unwrap_or_default();
        let generation = self.build_request(request, settings).await?;

        Ok(match self.service.generate(&generation).await? {
            StructuredResult::Bundle(bundle) => GenerateApiResponse::Bundle(bundle),
            StructuredResult::Expansion(new_edges) => GenerateApiResponse::Expansion { new_edges },
            StructuredResult::Exam(exam) => GenerateApiResponse::Exam { exam },
            StructuredResult::Grading(grading) => GenerateApiResponse::Grading(grading),
            StructuredResult::Text(_) => {
                return Err(StudyError::internal("generate produced a text reply"));
            }
        })
    }

    async fn build_request(
        &self,
        request: GenerateApiRequest,
        settings: Settings,
    ) -> Result<GenerationRequest> {
        match request.action.unwrap_or_default() {
            Action::Generate => {
                let input = match (&request.file_data, request.source_type) {
                    (_, SourceType::Youtube) => SourceInput::Video {
                        url: request.topic.clone(),
                    },
                    (Some(data), SourceType::Text) if !data.trim().is_empty() => {
                        decode_file(data, request.mime_type.clone())?
                    }
                    _ => SourceInput::Topic,
                };
                self.service
                    .prepare_generate(&request.topic, input, settings)
                    .await
            }
            Action::Expand => Ok(GenerationRequest::Expand {
                node_label: required(request.node_label, "nodeLabel")?,
                context: required(request.context, "context")?,
                settings,
            }),
            Action::Exam => Ok(GenerationRequest::Exam {
                context: required(request.context, "context")?,
                settings,
            }),
            Action::Grade => {
                let questions = request
                    .exam
                    .filter(|questions| !questions.is_empty())
                    .ok_or_else(|| StudyError::invalid_input("'exam' is required"))?;
                Ok(GenerationRequest::Grade {
                    context: required(request.context, "context")?,
                    questions,
                    answers: request.user_answers.unwrap_or_default(),
                    settings,
                })
            }
        }
    }
}

/// The Chat endpoint.
pub struct ChatEndpoint {
    service: Arc<GenerationService>,
}

impl ChatEndpoint {
    pub fn new(service: Arc<GenerationService>) -> Self {
        Self { service }
    }

    pub async fn handle(
        &self,
        request: ChatApiRequest,
    ) -> std::result::Result<ChatApiResponse, ApiError> {
        let request = ChatRequest {
            messages: request.messages,
            context: request.context,
            settings: request.settings.unwrap_or_default(),
        };
        self.service
            .chat(&request)
            .await
            .map(|reply| ChatApiResponse { reply })
            .map_err(ApiError::from)
    }

    pub async fn handle_json(&self, body: &str) -> (u16, serde_json::Value) {
        let request: ChatApiRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(err) => {
                return error_json(ApiError::from(StudyError::invalid_input(format!(
                    "malformed request: {err}"
                ))));
            }
        };
        match self.handle(request).await {
            Ok(response) => to_json(&response),
            Err(err) => error_json(err),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> (u16, serde_json::Value) {
    match serde_json::to_value(value) {
        Ok(json) => (200, json),
        Err(err) => error_json(ApiError::from(StudyError::from(err))),
    }
}

fn error_json(err: ApiError) -> (u16, serde_json::Value) {
    (
        err.status,
        serde_json::to_value(&err.body)
            .unwrap_or_else(|_| serde_json::json!({ "error": err.body.error })),
    )
}
