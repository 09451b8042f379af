//! GeminiClient - Direct REST API implementation for Gemini.
//!
//! Implements [`TextGenerator`] (`models/{model}:generateContent`) and
//! [`ModelCatalog`] (`models`) over plain HTTPS. Classification of failures
//! into busy/terminal is left to the retry orchestrator.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use studybox_core::provider::{
    ModelCatalog, ModelDescriptor, PromptContent, PromptPart, PromptParts, PromptRole,
    ProviderFailure, TextGenerator,
};
use tracing::debug;

pub const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Points the client at another endpoint (proxies, local fakes).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn read_failure(response: reqwest::Response) -> ProviderFailure {
        let status = response.status();
        let body_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
        map_http_error(status, body_text)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, model: &str, prompt: &PromptParts) -> Result<String, ProviderFailure> {
        let url = format!("{}/models/{model}:generateContent", self.base_url);
        let body = build_request(prompt);
        debug!(model, contents = body.contents.len(), "[Gemini] generateContent");

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|err| ProviderFailure::Transport(format!("Gemini API request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(Self::read_failure(response).await);
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            ProviderFailure::Transport(format!("Failed to parse Gemini response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl ModelCatalog for GeminiClient {
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, ProviderFailure> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|err| ProviderFailure::Transport(format!("Gemini model listing failed: {err}")))?;

        if !response.status().is_success() {
            return Err(Self::read_failure(response).await);
        }

        let parsed: ListModelsResponse = response.json().await.map_err(|err| {
            ProviderFailure::Transport(format!("Failed to parse Gemini model listing: {err}"))
        })?;
        Ok(parsed.models)
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelDescriptor>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn role_name(role: PromptRole) -> &'static str {
    match role {
        PromptRole::User => "user",
        PromptRole::Model => "model",
    }
}

fn to_part(part: &PromptPart) -> Part {
    match part {
        PromptPart::Text(text) => Part::Text { text: text.clone() },
        PromptPart::InlineData { mime_type, data } => Part::InlineData {
            inline_data: InlineDataPayload {
                mime_type: mime_type.clone(),
                data: BASE64_STANDARD.encode(data),
            },
        },
    }
}

fn to_content(content: &PromptContent) -> Content {
    Content {
        role: Some(role_name(content.role)),
        parts: content.parts.iter().map(to_part).collect(),
    }
}

fn build_request(prompt: &PromptParts) -> GenerateContentRequest {
    let system_instruction = (!prompt.system_instruction.trim().is_empty()).then(|| Content {
        role: None,
        parts: vec![Part::Text {
            text: prompt.system_instruction.clone(),
        }],
    });

    GenerateContentRequest {
        contents: prompt.contents.iter().map(to_content).collect(),
        system_instruction,
    }
}

/// Concatenates the text parts of the first candidate.
fn extract_text_response(response: GenerateContentResponse) -> Result<String, ProviderFailure> {
    let text = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ProviderFailure::EmptyReply);
    }
    Ok(text)
}

fn map_http_error(status: StatusCode, body: String) -> ProviderFailure {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    ProviderFailure::Status {
        status_code: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let prompt = PromptParts::single(
            "Answer in JSON.",
            vec![
                PromptPart::Text("Read this page".into()),
                PromptPart::InlineData {
                    mime_type: "image/png".into(),
                    data: b"png".to_vec(),
                },
            ],
        );
        let body = serde_json::to_value(build_request(&prompt)).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"text": "Read this page"},
                        {"inlineData": {"mimeType": "image/png", "data": "cG5n"}}
                    ]
                }],
                "system_instruction": {"parts": [{"text": "Answer in JSON."}]}
            })
        );
    }

    #[test]
    fn test_model_turns_keep_their_role() {
        let prompt = PromptParts {
            system_instruction: String::new(),
            contents: vec![
                PromptContent {
                    role: PromptRole::User,
                    parts: vec![PromptPart::Text("hi".into())],
                },
                PromptContent {
                    role: PromptRole::Model,
                    parts: vec![PromptPart::Text("hello".into())],
                },
            ],
        };
        let body = serde_json::to_value(build_request(&prompt)).unwrap();
        assert_eq!(body["contents"][1]["role"], "model");
        assert!(body.get("system_instruction").is_none());
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}]
        }))
        .unwrap();
        assert_eq!(extract_text_response(response).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_missing_candidates_is_empty_reply() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": []})).unwrap();
        assert_eq!(
            extract_text_response(response).unwrap_err(),
            ProviderFailure::EmptyReply
        );

        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(
            extract_text_response(response).unwrap_err(),
            ProviderFailure::EmptyReply
        );
    }

    #[test]
    fn test_http_error_uses_error_body() {
        let body = json!({"error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}});
        let failure = map_http_error(StatusCode::SERVICE_UNAVAILABLE, body.to_string());
        assert_eq!(failure.status_code(), Some(503));
        assert_eq!(
            failure,
            ProviderFailure::Status {
                status_code: 503,
                message: "UNAVAILABLE: The model is overloaded.".into(),
            }
        );
    }

    #[test]
    fn test_http_error_with_plain_body() {
        let failure = map_http_error(StatusCode::FORBIDDEN, "denied".into());
        assert_eq!(
            failure,
            ProviderFailure::Status {
                status_code: 403,
                message: "denied".into(),
            }
        );
    }

    #[test]
    fn test_model_listing_parses() {
        let listing: ListModelsResponse = serde_json::from_value(json!({
            "models": [
                {"name": "models/gemini-2.5-flash", "supportedGenerationMethods": ["generateContent"]},
                {"name": "models/text-embedding-004", "supportedGenerationMethods": ["embedContent"]}
            ]
        }))
        .unwrap();
        assert_eq!(listing.models.len(), 2);
        assert_eq!(listing.models[0].model_id(), "gemini-2.5-flash");
    }

    #[test]
    fn test_base_url_override_trims_slash() {
        let client = GeminiClient::new("key").with_base_url("http://localhost:8080/v1beta/");
        assert_eq!(client.base_url, "http://localhost:8080/v1beta");
        assert!(!format!("{client:?}").contains("key"));
    }
}
