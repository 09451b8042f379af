//! Application configuration model.
//!
//! Every field carries a default so a missing or partial `config.toml`
//! still yields a working configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do when the provider replies with something that is not the
/// expected JSON contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Surface `MalformedResponse` immediately.
    #[default]
    FailFast,
    /// Re-ask the provider; the malformed reply consumes an attempt.
    Retry,
}

/// Retry, model selection and reply handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_attempts: u32,
    pub busy_delay_ms: u64,
    /// Provider status code meaning "temporarily busy".
    pub busy_status: u16,
    /// Statuses that fail immediately instead of consuming the retry budget.
    pub fail_fast_statuses: Vec<u16>,
    pub malformed_policy: MalformedPolicy,
    pub default_model: String,
    /// Acceptable model families, most preferred first.
    pub model_families: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            busy_delay_ms: 2500,
            busy_status: 503,
            fail_fast_statuses: vec![401, 403],
            malformed_policy: MalformedPolicy::FailFast,
            default_model: DEFAULT_MODEL.to_string(),
            model_families: vec![
                "gemini-2.5-flash".to_string(),
                "gemini-2.0-flash".to_string(),
                "gemini-1.5-flash".to_string(),
            ],
        }
    }
}

impl GenerationConfig {
    pub fn busy_delay(&self) -> Duration {
        Duration::from_millis(self.busy_delay_ms)
    }
}

/// Model used when discovery fails.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Maximum characters of material sent per action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub generate_chars: usize,
    pub expand_chars: usize,
    pub exam_chars: usize,
    pub grade_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            generate_chars: 40_000,
            expand_chars: 3_000,
            exam_chars: 10_000,
            grade_chars: 5_000,
        }
    }
}

/// Node footprint and spacing for the hierarchical layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// Horizontal gap between neighbouring nodes of one rank.
    pub node_sep: f64,
    /// Vertical gap between ranks.
    pub rank_sep: f64,
    /// Barycenter sweeps used to reduce crossings.
    pub sweeps: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 172.0,
            node_height: 36.0,
            node_sep: 50.0,
            rank_sep: 70.0,
            sweeps: 4,
        }
    }
}

/// Root of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub generation: GenerationConfig,
    pub limits: LimitsConfig,
    pub layout: LayoutConfig,
}

/// Gemini credentials from `secret.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
}

/// Root of `secret.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<GeminiConfig>,
}
