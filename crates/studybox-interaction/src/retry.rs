//! Retry Orchestrator.
//!
//! Sequential, fixed-interval retries around a [`TextGenerator`]:
//! - the configured busy status sleeps `busy_delay` and retries,
//! - any other failure (including an empty reply) retries without delay,
//! - statuses listed in `fail_fast_statuses` stop immediately with `ProviderError`,
//! - an exhausted budget ends with `ServiceUnavailable`.

use std::sync::Arc;
use studybox_core::config::{GenerationConfig, MalformedPolicy};
use studybox_core::error::{Result, StudyError};
use studybox_core::provider::{PromptParts, ProviderFailure, TextGenerator};
use tracing::{info, warn};

pub struct RetryOrchestrator {
    generator: Arc<dyn TextGenerator>,
    policy: GenerationConfig,
}

impl RetryOrchestrator {
    pub fn new(generator: Arc<dyn TextGenerator>, policy: GenerationConfig) -> Self {
        Self { generator, policy }
    }

    pub fn policy(&self) -> &GenerationConfig {
        &self.policy
    }

    /// Maps one provider failure onto the error taxonomy.
    pub fn classify(&self, failure: &ProviderFailure) -> StudyError {
        match failure {
            ProviderFailure::Status {
                status_code,
                message,
            } if *status_code == self.policy.busy_status => {
                StudyError::ProviderTransient(format!("status {status_code}: {message}"))
            }
            ProviderFailure::Status {
                status_code,
                message,
            } if self.policy.fail_fast_statuses.contains(status_code) => StudyError::ProviderError {
                status_code: *status_code,
                message: message.clone(),
            },
            other => StudyError::ProviderTerminal(other.to_string()),
        }
    }

    /// Returns the raw reply text of the first successful attempt.
    pub async fn execute(&self, prompt: &PromptParts, model: &str) -> Result<String> {
        self.execute_parsed(prompt, model, |raw| Ok(raw.to_string()))
            .await
    }

    /// Like [`execute`](Self::execute), but also runs `parse` on each reply.
    ///
    /// A `MalformedResponse` from `parse` fails immediately under
    /// `MalformedPolicy::FailFast`; under `Retry` it consumes an attempt and is
    /// returned as-is when it happens on the last one. Other parse errors are
    /// returned unchanged.
    pub async fn execute_parsed<T, F>(&self, prompt: &PromptParts, model: &str, parse: F) -> Result<T>
    where
        F: Fn(&str) -> Result<T> + Send + Sync,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            let outcome = match self.generator.generate(model, prompt).await {
                Ok(raw) if raw.trim().is_empty() => Err(ProviderFailure::EmptyReply),
                other => other,
            };

            match outcome {
                Ok(raw) => match parse(&raw) {
                    Ok(value) => {
                        if attempt > 1 {
                            info!(attempt, model, "[Retry] Succeeded after retry");
                        }
                        return Ok(value);
                    }
                    Err(err)
                        if err.is_malformed()
                            && self.policy.malformed_policy == MalformedPolicy::Retry
                            && attempt < max_attempts =>
                    {
                        warn!(attempt, max_attempts, error = %err, "[Retry] Malformed reply, asking again");
                        last_error = err.to_string();
                    }
                    Err(err) => return Err(err),
                },
                Err(failure) => {
                    let error = self.classify(&failure);
                    if matches!(error, StudyError::ProviderError { .. }) {
                        warn!(attempt, error = %error, "[Retry] Non-retryable provider failure");
                        return Err(error);
                    }
                    warn!(attempt, max_attempts, error = %error, "[Retry] Attempt failed");
                    let busy = matches!(error, StudyError::ProviderTransient(_));
                    last_error = error.to_string();
                    if busy && attempt < max_attempts {
                        tokio::time::sleep(self.policy.busy_delay()).await;
                    }
                }
            }
        }

        Err(StudyError::ServiceUnavailable {
            attempts: max_attempts,
            last_error,
        })
    }
}
