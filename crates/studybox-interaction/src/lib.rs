//! Provider plumbing: the Gemini REST client, model discovery and retries.

pub mod gemini_client;
pub mod model_resolver;
pub mod retry;

pub use gemini_client::GeminiClient;
pub use model_resolver::ModelResolver;
pub use retry::RetryOrchestrator;
