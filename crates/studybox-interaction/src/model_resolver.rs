//! Model Resolver.
//!
//! Picks a model id from the provider's live catalog, falling back to the
//! configured default on any failure. Never fails.

use std::sync::Arc;
use studybox_core::config::GenerationConfig;
use studybox_core::provider::{ModelCatalog, ModelDescriptor};
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Generation method a usable model must support.
pub const GENERATE_METHOD: &str = "generateContent";

pub struct ModelResolver {
    catalog: Arc<dyn ModelCatalog>,
    families: Vec<String>,
    default_model: String,
    /// Successful discoveries are cached for the lifetime of the resolver.
    resolved: OnceCell<String>,
}

impl ModelResolver {
    pub fn new(catalog: Arc<dyn ModelCatalog>, config: &GenerationConfig) -> Self {
        Self {
            catalog,
            families: config.model_families.clone(),
            default_model: config.default_model.clone(),
            resolved: OnceCell::new(),
        }
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub async fn resolve_model(&self) -> String {
        if let Some(model) = self.resolved.get() {
            return model.clone();
        }

        let models = match self.catalog.list_models().await {
            Ok(models) => models,
            Err(err) => {
                warn!(error = %err, fallback = %self.default_model, "[ModelResolver] Listing failed, using default");
                return self.default_model.clone();
            }
        };

        match select_model(&models, &self.families) {
            Some(model) => {
                info!(model = %model, "[ModelResolver] Resolved model");
                let _ = self.resolved.set(model.clone());
                model
            }
            None => {
                warn!(
                    listed = models.len(),
                    fallback = %self.default_model,
                    "[ModelResolver] No acceptable model listed, using default"
                );
                self.default_model.clone()
            }
        }
    }
}

/// First family (in preference order) with a listed model that supports
/// generation. An exact id match beats a versioned variant such as
/// `gemini-1.5-flash-002`.
pub fn select_model(models: &[ModelDescriptor], families: &[String]) -> Option<String> {
    let usable: Vec<&ModelDescriptor> = models
        .iter()
        .filter(|model| model.supports(GENERATE_METHOD))
        .collect();

    families.iter().find_map(|family| {
        let versioned = format!("{family}-");
        usable
            .iter()
            .find(|model| model.model_id() == family)
            .or_else(|| {
                usable
                    .iter()
                    .find(|model| model.model_id().starts_with(&versioned))
            })
            .map(|model| model.model_id().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use studybox_core::provider::ProviderFailure;

    struct FakeCatalog {
        reply: std::result::Result<Vec<ModelDescriptor>, ProviderFailure>,
        calls: AtomicU32,
    }

    impl FakeCatalog {
        fn new(reply: std::result::Result<Vec<ModelDescriptor>, ProviderFailure>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl ModelCatalog for FakeCatalog {
        async fn list_models(&self) -> std::result::Result<Vec<ModelDescriptor>, ProviderFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    fn model(name: &str, methods: &[&str]) -> ModelDescriptor {
        ModelDescriptor {
            name: format!("models/{name}"),
            supported_generation_methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    fn families() -> Vec<String> {
        GenerationConfig::default().model_families
    }

    #[test]
    fn test_select_prefers_family_order() {
        let models = vec![
            model("gemini-1.5-flash", &["generateContent"]),
            model("gemini-2.0-flash", &["generateContent"]),
        ];
        assert_eq!(
            select_model(&models, &families()).as_deref(),
            Some("gemini-2.0-flash")
        );
    }

    #[test]
    fn test_select_skips_models_without_generation() {
        let models = vec![
            model("gemini-2.5-flash", &["countTokens"]),
            model("gemini-1.5-flash-002", &["generateContent"]),
        ];
        assert_eq!(
            select_model(&models, &families()).as_deref(),
            Some("gemini-1.5-flash-002")
        );
    }

    #[test]
    fn test_select_nothing_acceptable() {
        let models = vec![model("text-embedding-004", &["embedContent"])];
        assert_eq!(select_model(&models, &families()), None);
    }

    #[tokio::test]
    async fn test_listing_failure_falls_back_to_default() {
        let catalog = FakeCatalog::new(Err(ProviderFailure::Transport("dns".into())));
        let resolver = ModelResolver::new(catalog.clone(), &GenerationConfig::default());
        assert_eq!(resolver.resolve_model().await, "gemini-2.5-flash");
        // Failures are not cached.
        resolver.resolve_model().await;
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_success_is_cached() {
        let catalog = FakeCatalog::new(Ok(vec![model("gemini-2.0-flash", &["generateContent"])]));
        let resolver = ModelResolver::new(catalog.clone(), &GenerationConfig::default());
        assert_eq!(resolver.resolve_model().await, "gemini-2.0-flash");
        assert_eq!(resolver.resolve_model().await, "gemini-2.0-flash");
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_listing_uses_default() {
        let catalog = FakeCatalog::new(Ok(Vec::new()));
        let config = GenerationConfig {
            default_model: "gemini-custom".into(),
            ..GenerationConfig::default()
        };
        let resolver = ModelResolver::new(catalog, &config);
        assert_eq!(resolver.resolve_model().await, "gemini-custom");
    }
}
