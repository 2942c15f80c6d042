use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::LLMConfig;
use crate::embeddings::{Embedder, HashingEmbedder, OpenAIEmbedder};
use crate::llm::openai::OpenAIAdapter;
use crate::types::{AppError, AppResult, LLMProvider, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Configuration for LLM provider (named to avoid conflict with the LLMProvider enum in types.rs)
pub struct LLMProviderConfig {
    pub name: String,
    pub api_key: String,
    pub base_url: Option<String>,
}

pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
    provider_name: String,
}

impl LLM {
    pub fn new(provider: LLMProviderConfig) -> AppResult<Self> {
        let kind = LLMProvider::from_id(&provider.name)
            .ok_or_else(|| AppError::InvalidRequest(format!("Unsupported provider: {}", provider.name)))?;
        let base_url = provider
            .base_url
            .as_deref()
            .unwrap_or_else(|| kind.default_base_url());

        Ok(Self {
            adapter: Box::new(OpenAIAdapter::with_base_url(&provider.api_key, base_url)),
            provider_name: provider.name,
        })
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }
}

#[async_trait]
impl LLMAdapter for LLM {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        debug!(provider = %self.provider_name, model = %request.model, "Sending chat completion");
        self.adapter.create_chat_completion(request).await
    }
}

/// Source of model clients for a given credential.
///
/// Sessions hold their own credential, so adapters are built per request rather than
/// once at startup.
pub trait ModelBackend: Send + Sync {
    fn chat(&self, api_key: &str) -> AppResult<Arc<dyn LLMAdapter>>;

    /// Embedder for indexing; without a credential a local fallback is returned
    fn embedder(&self, api_key: Option<&str>) -> Arc<dyn Embedder>;
}

/// Backend talking to the configured OpenAI-compatible provider
pub struct ProviderBackend {
    config: LLMConfig,
}

impl ProviderBackend {
    pub fn new(config: LLMConfig) -> Self {
        Self { config }
    }

    fn base_url(&self) -> String {
        self.config.base_url.clone().unwrap_or_else(|| {
            LLMProvider::from_id(&self.config.default_provider)
                .unwrap_or(LLMProvider::OpenAI)
                .default_base_url()
                .to_string()
        })
    }
}

impl ModelBackend for ProviderBackend {
    fn chat(&self, api_key: &str) -> AppResult<Arc<dyn LLMAdapter>> {
        let llm = LLM::new(LLMProviderConfig {
            name: self.config.default_provider.clone(),
            api_key: api_key.to_string(),
            base_url: self.config.base_url.clone(),
        })?;
        Ok(Arc::new(llm))
    }

    fn embedder(&self, api_key: Option<&str>) -> Arc<dyn Embedder> {
        match api_key {
            Some(key) => Arc::new(OpenAIEmbedder::new(
                key,
                &self.base_url(),
                &self.config.embedding_model,
            )),
            None => {
                warn!("No API key available, indexing with the local hashing embedder");
                Arc::new(HashingEmbedder::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_unknown_provider_is_an_error() {
        let result = LLM::new(LLMProviderConfig {
            name: "carrier-pigeon".to_string(),
            api_key: "key".to_string(),
            base_url: None,
        });
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn test_known_providers_build() {
        for name in ["openai", "openrouter", "groq"] {
            let llm = LLM::new(LLMProviderConfig {
                name: name.to_string(),
                api_key: "key".to_string(),
                base_url: None,
            })
            .unwrap();
            assert_eq!(llm.provider_name(), name);
        }
    }

    #[test]
    fn test_backend_base_url_follows_provider() {
        let mut config = Config::defaults().llm;
        config.default_provider = "groq".to_string();
        assert_eq!(ProviderBackend::new(config.clone()).base_url(), "https://api.groq.com/openai/v1");

        config.base_url = Some("http://localhost:11434/v1".to_string());
        assert_eq!(ProviderBackend::new(config).base_url(), "http://localhost:11434/v1");
    }
}
