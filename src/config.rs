use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

use crate::types::LLMProvider;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub knowledge: KnowledgeConfig,
    pub search: SearchConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    /// Sessions untouched for this long are dropped along with their documents
    pub session_idle_secs: u64,
    pub session_sweep_secs: u64,
}

impl ServerConfig {
    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_secs.max(1))
    }
}

#[derive(Clone)]
pub struct LLMConfig {
    /// Fallback credential used when a session has not supplied its own
    pub openai_api_key: String,
    pub default_provider: String,
    pub default_model: String,
    pub base_url: Option<String>,
    pub embedding_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

// Keys are never printed.
impl std::fmt::Debug for LLMConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LLMConfig")
            .field("openai_api_key", &if self.openai_api_key.is_empty() { "<unset>" } else { "<set>" })
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("base_url", &self.base_url)
            .field("embedding_model", &self.embedding_model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl LLMConfig {
    /// The configured fallback key, if any
    pub fn active_api_key(&self) -> Option<String> {
        let key = self.openai_api_key.trim();
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    pub default_chunk_size: usize,
    pub default_overlap: usize,
    /// Number of chunks returned per knowledge-base search
    pub search_limit: usize,
    pub max_upload_bytes: usize,
}

#[derive(Clone)]
pub struct SearchConfig {
    pub serpapi_key: String,
    pub max_results: usize,
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("serpapi_key", &if self.serpapi_key.is_empty() { "<unset>" } else { "<set>" })
            .field("max_results", &self.max_results)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Run the three specialists concurrently instead of one after another
    pub parallel_specialists: bool,
    pub specialist_excerpt_chars: usize,
    pub summary_excerpt_chars: usize,
    pub max_tool_rounds: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            parallel_specialists: false,
            specialist_excerpt_chars: 500,
            summary_excerpt_chars: 300,
            max_tool_rounds: 4,
        }
    }
}

fn var_or<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {}", key))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            server: ServerConfig {
                port: var_or("PORT", "3000")?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                session_idle_secs: var_or("SESSION_IDLE_SECS", "3600")?,
                session_sweep_secs: var_or("SESSION_SWEEP_SECS", "60")?,
            },
            llm: LLMConfig {
                openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
                default_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string()),
                default_model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                base_url: env::var("LLM_BASE_URL").ok().filter(|s| !s.trim().is_empty()),
                embedding_model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
                max_tokens: var_or("LLM_MAX_TOKENS", "2048")?,
                temperature: var_or("LLM_TEMPERATURE", "0.3")?,
            },
            knowledge: KnowledgeConfig {
                default_chunk_size: var_or("DEFAULT_CHUNK_SIZE", "1000")?,
                default_overlap: var_or("DEFAULT_CHUNK_OVERLAP", "200")?,
                search_limit: var_or("KNOWLEDGE_SEARCH_LIMIT", "5")?,
                max_upload_bytes: var_or("MAX_UPLOAD_BYTES", "26214400")?,
            },
            search: SearchConfig {
                serpapi_key: env::var("SERPAPI_KEY").unwrap_or_default(),
                max_results: var_or("WEB_SEARCH_MAX_RESULTS", "5")?,
            },
            analysis: AnalysisConfig {
                parallel_specialists: var_or("ANALYSIS_PARALLEL_SPECIALISTS", "false")?,
                specialist_excerpt_chars: var_or("SPECIALIST_EXCERPT_CHARS", "500")?,
                summary_excerpt_chars: var_or("SUMMARY_EXCERPT_CHARS", "300")?,
                max_tool_rounds: var_or("AGENT_MAX_TOOL_ROUNDS", "4")?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would only fail later, mid-request
    pub fn validate(&self) -> Result<()> {
        if LLMProvider::from_id(&self.llm.default_provider).is_none() {
            bail!(
                "Unsupported LLM_PROVIDER '{}' (expected openai, openrouter or groq)",
                self.llm.default_provider
            );
        }
        if self.knowledge.max_upload_bytes == 0 {
            bail!("MAX_UPLOAD_BYTES must be greater than zero");
        }
        Ok(())
    }

    /// Configuration with every default applied and no credentials, for tests and tooling
    pub fn defaults() -> Self {
        Self {
            server: ServerConfig {
                port: 3000,
                host: "127.0.0.1".to_string(),
                cors_allowed_origins: vec!["http://localhost:3000".to_string()],
                session_idle_secs: 3600,
                session_sweep_secs: 60,
            },
            llm: LLMConfig {
                openai_api_key: String::new(),
                default_provider: "openai".to_string(),
                default_model: "gpt-4o-mini".to_string(),
                base_url: None,
                embedding_model: "text-embedding-3-small".to_string(),
                max_tokens: 2048,
                temperature: 0.3,
            },
            knowledge: KnowledgeConfig {
                default_chunk_size: 1000,
                default_overlap: 200,
                search_limit: 5,
                max_upload_bytes: 25 * 1024 * 1024,
            },
            search: SearchConfig {
                serpapi_key: String::new(),
                max_results: 5,
            },
            analysis: AnalysisConfig::default(),
        }
    }
}
