use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::AnalysisType;
use crate::config::Config;
use crate::llm::ModelBackend;
use crate::search::{SerpApiClient, WebSearch};
use crate::session::{SessionDeps, SessionStore, StatusMessage};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionStore,
    pub backend: Arc<dyn ModelBackend>,
    pub web_search: Option<Arc<dyn WebSearch>>,
}

impl AppState {
    /// Web search is enabled only when a SerpAPI key is configured
    pub fn new(config: Config, backend: Arc<dyn ModelBackend>) -> Self {
        let web_search = SerpApiClient::from_config(&config.search)
            .map(|client| Arc::new(client) as Arc<dyn WebSearch>);
        Self {
            config: Arc::new(config),
            sessions: SessionStore::new(),
            backend,
            web_search,
        }
    }

    pub fn deps(&self) -> SessionDeps<'_> {
        SessionDeps {
            backend: self.backend.as_ref(),
            config: self.config.as_ref(),
            web_search: self.web_search.clone(),
        }
    }

    pub fn fallback_api_key(&self) -> Option<String> {
        self.config.llm.active_api_key()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub sessions: usize,
    pub web_search: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub credential_configured: bool,
    pub messages: Vec<StatusMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CredentialsResponse {
    pub credential_configured: bool,
    pub messages: Vec<StatusMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub analysis_type: AnalysisType,
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisTypeInfo {
    pub id: AnalysisType,
    pub label: &'static str,
    pub preset_query: Option<&'static str>,
}

impl From<AnalysisType> for AnalysisTypeInfo {
    fn from(kind: AnalysisType) -> Self {
        Self {
            id: kind,
            label: kind.label(),
            preset_query: kind.preset_query(),
        }
    }
}
