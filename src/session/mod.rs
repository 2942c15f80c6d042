//! Session State
//!
//! Each browser session (or CLI run) owns its credential, knowledge base, processed
//! document names and the agent team built over that knowledge base. Sessions never
//! share mutable state.

pub mod ingest;

pub use ingest::{ingest_document, IngestOutcome, IngestReport, Verification};

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;
use uuid::Uuid;

use crate::agents::{AgentTeam, ModelSettings};
use crate::analysis::{resolve_query, AnalysisReport, AnalysisType, Orchestrator};
use crate::config::Config;
use crate::embeddings::KnowledgeBase;
use crate::llm::ModelBackend;
use crate::search::WebSearch;
use crate::types::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A line of feedback for the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusMessage {
    pub level: MessageLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self { level: MessageLevel::Success, text: text.into() }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self { level: MessageLevel::Info, text: text.into() }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self { level: MessageLevel::Warning, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { level: MessageLevel::Error, text: text.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentDetails {
    pub filename: String,
    pub size_bytes: usize,
    pub page_count: Option<usize>,
    pub preview: Option<String>,
    pub chunk_count: usize,
    pub uploaded_at: DateTime<Utc>,
}

/// Collaborators shared by every session
pub struct SessionDeps<'a> {
    pub backend: &'a dyn ModelBackend,
    pub config: &'a Config,
    pub web_search: Option<Arc<dyn WebSearch>>,
}

#[derive(Default)]
pub struct SessionState {
    pub knowledge_base: Option<Arc<dyn KnowledgeBase>>,
    pub processed_documents: BTreeSet<String>,
    pub documents: Vec<DocumentDetails>,
    pub team: Option<Arc<AgentTeam>>,
    pub api_key: Option<String>,
}

impl SessionState {
    /// The session's own key, else the process-wide fallback
    pub fn effective_api_key(&self, fallback: Option<&str>) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| fallback.map(str::to_string))
            .filter(|k| !k.trim().is_empty())
    }

    /// Store (or with an empty key, clear) the session credential
    pub fn set_api_key(&mut self, key: &str, fallback: Option<&str>) -> StatusMessage {
        let key = key.trim();
        self.api_key = if key.is_empty() { None } else { Some(key.to_string()) };
        self.credential_status(fallback)
    }

    pub fn credential_status(&self, fallback: Option<&str>) -> StatusMessage {
        if self.effective_api_key(fallback).is_some() {
            StatusMessage::success("✅ OpenAI API key configured successfully!")
        } else {
            StatusMessage::warning(format!("⚠️ {}", AppError::MissingCredential))
        }
    }

    pub fn knowledge_status(&self) -> Vec<StatusMessage> {
        if self.knowledge_base.is_some() {
            let names: Vec<&str> = self.processed_documents.iter().map(String::as_str).collect();
            vec![
                StatusMessage::success(format!(
                    "✅ Knowledge Base Ready! {} document(s) loaded",
                    self.processed_documents.len()
                )),
                StatusMessage::info(format!("📚 Available Documents: {}", names.join(", "))),
            ]
        } else {
            vec![
                StatusMessage::warning("⚠️ Please upload a PDF document to begin analysis"),
                StatusMessage::info(
                    "The AI Legal Team will analyze your document once it's uploaded and processed.",
                ),
            ]
        }
    }

    pub async fn snapshot(&self, id: Uuid, fallback: Option<&str>) -> SessionSnapshot {
        let chunk_count = match &self.knowledge_base {
            Some(kb) => Some(kb.chunk_count().await),
            None => None,
        };
        let mut messages = vec![self.credential_status(fallback)];
        messages.extend(self.knowledge_status());

        SessionSnapshot {
            session_id: id,
            credential_configured: self.effective_api_key(fallback).is_some(),
            knowledge_base_ready: self.knowledge_base.is_some(),
            chunk_count,
            processed_documents: self.processed_documents.iter().cloned().collect(),
            documents: self.documents.clone(),
            messages,
        }
    }
}

/// Read-only view of a session for the API
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub credential_configured: bool,
    pub knowledge_base_ready: bool,
    pub chunk_count: Option<usize>,
    pub processed_documents: Vec<String>,
    pub documents: Vec<DocumentDetails>,
    pub messages: Vec<StatusMessage>,
}

pub type SessionHandle = Arc<Mutex<SessionState>>;

struct SessionEntry {
    handle: SessionHandle,
    last_seen: Instant,
}

/// Registry of live sessions.
///
/// Entries are dropped once idle for longer than the configured timeout, which also
/// releases their knowledge base and its temp file.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> (Uuid, SessionHandle) {
        let id = Uuid::new_v4();
        let handle: SessionHandle = Arc::new(Mutex::new(SessionState::default()));
        let mut guard = self.inner.write().await;
        guard.insert(id, SessionEntry { handle: handle.clone(), last_seen: Instant::now() });
        info!(session_id = %id, sessions = guard.len(), "Session created");
        (id, handle)
    }

    /// Look up a session and mark it as recently used
    pub async fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        let mut guard = self.inner.write().await;
        guard.get_mut(id).map(|entry| {
            entry.last_seen = Instant::now();
            entry.handle.clone()
        })
    }

    /// Drop every session not seen within `ttl`; returns how many were removed
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut guard = self.inner.write().await;
        let before = guard.len();
        guard.retain(|_, entry| entry.last_seen.elapsed() < ttl);
        let evicted = before - guard.len();
        if evicted > 0 {
            info!(evicted, sessions = guard.len(), "Evicted idle sessions");
        }
        evicted
    }

    /// Periodically evict idle sessions until the runtime shuts down
    pub fn spawn_sweeper(&self, ttl: Duration, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                store.evict_idle(ttl).await;
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

/// Run one analysis request against a session.
///
/// Checks run in order: blank custom query, missing team, missing credential. The
/// session lock is released before any model call.
pub async fn run_analysis(
    session: &SessionHandle,
    analysis_type: AnalysisType,
    custom_query: Option<&str>,
    deps: &SessionDeps<'_>,
) -> AppResult<AnalysisReport> {
    let query = resolve_query(analysis_type, custom_query)?;

    let fallback = deps.config.llm.active_api_key();
    let (team, api_key) = {
        let state = session.lock().await;
        (state.team.clone(), state.effective_api_key(fallback.as_deref()))
    };
    let team = team.ok_or(AppError::AgentsNotInitialized)?;
    let api_key = api_key.ok_or(AppError::MissingCredential)?;

    let llm = deps.backend.chat(&api_key)?;
    let settings = ModelSettings::from_config(deps.config);
    let orchestrator = Orchestrator::new(llm.as_ref(), &settings, &deps.config.analysis);
    orchestrator
        .run_full_analysis(Some(team.as_ref()), analysis_type, &query)
        .await
}
