use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

use crate::models::{AppState, CreateSessionResponse, CredentialsRequest, CredentialsResponse};
use crate::session::{SessionHandle, SessionSnapshot};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session))
        .route("/api/sessions/{id}/credentials", post(set_credentials))
        .with_state(state)
}

/// Look up a session or fail with 404
pub(crate) async fn find_session(state: &AppState, id: Uuid) -> AppResult<SessionHandle> {
    state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("session {}", id)))
}

async fn create_session(State(state): State<AppState>) -> Json<CreateSessionResponse> {
    let (session_id, handle) = state.sessions.create().await;
    let fallback = state.fallback_api_key();
    let session = handle.lock().await;

    let mut messages = vec![session.credential_status(fallback.as_deref())];
    messages.extend(session.knowledge_status());

    Json(CreateSessionResponse {
        session_id,
        credential_configured: session.effective_api_key(fallback.as_deref()).is_some(),
        messages,
    })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionSnapshot>> {
    let handle = find_session(&state, id).await?;
    let fallback = state.fallback_api_key();
    let session = handle.lock().await;
    Ok(Json(session.snapshot(id, fallback.as_deref()).await))
}

async fn set_credentials(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CredentialsRequest>,
) -> AppResult<Json<CredentialsResponse>> {
    let handle = find_session(&state, id).await?;
    let fallback = state.fallback_api_key();
    let mut session = handle.lock().await;

    let status = session.set_api_key(&request.api_key, fallback.as_deref());
    info!(session_id = %id, configured = session.api_key.is_some(), "Session credential updated");

    Ok(Json(CredentialsResponse {
        credential_configured: session.effective_api_key(fallback.as_deref()).is_some(),
        messages: vec![status],
    }))
}
