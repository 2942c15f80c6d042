use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

use crate::analysis::{AnalysisReport, AnalysisType};
use crate::models::{AnalysisRequest, AnalysisTypeInfo, AppState};
use crate::routes::sessions::find_session;
use crate::session::run_analysis;
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/analysis-types", get(list_analysis_types))
        .route("/api/sessions/{id}/analysis", post(run_analysis_handler))
        .with_state(state)
}

async fn list_analysis_types() -> Json<Vec<AnalysisTypeInfo>> {
    Json(AnalysisType::ALL.into_iter().map(AnalysisTypeInfo::from).collect())
}

async fn run_analysis_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AnalysisRequest>,
) -> AppResult<Json<AnalysisReport>> {
    info!(session_id = %id, analysis_type = request.analysis_type.label(), "Analysis request received");

    let handle = find_session(&state, id).await?;
    let report = run_analysis(
        &handle,
        request.analysis_type,
        request.query.as_deref(),
        &state.deps(),
    )
    .await?;

    Ok(Json(report))
}
