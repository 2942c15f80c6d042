//! API Routes
//!
//! - `/` - Single-page UI
//! - `/api/health` - Health check
//! - `/api/sessions` - Session lifecycle and credentials
//! - `/api/sessions/{id}/documents` - PDF upload and indexing
//! - `/api/sessions/{id}/analysis` - Team analysis
//! - `/api/analysis-types` - Available analysis presets

pub mod analysis;
pub mod documents;
pub mod health;
pub mod sessions;
pub mod ui;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::cors_layer;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let max_upload = state.config.knowledge.max_upload_bytes;
    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    Router::new()
        .merge(health::router(state.clone()))
        .merge(sessions::router(state.clone()))
        .merge(documents::router(state.clone()))
        .merge(analysis::router(state))
        .merge(ui::router())
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
