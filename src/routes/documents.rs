use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::AppState;
use crate::routes::sessions::find_session;
use crate::session::{ingest_document, IngestReport};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions/{id}/documents", post(upload_document))
        .with_state(state)
}

struct Upload {
    filename: String,
    bytes: Bytes,
}

fn parse_number(field: &str, value: &str) -> AppResult<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidRequest(format!("{} must be a whole number", field)))
}

/// Oversized bodies surface while the multipart stream is read
fn multipart_error(e: MultipartError, max_upload: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(max_upload)
    } else {
        AppError::InvalidRequest(e.body_text())
    }
}

/// Browsers sometimes send PDFs as octet-stream; a missing type is accepted too
fn declared_as_pdf(content_type: Option<&str>) -> bool {
    match content_type.and_then(|ct| ct.parse::<mime::Mime>().ok()) {
        Some(declared) => {
            declared.essence_str() == mime::APPLICATION_PDF.essence_str()
                || declared == mime::APPLICATION_OCTET_STREAM
        }
        None => true,
    }
}

async fn upload_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<IngestReport>> {
    let handle = find_session(&state, id).await?;

    let mut upload: Option<Upload> = None;
    let mut chunk_size = state.config.knowledge.default_chunk_size;
    let mut overlap = state.config.knowledge.default_overlap;
    let max_upload = state.config.knowledge.max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_upload))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("document.pdf").to_string();
                if !declared_as_pdf(field.content_type()) {
                    // the content sniff in ingestion has the final say
                    warn!(filename = %filename, content_type = ?field.content_type(), "Upload not declared as PDF");
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max_upload))?;
                upload = Some(Upload { filename, bytes });
            }
            "chunk_size" | "overlap" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, max_upload))?;
                if name == "chunk_size" {
                    chunk_size = parse_number("chunk_size", &text)?;
                } else {
                    overlap = parse_number("overlap", &text)?;
                }
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| AppError::InvalidRequest("No file uploaded".to_string()))?;
    if upload.bytes.is_empty() {
        return Err(AppError::InvalidRequest(format!("{} is empty", upload.filename)));
    }
    info!(
        session_id = %id,
        filename = %upload.filename,
        size_bytes = upload.bytes.len(),
        "Document upload received"
    );

    let deps = state.deps();
    let mut session = handle.lock().await;
    let report = ingest_document(
        &mut session,
        &upload.filename,
        &upload.bytes,
        chunk_size,
        overlap,
        &deps,
    )
    .await?;

    Ok(Json(report))
}
