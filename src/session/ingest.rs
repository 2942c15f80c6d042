// Document ingestion: PDF upload -> knowledge base -> agent team

use std::io::Write;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::agents::{AgentTeam, TeamOptions};
use crate::embeddings::{inspect_pdf, looks_like_pdf, DocumentChunking, KnowledgeBase, PdfKnowledgeBase};
use crate::session::{DocumentDetails, SessionDeps, SessionState, StatusMessage};
use crate::types::{AppError, AppResult};

/// Search term used to check that the fresh index answers queries
pub const VERIFICATION_QUERY: &str = "test";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum Verification {
    Verified(usize),
    Empty,
    Failed(String),
}

impl Verification {
    fn message(&self) -> StatusMessage {
        match self {
            Verification::Verified(n) => {
                StatusMessage::success(format!("✅ Knowledge base verified with {} searchable chunks", n))
            }
            Verification::Empty => {
                StatusMessage::warning("⚠️ Knowledge base created but no searchable content found")
            }
            Verification::Failed(e) => {
                StatusMessage::error(format!("❌ Knowledge base verification failed: {}", e))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum IngestOutcome {
    /// A document with the same name was already processed in this session
    Skipped,
    Ingested {
        details: DocumentDetails,
        verification: Verification,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    #[serde(flatten)]
    pub outcome: IngestOutcome,
    pub messages: Vec<StatusMessage>,
}

/// Index an uploaded PDF into the session.
///
/// The new knowledge base replaces the previous one; the session is only touched once
/// the index has been built and loaded.
pub async fn ingest_document(
    state: &mut SessionState,
    filename: &str,
    bytes: &[u8],
    chunk_size: usize,
    overlap: usize,
    deps: &SessionDeps<'_>,
) -> AppResult<IngestReport> {
    if state.processed_documents.contains(filename) {
        info!(filename, "Document already processed, skipping");
        let mut messages = vec![StatusMessage::info(format!("ℹ️ {} has already been processed", filename))];
        messages.extend(state.knowledge_status());
        return Ok(IngestReport { outcome: IngestOutcome::Skipped, messages });
    }

    let chunking = DocumentChunking::new(chunk_size, overlap)?;
    if !looks_like_pdf(bytes) {
        return Err(AppError::InvalidRequest(format!("{} is not a PDF document", filename)));
    }

    info!(
        filename,
        size_bytes = bytes.len(),
        chunk_size = chunking.chunk_size,
        overlap = chunking.effective_overlap(),
        "Ingesting document"
    );

    let mut file = tempfile::Builder::new()
        .prefix("legal-doc-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| AppError::Ingestion(e.to_string()))?;
    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|e| AppError::Ingestion(e.to_string()))?;

    let fallback = deps.config.llm.active_api_key();
    let api_key = state.effective_api_key(fallback.as_deref());
    let embedder = deps.backend.embedder(api_key.as_deref());

    let kb = PdfKnowledgeBase::from_temp_file(file.into_temp_path(), filename, chunking, embedder)
        .with_search_limit(deps.config.knowledge.search_limit);
    let summary = kb
        .load(true, true)
        .await
        .map_err(|e| AppError::Ingestion(e.to_string()))?;

    let verification = match kb.search(VERIFICATION_QUERY).await {
        Ok(hits) if hits.is_empty() => Verification::Empty,
        Ok(hits) => Verification::Verified(hits.len()),
        Err(e) => {
            warn!(error = %e, "Knowledge base verification failed");
            Verification::Failed(e.to_string())
        }
    };

    let kb: Arc<dyn KnowledgeBase> = Arc::new(kb);
    let team = AgentTeam::assemble(
        Some(kb.clone()),
        &TeamOptions {
            model: deps.config.llm.default_model.clone(),
            web_search: deps.web_search.clone(),
            web_search_max_results: deps.config.search.max_results,
        },
    );

    let mut messages = vec![
        verification.message(),
        StatusMessage::success("✅ Document processed and stored in knowledge base!"),
    ];

    let (page_count, preview) = preview_document(filename, bytes, &mut messages);

    let details = DocumentDetails {
        filename: filename.to_string(),
        size_bytes: bytes.len(),
        page_count,
        preview,
        chunk_count: summary.chunks,
        uploaded_at: Utc::now(),
    };

    state.knowledge_base = Some(kb);
    state.team = team.map(Arc::new);
    state.processed_documents.insert(filename.to_string());
    state.documents.push(details.clone());

    messages.push(StatusMessage::info(format!(
        "📊 Document Details: {} ({} bytes)",
        filename,
        bytes.len()
    )));
    messages.push(StatusMessage::info(format!(
        "🔍 Knowledge Base Status: Active with {} document(s)",
        state.processed_documents.len()
    )));
    if let Some(pages) = page_count {
        messages.push(StatusMessage::info(format!("📄 PDF Pages: {}", pages)));
    }

    info!(
        filename,
        pages = summary.pages,
        chunks = summary.chunks,
        verification = ?verification,
        "Document ingested"
    );

    Ok(IngestReport {
        outcome: IngestOutcome::Ingested { details, verification },
        messages,
    })
}

/// Page count and first-page preview; a failure only adds a warning
fn preview_document(
    filename: &str,
    bytes: &[u8],
    messages: &mut Vec<StatusMessage>,
) -> (Option<usize>, Option<String>) {
    match inspect_pdf(bytes) {
        Ok(meta) => (Some(meta.page_count), meta.first_page_preview),
        Err(e) => {
            warn!(filename, error = %e, "Could not preview PDF");
            messages.push(StatusMessage::warning(format!("Could not preview PDF content: {}", e)));
            (None, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::session::MessageLevel;
    use crate::testing::{build_pdf, FakeBackend, FlakyEmbedder, ScriptedLlm};

    fn contract() -> Vec<u8> {
        build_pdf(&[
            &["MASTER SERVICES AGREEMENT", "This is a test of the services agreement."],
            &["Termination", "Either party may terminate on thirty days notice."],
        ])
    }

    #[tokio::test]
    async fn test_ingest_builds_knowledge_base_and_team() {
        let config = Config::defaults();
        let backend = FakeBackend::new(ScriptedLlm::echo());
        let deps = SessionDeps { backend: &backend, config: &config, web_search: None };
        let mut state = SessionState::default();

        let report = ingest_document(&mut state, "contract.pdf", &contract(), 1000, 200, &deps)
            .await
            .unwrap();

        match &report.outcome {
            IngestOutcome::Ingested { details, verification } => {
                assert_eq!(details.page_count, Some(2));
                assert_eq!(details.chunk_count, 2);
                assert!(details.preview.as_deref().unwrap().contains("MASTER SERVICES AGREEMENT"));
                assert_eq!(*verification, Verification::Verified(2));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(
            report.messages[0].text,
            "✅ Knowledge base verified with 2 searchable chunks"
        );
        assert!(report.messages.iter().any(|m| m.text == "📄 PDF Pages: 2"));

        assert!(state.knowledge_base.is_some());
        assert!(state.team.is_some());
        assert_eq!(state.processed_documents.iter().collect::<Vec<_>>(), vec!["contract.pdf"]);
    }

    #[tokio::test]
    async fn test_same_name_is_skipped() {
        let config = Config::defaults();
        let backend = FakeBackend::new(ScriptedLlm::echo());
        let deps = SessionDeps { backend: &backend, config: &config, web_search: None };
        let mut state = SessionState::default();

        ingest_document(&mut state, "contract.pdf", &contract(), 1000, 200, &deps).await.unwrap();
        let other = build_pdf(&[&["A completely different document."]]);
        let report = ingest_document(&mut state, "contract.pdf", &other, 500, 50, &deps).await.unwrap();

        assert!(matches!(report.outcome, IngestOutcome::Skipped));
        assert_eq!(state.documents.len(), 1);
        assert_eq!(state.documents[0].chunk_count, 2);
    }

    #[tokio::test]
    async fn test_new_upload_replaces_knowledge_base() {
        let config = Config::defaults();
        let backend = FakeBackend::new(ScriptedLlm::echo());
        let deps = SessionDeps { backend: &backend, config: &config, web_search: None };
        let mut state = SessionState::default();

        ingest_document(&mut state, "contract.pdf", &contract(), 1000, 200, &deps).await.unwrap();
        let nda = build_pdf(&[&["Mutual non-disclosure agreement."]]);
        ingest_document(&mut state, "nda.pdf", &nda, 1000, 200, &deps).await.unwrap();

        let kb = state.knowledge_base.as_ref().unwrap();
        assert_eq!(kb.source(), "nda.pdf");
        assert_eq!(kb.chunk_count().await, 1);
        assert_eq!(state.processed_documents.len(), 2);
        assert_eq!(state.knowledge_status()[0].text, "✅ Knowledge Base Ready! 2 document(s) loaded");
    }

    #[tokio::test]
    async fn test_invalid_input_leaves_state_untouched() {
        let config = Config::defaults();
        let backend = FakeBackend::new(ScriptedLlm::echo());
        let deps = SessionDeps { backend: &backend, config: &config, web_search: None };
        let mut state = SessionState::default();

        let err = ingest_document(&mut state, "big.pdf", &contract(), 6000, 200, &deps).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));

        let err = ingest_document(&mut state, "notes.pdf", b"plain text", 1000, 200, &deps).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));

        let err = ingest_document(&mut state, "broken.pdf", b"%PDF-1.5 truncated", 1000, 200, &deps)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Ingestion(_)));
        assert!(err.to_string().starts_with("Error processing document: "));

        assert!(state.knowledge_base.is_none());
        assert!(state.team.is_none());
        assert!(state.processed_documents.is_empty());
    }

    #[tokio::test]
    async fn test_blank_document_verifies_empty() {
        let config = Config::defaults();
        let backend = FakeBackend::new(ScriptedLlm::echo());
        let deps = SessionDeps { backend: &backend, config: &config, web_search: None };
        let mut state = SessionState::default();

        let blank = build_pdf(&[&[]]);
        let report = ingest_document(&mut state, "scan.pdf", &blank, 1000, 200, &deps).await.unwrap();
        assert_eq!(report.messages[0].level, MessageLevel::Warning);
        assert_eq!(
            report.messages[0].text,
            "⚠️ Knowledge base created but no searchable content found"
        );
        assert!(state.team.is_some());
    }

    #[tokio::test]
    async fn test_verification_failure_is_reported_not_fatal() {
        let config = Config::defaults();
        // The load batch succeeds; the verification search is the second call.
        let backend = FakeBackend::new(ScriptedLlm::echo())
            .with_embedder(Arc::new(FlakyEmbedder::failing_after(1)));
        let deps = SessionDeps { backend: &backend, config: &config, web_search: None };
        let mut state = SessionState::default();

        let report = ingest_document(&mut state, "contract.pdf", &contract(), 1000, 200, &deps)
            .await
            .unwrap();

        match &report.outcome {
            IngestOutcome::Ingested { verification, .. } => {
                assert!(matches!(verification, Verification::Failed(_)));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(report.messages[0].level, MessageLevel::Error);
        assert!(report.messages[0]
            .text
            .starts_with("❌ Knowledge base verification failed: "));
        assert!(report.messages[0].text.contains("embedding service unavailable"));
        assert_eq!(report.messages[1].text, "✅ Document processed and stored in knowledge base!");

        assert!(state.processed_documents.contains("contract.pdf"));
        assert!(state.knowledge_base.is_some());
        assert!(state.team.is_some());
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_previous_knowledge_base() {
        let config = Config::defaults();
        let backend = FakeBackend::new(ScriptedLlm::echo());
        let deps = SessionDeps { backend: &backend, config: &config, web_search: None };
        let mut state = SessionState::default();

        ingest_document(&mut state, "contract.pdf", &contract(), 1000, 200, &deps).await.unwrap();
        let err = ingest_document(&mut state, "broken.pdf", b"%PDF-1.5 truncated", 1000, 200, &deps)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Ingestion(_)));

        let kb = state.knowledge_base.as_ref().unwrap();
        assert_eq!(kb.source(), "contract.pdf");
        assert_eq!(kb.chunk_count().await, 2);
        assert!(state.team.is_some());
        assert!(!state.processed_documents.contains("broken.pdf"));
        assert_eq!(state.documents.len(), 1);
    }

    #[test]
    fn test_unreadable_preview_only_warns() {
        let mut messages = Vec::new();
        let (pages, preview) = preview_document("scan.pdf", b"%PDF-1.5 truncated", &mut messages);

        assert_eq!(pages, None);
        assert_eq!(preview, None);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].level, MessageLevel::Warning);
        assert!(messages[0].text.starts_with("Could not preview PDF content: "));
    }

    #[test]
    fn test_preview_reports_pages() {
        let mut messages = Vec::new();
        let (pages, preview) = preview_document("contract.pdf", &contract(), &mut messages);
        assert_eq!(pages, Some(2));
        assert!(preview.unwrap().contains("MASTER SERVICES AGREEMENT"));
        assert!(messages.is_empty());
    }
}
