//! Knowledge Base
//!
//! A searchable index over one document's chunks. Agents receive a shared
//! `Arc<dyn KnowledgeBase>` and query it through their search tool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tempfile::TempPath;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::embeddings::{Chunk, DocumentChunking, Embedder, PdfReader, VectorStore};
use crate::types::{AppError, AppResult};

/// Default number of chunks returned per search
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// What a `load` did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub pages: usize,
    pub chunks: usize,
    /// Chunks written (inserted or replaced)
    pub written: usize,
}

#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// (Re)index the source. `recreate` drops the existing index first; `upsert`
    /// replaces chunks whose id already exists instead of skipping them.
    async fn load(&self, recreate: bool, upsert: bool) -> AppResult<LoadSummary>;

    /// Chunks most relevant to `query`, best first
    async fn search(&self, query: &str) -> AppResult<Vec<Chunk>>;

    async fn chunk_count(&self) -> usize;

    /// Display name of the indexed document
    fn source(&self) -> &str;
}

pub struct PdfKnowledgeBase {
    path: PathBuf,
    source: String,
    reader: PdfReader,
    chunking: DocumentChunking,
    embedder: Arc<dyn Embedder>,
    search_limit: usize,
    store: RwLock<VectorStore>,
    // Deletes the backing temp file once the knowledge base is dropped
    _file: Option<TempPath>,
}

impl PdfKnowledgeBase {
    pub fn new(
        path: impl Into<PathBuf>,
        source: impl Into<String>,
        chunking: DocumentChunking,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            reader: PdfReader,
            chunking,
            embedder,
            search_limit: DEFAULT_SEARCH_LIMIT,
            store: RwLock::new(VectorStore::new()),
            _file: None,
        }
    }

    /// Index a temp file and keep it alive for as long as this knowledge base
    pub fn from_temp_file(
        file: TempPath,
        source: impl Into<String>,
        chunking: DocumentChunking,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        let mut kb = Self::new(file.to_path_buf(), source, chunking, embedder);
        kb._file = Some(file);
        kb
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl KnowledgeBase for PdfKnowledgeBase {
    async fn load(&self, recreate: bool, upsert: bool) -> AppResult<LoadSummary> {
        let path = self.path.clone();
        let reader = self.reader;
        let pages = tokio::task::spawn_blocking(move || reader.read_path(&path))
            .await
            .map_err(|e| AppError::Internal(format!("PDF reader task failed: {}", e)))??;

        let chunks = self.chunking.chunk(&self.source, &pages);
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed(&texts).await?
        };

        let mut store = self.store.write().await;
        if recreate {
            store.clear();
        }
        let chunk_total = chunks.len();
        let mut written = 0;
        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            if upsert {
                store.upsert(chunk, embedding);
                written += 1;
            } else if store.insert_new(chunk, embedding) {
                written += 1;
            }
        }

        info!(
            source = %self.source,
            pages = pages.len(),
            chunks = chunk_total,
            written,
            embedder = self.embedder.name(),
            "Knowledge base loaded"
        );

        Ok(LoadSummary {
            pages: pages.len(),
            chunks: chunk_total,
            written,
        })
    }

    async fn search(&self, query: &str) -> AppResult<Vec<Chunk>> {
        if self.store.read().await.is_empty() {
            return Ok(Vec::new());
        }
        let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
        let query_vector = vectors
            .pop()
            .ok_or_else(|| AppError::Embedding("Embedder returned no vector for query".to_string()))?;

        let hits = self.store.read().await.search(&query_vector, self.search_limit);
        debug!(query = %query, hits = hits.len(), "Knowledge base search");
        Ok(hits.into_iter().map(|h| h.chunk).collect())
    }

    async fn chunk_count(&self) -> usize {
        self.store.read().await.len()
    }

    fn source(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingEmbedder;
    use crate::testing::{build_pdf, write_temp_pdf};

    fn kb_for(bytes: &[u8], chunking: DocumentChunking) -> PdfKnowledgeBase {
        PdfKnowledgeBase::from_temp_file(
            write_temp_pdf(bytes),
            "contract.pdf",
            chunking,
            Arc::new(HashingEmbedder::default()),
        )
    }

    #[tokio::test]
    async fn test_load_and_search() {
        let bytes = build_pdf(&[
            &["Payment terms: invoices are due within thirty days."],
            &["Termination: either party may terminate for convenience."],
        ]);
        let kb = kb_for(&bytes, DocumentChunking::new(1000, 200).unwrap());

        let summary = kb.load(true, true).await.unwrap();
        assert_eq!(summary.pages, 2);
        assert_eq!(summary.chunks, 2);
        assert_eq!(kb.chunk_count().await, 2);

        let hits = kb.search("terminate for convenience").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].page, 2);
    }

    #[tokio::test]
    async fn test_reload_is_idempotent() {
        let bytes = build_pdf(&[&["Governing law is the State of Delaware."]]);
        let kb = kb_for(&bytes, DocumentChunking::new(1000, 200).unwrap());

        kb.load(true, true).await.unwrap();
        let again = kb.load(false, false).await.unwrap();
        assert_eq!(again.written, 0);
        let upserted = kb.load(false, true).await.unwrap();
        assert_eq!(upserted.written, 1);
        assert_eq!(kb.chunk_count().await, 1);
    }

    #[tokio::test]
    async fn test_search_before_load_is_empty() {
        let bytes = build_pdf(&[&["Confidentiality"]]);
        let kb = kb_for(&bytes, DocumentChunking::new(1000, 200).unwrap());
        assert!(kb.search("test").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_limit_caps_results() {
        let lines: Vec<String> = (0..40).map(|i| format!("Section {} obligations apply.", i)).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let bytes = build_pdf(&[&refs]);
        let kb = kb_for(&bytes, DocumentChunking::new(60, 10).unwrap()).with_search_limit(3);

        kb.load(true, true).await.unwrap();
        assert!(kb.chunk_count().await > 3);
        assert_eq!(kb.search("obligations").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_file_is_pdf_error() {
        let kb = PdfKnowledgeBase::new(
            "/nonexistent/contract.pdf",
            "contract.pdf",
            DocumentChunking::new(1000, 200).unwrap(),
            Arc::new(HashingEmbedder::default()),
        );
        assert!(matches!(kb.load(true, true).await, Err(AppError::Pdf(_))));
    }

    #[test]
    fn test_temp_file_removed_on_drop() {
        let bytes = build_pdf(&[&["Notice"]]);
        let kb = kb_for(&bytes, DocumentChunking::new(1000, 200).unwrap());
        let path = kb.path().to_path_buf();
        assert!(path.exists());
        drop(kb);
        assert!(!path.exists());
    }
}
