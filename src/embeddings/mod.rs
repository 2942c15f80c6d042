// Document knowledge base: PDF reading, chunking, embeddings and vector search

pub mod document_processor;
pub mod embedder;
pub mod knowledge_base;
pub mod text_chunker;
pub mod vector_search;

pub use document_processor::*;
pub use embedder::*;
pub use knowledge_base::*;
pub use text_chunker::*;
pub use vector_search::*;
