// In-memory vector store with cosine-similarity search

use nalgebra::DVector;

use crate::embeddings::Chunk;

struct StoredChunk {
    chunk: Chunk,
    embedding: DVector<f32>,
}

/// A scored search hit
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Default)]
pub struct VectorStore {
    records: Vec<StoredChunk>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.chunk.id == id)
    }

    /// Insert, or replace the record with the same id in place
    pub fn upsert(&mut self, chunk: Chunk, embedding: Vec<f32>) {
        let record = StoredChunk { chunk, embedding: DVector::from_vec(embedding) };
        match self.position(&record.chunk.id) {
            Some(pos) => self.records[pos] = record,
            None => self.records.push(record),
        }
    }

    /// Insert only if the id is new; returns whether the record was added
    pub fn insert_new(&mut self, chunk: Chunk, embedding: Vec<f32>) -> bool {
        if self.contains(&chunk.id) {
            return false;
        }
        self.records.push(StoredChunk { chunk, embedding: DVector::from_vec(embedding) });
        true
    }

    /// Top `limit` records by cosine similarity; ties keep insertion order
    pub fn search(&self, query: &[f32], limit: usize) -> Vec<SearchResult> {
        let query = DVector::from_column_slice(query);
        let mut scored: Vec<(usize, f32)> = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (i, cosine_similarity(&query, &r.embedding)))
            .collect();

        // sort_by is stable, so equal scores stay in insertion order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(limit)
            .map(|(i, score)| SearchResult {
                chunk: self.records[i].chunk.clone(),
                score,
            })
            .collect()
    }
}

fn cosine_similarity(a: &DVector<f32>, b: &DVector<f32>) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let denom = a.norm() * b.norm();
    if denom == 0.0 {
        0.0
    } else {
        a.dot(b) / denom
    }
}
