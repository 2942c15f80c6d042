// Paragraph-aware text chunking with overlap

use serde::Serialize;
use sha2::{Digest, Sha256};
use validator::Validate;

use crate::embeddings::PageText;
use crate::types::{AppError, AppResult};

/// A contiguous span of extracted document text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    /// Content hash; identical content loads as the same record
    pub id: String,
    pub source: String,
    pub page: u32,
    /// Position of the chunk within its page
    pub index: usize,
    pub content: String,
}

/// Chunk size and overlap, both in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Validate, Serialize)]
pub struct DocumentChunking {
    #[validate(range(min = 1, max = 5000, message = "chunk size must be between 1 and 5000"))]
    pub chunk_size: usize,
    #[validate(range(min = 1, max = 1000, message = "overlap must be between 1 and 1000"))]
    pub overlap: usize,
}

impl DocumentChunking {
    pub fn new(chunk_size: usize, overlap: usize) -> AppResult<Self> {
        let chunking = Self { chunk_size, overlap };
        chunking
            .validate()
            .map_err(|e| AppError::InvalidRequest(e.to_string()))?;
        Ok(chunking)
    }

    /// Overlap actually applied; always leaves room for new text in every chunk
    pub fn effective_overlap(&self) -> usize {
        self.overlap.min(self.chunk_size.saturating_sub(1))
    }

    /// Split every page into chunks of at most `chunk_size` characters.
    ///
    /// Each page is chunked on its own. Every chunk after the first on a page begins with
    /// the last `overlap` characters of the text before it.
    pub fn chunk(&self, source: &str, pages: &[PageText]) -> Vec<Chunk> {
        pages
            .iter()
            .flat_map(|page| self.chunk_page(source, page))
            .collect()
    }

    fn chunk_page(&self, source: &str, page: &PageText) -> Vec<Chunk> {
        let overlap = self.effective_overlap();
        let budget = self.chunk_size - overlap;
        let pieces = pack_paragraphs(&normalize(&page.text), budget);

        let mut chunks = Vec::with_capacity(pieces.len());
        for (index, piece) in pieces.iter().enumerate() {
            let content = if index == 0 || overlap == 0 {
                piece.clone()
            } else {
                format!("{}{}", tail_chars(&pieces[index - 1], overlap), piece)
            };
            chunks.push(Chunk {
                id: chunk_id(source, page.page, index, &content),
                source: source.to_string(),
                page: page.page,
                index,
                content,
            });
        }
        chunks
    }
}

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn tail_chars(text: &str, n: usize) -> &str {
    let len = char_len(text);
    if len <= n {
        return text;
    }
    match text.char_indices().nth(len - n) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

/// Greedily join paragraphs into pieces of at most `budget` characters
fn pack_paragraphs(text: &str, budget: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    let paragraphs = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty());

    for paragraph in paragraphs {
        for segment in split_long(paragraph, budget) {
            if current.is_empty() {
                current = segment;
            } else if char_len(&current) + 2 + char_len(&segment) <= budget {
                current.push_str("\n\n");
                current.push_str(&segment);
            } else {
                pieces.push(std::mem::replace(&mut current, segment));
            }
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Break a paragraph longer than `budget`, preferring whitespace boundaries
fn split_long(paragraph: &str, budget: usize) -> Vec<String> {
    let mut segments = Vec::new();
    let mut rest = paragraph;

    while char_len(rest) > budget {
        let hard_cut = rest
            .char_indices()
            .nth(budget)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let window = &rest[..hard_cut];
        let cut = match window.rfind(char::is_whitespace) {
            Some(ws) if ws > 0 && char_len(&window[..ws]) * 2 >= budget => ws,
            _ => hard_cut,
        };
        let segment = rest[..cut].trim_end();
        if !segment.is_empty() {
            segments.push(segment.to_string());
        }
        rest = rest[cut..].trim_start();
    }
    if !rest.is_empty() {
        segments.push(rest.to_string());
    }
    segments
}

fn chunk_id(source: &str, page: u32, index: usize, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(page.to_le_bytes());
    hasher.update((index as u64).to_le_bytes());
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
