//! In-memory vector index over embedded chunks.

use crate::error::{OllamaError, OllamaResult};
use docqa_core::Chunk;

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot_product = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    dot_product / denominator
}

/// A chunk and its embedding.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A search result.
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub chunk: &'a Chunk,
    pub similarity: f32,
}

/// Brute-force cosine index. All embeddings share one dimension.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<IndexedChunk>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chunk. Fails if the embedding's dimension differs from the
    /// ones already stored.
    pub fn insert(&mut self, chunk: Chunk, embedding: Vec<f32>) -> OllamaResult<()> {
        if let Some(expected) = self.dimensions() {
            if embedding.len() != expected {
                return Err(OllamaError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }
        self.entries.push(IndexedChunk { chunk, embedding });
        Ok(())
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.entries.first().map(|e| e.embedding.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    /// The `limit` most similar chunks scoring at least `min_similarity`,
    /// most similar first. Ties keep insertion order.
    pub fn search(&self, query: &[f32], limit: usize, min_similarity: f32) -> Vec<SearchHit<'_>> {
        let mut hits: Vec<SearchHit<'_>> = self
            .entries
            .iter()
            .map(|e| SearchHit {
                chunk: &e.chunk,
                similarity: cosine_similarity(query, &e.embedding),
            })
            .filter(|hit| hit.similarity >= min_similarity)
            .collect();

        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(limit);
        hits
    }
}
