//! Brute-force in-memory vector store.

use super::{check_dimensions, check_filter_key, VectorStore};
use crate::types::{DocumentChunk, SearchResult};
use docgate_core::{AppError, AppResult};
use std::sync::RwLock;

/// Keeps every chunk in memory and scans them per query.
///
/// Results are sorted by ascending cosine distance; equal distances keep
/// insertion order.
#[derive(Debug)]
pub struct InMemoryVectorStore {
    dimensions: usize,
    chunks: RwLock<Vec<DocumentChunk>>,
}

impl InMemoryVectorStore {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            chunks: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> AppResult<std::sync::RwLockReadGuard<'_, Vec<DocumentChunk>>> {
        self.chunks
            .read()
            .map_err(|_| AppError::Retrieval("In-memory store lock poisoned".to_string()))
    }
}

/// Cosine distance `1 - cos(a, b)`; a zero vector is at distance 1 from everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    (1.0 - dot / (norm_a * norm_b)).max(0.0)
}

#[async_trait::async_trait]
impl VectorStore for InMemoryVectorStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn query(
        &self,
        embedding: &[f32],
        n_results: usize,
        filter_key: &str,
    ) -> AppResult<SearchResult> {
        check_filter_key(filter_key)?;
        check_dimensions(self.dimensions, embedding.len(), "Query embedding")?;

        let chunks = self.read()?;

        let mut scored: Vec<(f32, &DocumentChunk)> = chunks
            .iter()
            .filter(|c| c.metadata.flags.get(filter_key).unwrap_or(false))
            .map(|c| (cosine_distance(embedding, &c.embedding), c))
            .collect();

        // sort_by is stable, so ties stay in insertion order
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut result = SearchResult::default();
        for (distance, chunk) in scored.into_iter().take(n_results) {
            result.push(&chunk.id, &chunk.text, chunk.metadata.clone(), distance);
        }

        tracing::debug!(
            filter_key,
            returned = result.len(),
            "In-memory query complete"
        );

        Ok(result)
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(self.read()?.len())
    }

    async fn insert_chunks(&self, chunks: &[DocumentChunk]) -> AppResult<usize> {
        for chunk in chunks {
            check_dimensions(self.dimensions, chunk.embedding.len(), "Chunk embedding")?;
        }

        let mut stored = self
            .chunks
            .write()
            .map_err(|_| AppError::Retrieval("In-memory store lock poisoned".to_string()))?;
        for chunk in chunks {
            match stored.iter_mut().find(|c| c.id == chunk.id) {
                Some(existing) => *existing = chunk.clone(),
                None => stored.push(chunk.clone()),
            }
        }

        Ok(chunks.len())
    }
}
