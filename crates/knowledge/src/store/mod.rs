//! Vector store abstraction for document chunks.
//!
//! The store is opened once and shared read-only across concurrent
//! queries. Filtering happens inside the store on a single boolean role
//! flag (see [`crate::roles::Role::filter_key`]).

pub mod lancedb;
pub mod memory;

pub use self::lancedb::LanceDbStore;
pub use self::memory::InMemoryVectorStore;

use crate::types::{DocumentChunk, RoleFlags, SearchResult};
use docgate_core::{AppError, AppResult};

/// Trait for vector store backends.
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend name for logs and stats.
    fn name(&self) -> &str;

    /// Fixed embedding dimension of this store.
    fn dimensions(&self) -> usize;

    /// Nearest `n_results` chunks by cosine distance whose `filter_key` flag is true.
    ///
    /// Returns an empty result, not an error, when nothing matches.
    async fn query(
        &self,
        embedding: &[f32],
        n_results: usize,
        filter_key: &str,
    ) -> AppResult<SearchResult>;

    /// Number of stored chunks.
    async fn count(&self) -> AppResult<usize>;

    /// Add precomputed chunks, replacing any stored chunk with the same id.
    /// Returns how many were written.
    async fn insert_chunks(&self, chunks: &[DocumentChunk]) -> AppResult<usize>;
}

/// Reject filter keys that are not role flags.
pub(crate) fn check_filter_key(filter_key: &str) -> AppResult<()> {
    if RoleFlags::KEYS.contains(&filter_key) {
        Ok(())
    } else {
        Err(AppError::Retrieval(format!(
            "Unknown role filter key: {}",
            filter_key
        )))
    }
}

/// Reject vectors whose length differs from the store dimension.
pub(crate) fn check_dimensions(expected: usize, actual: usize, what: &str) -> AppResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(AppError::Retrieval(format!(
            "{} dimension mismatch: expected {}, got {}",
            what, expected, actual
        )))
    }
}
