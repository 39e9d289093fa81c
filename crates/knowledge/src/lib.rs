//! Role-filtered document question answering.
//!
//! Retrieves chunks a role may read from a vector store, scores how well
//! they cover the question and generates an answer from them with an LLM.

pub mod confidence;
pub mod embeddings;
pub mod generation;
pub mod import;
pub mod normalize;
pub mod pipeline;
pub mod rerank;
pub mod retrieval;
pub mod roles;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use confidence::{
    add_disclaimer, ConfidenceLevel, ConfidenceResult, ConfidenceScorer, SourceAttribution,
};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use generation::{fallback_answer, AnswerGenerator, ExplainedAnswer};
pub use import::{import_chunks, import_file, ChunkRecord, ImportStats};
pub use normalize::normalize;
pub use pipeline::{AnswerMethod, Pipeline, PipelineBuilder, PipelineResponse, QueryRequest};
pub use rerank::{LlmReranker, Reranker};
pub use retrieval::Retriever;
pub use roles::{can_access, filter_results, Role};
pub use store::{InMemoryVectorStore, LanceDbStore, VectorStore};
pub use types::{ChunkMetadata, DocumentChunk, RoleFlags, SearchResult};
