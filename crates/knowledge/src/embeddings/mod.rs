//! Query embedding providers.
//!
//! The pipeline only relies on the contract "same text in, same
//! fixed-length vector out". Chunk vectors in the store must come from the
//! same provider and dimension.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
