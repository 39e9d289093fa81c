//! Role-filtered semantic search.

use crate::embeddings::EmbeddingProvider;
use crate::normalize::normalize;
use crate::roles::{self, Role};
use crate::store::VectorStore;
use crate::types::SearchResult;
use docgate_core::{AppError, AppResult};
use std::sync::Arc;

/// Embeds queries and runs them against the store under a role filter.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Nearest `n_results` chunks the role may read, closest first.
    ///
    /// Nothing matching is an empty result. Embedding failures and a query
    /// vector whose width differs from the store are `AppError::Embedding`;
    /// store failures are `AppError::Retrieval`.
    pub async fn search(&self, query: &str, role: Role, n_results: usize) -> AppResult<SearchResult> {
        let normalized = normalize(query);

        let embedding = self.embedder.embed(&normalized).await?;
        if embedding.len() != self.store.dimensions() {
            return Err(AppError::Embedding(format!(
                "Provider '{}' produced {} dimensions but the store expects {}",
                self.embedder.provider_name(),
                embedding.len(),
                self.store.dimensions()
            )));
        }

        let filter_key = role.filter_key();
        let results = self.store.query(&embedding, n_results, filter_key).await?;
        let returned = results.len();

        let results = roles::filter_results(results, role);
        if results.len() < returned {
            tracing::warn!(
                role = %role,
                dropped = returned - results.len(),
                "Store returned chunks outside the role's permissions"
            );
        }

        tracing::debug!(
            role = %role,
            filter_key,
            results = results.len(),
            "Search complete"
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use crate::store::InMemoryVectorStore;
    use crate::types::{ChunkMetadata, DocumentChunk, RoleFlags};

    async fn seeded() -> Retriever {
        let embedder = Arc::new(TrigramProvider::new(64));
        let store = Arc::new(InMemoryVectorStore::new(64));

        let docs = [
            ("leave", "Employees receive 25 days of annual leave", &["employee", "admin"][..]),
            ("budget", "The Q3 marketing budget is 2 million", &["finance", "admin"][..]),
            ("deploy", "Deployments run every Tuesday", &["engineering", "admin"][..]),
        ];

        let mut chunks = Vec::new();
        for (id, text, roles) in docs {
            chunks.push(DocumentChunk {
                id: id.to_string(),
                text: text.to_string(),
                embedding: embedder.embed(text).await.unwrap(),
                metadata: ChunkMetadata::for_roles(&format!("{}.md", id), roles),
            });
        }
        store.insert_chunks(&chunks).await.unwrap();

        Retriever::new(embedder, store)
    }

    #[tokio::test]
    async fn test_employee_sees_only_baseline() {
        let retriever = seeded().await;
        let results = retriever
            .search("marketing budget", Role::Employee, 5)
            .await
            .unwrap();

        assert_eq!(results.ids(), ["leave"]);
    }

    #[tokio::test]
    async fn test_department_sees_own_and_baseline() {
        let retriever = seeded().await;
        let results = retriever
            .search("What is the Q3 marketing budget?", Role::Finance, 5)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results.ids()[0], "budget");
        assert!(results.distances()[0] <= results.distances()[1]);
    }

    #[tokio::test]
    async fn test_admin_sees_everything() {
        let retriever = seeded().await;
        let results = retriever.search("anything", Role::Admin, 10).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_query_is_normalized_before_embedding() {
        let retriever = seeded().await;
        let a = retriever
            .search("  Annual   LEAVE ", Role::Employee, 1)
            .await
            .unwrap();
        let b = retriever.search("annual leave", Role::Employee, 1).await.unwrap();
        assert_eq!(a.distances(), b.distances());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_embedding_error() {
        let retriever = Retriever::new(
            Arc::new(TrigramProvider::new(32)),
            Arc::new(InMemoryVectorStore::new(64)),
        );

        let result = retriever.search("leave", Role::Employee, 3).await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_flag_and_roles_disagreeing_is_filtered() {
        let embedder = Arc::new(TrigramProvider::new(16));
        let store = Arc::new(InMemoryVectorStore::new(16));

        // Flag says general, allowed_roles says finance only
        let mut metadata = ChunkMetadata::for_roles("q3.md", &["finance"]);
        metadata.flags = RoleFlags {
            role_general: true,
            ..metadata.flags
        };
        store
            .insert_chunks(&[DocumentChunk {
                id: "q3".to_string(),
                text: "quarterly numbers".to_string(),
                embedding: embedder.embed("quarterly numbers").await.unwrap(),
                metadata,
            }])
            .await
            .unwrap();

        let retriever = Retriever::new(embedder, store);
        let results = retriever
            .search("quarterly numbers", Role::Employee, 5)
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
