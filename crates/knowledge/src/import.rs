//! Loading precomputed chunks into a vector store.
//!
//! Input is a JSON array of chunk records. Records without an embedding
//! are embedded with the configured provider before insertion.

use crate::embeddings::EmbeddingProvider;
use crate::store::VectorStore;
use crate::types::{ChunkMetadata, DocumentChunk};
use docgate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const EMBED_BATCH_SIZE: usize = 32;

/// One chunk as written by the ingestion tooling.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkRecord {
    #[serde(alias = "chunk_id")]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportStats {
    pub records: usize,
    pub embedded: usize,
    pub inserted: usize,
}

/// Parse a chunk file.
pub fn read_chunk_file(path: &Path) -> AppResult<Vec<ChunkRecord>> {
    let contents = std::fs::read_to_string(path)?;
    let records: Vec<ChunkRecord> = serde_json::from_str(&contents)?;
    tracing::debug!("Read {} chunk records from {:?}", records.len(), path);
    Ok(records)
}

fn validate(records: &[ChunkRecord]) -> AppResult<()> {
    let mut ids = HashSet::new();
    for record in records {
        if record.text.trim().is_empty() {
            return Err(AppError::Serialization(format!(
                "Chunk '{}' has empty text",
                record.id
            )));
        }
        if !ids.insert(record.id.as_str()) {
            return Err(AppError::Serialization(format!(
                "Duplicate chunk id '{}'",
                record.id
            )));
        }
    }
    Ok(())
}

/// Embed missing vectors and insert every record into `store`.
///
/// Admin may read every chunk, so the admin flag is set on all of them.
/// Ids already in the store are replaced, so loading a file twice is a no-op.
pub async fn import_chunks(
    records: Vec<ChunkRecord>,
    embedder: &dyn EmbeddingProvider,
    store: &dyn VectorStore,
) -> AppResult<ImportStats> {
    validate(&records)?;

    let mut stats = ImportStats {
        records: records.len(),
        ..Default::default()
    };

    let missing: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.embedding.is_none())
        .map(|(i, _)| i)
        .collect();

    let mut computed = Vec::with_capacity(missing.len());
    for batch in missing.chunks(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|&i| records[i].text.clone()).collect();
        computed.extend(embedder.embed_batch(&texts).await?);
        tracing::debug!("Embedded {}/{} chunks", computed.len(), missing.len());
    }
    stats.embedded = computed.len();

    let mut computed = computed.into_iter();
    let mut chunks = Vec::with_capacity(records.len());
    for record in records {
        let embedding = match record.embedding {
            Some(embedding) => embedding,
            None => computed
                .next()
                .ok_or_else(|| AppError::Embedding("Provider returned too few embeddings".to_string()))?,
        };

        if embedding.len() != store.dimensions() {
            return Err(AppError::Embedding(format!(
                "Chunk '{}' has {} dimensions but the store expects {}",
                record.id,
                embedding.len(),
                store.dimensions()
            )));
        }

        let mut metadata = record.metadata;
        metadata.flags.role_admin = true;
        if !metadata
            .allowed_roles
            .iter()
            .any(|r| r.eq_ignore_ascii_case("admin"))
        {
            metadata.allowed_roles.push("admin".to_string());
        }

        chunks.push(DocumentChunk {
            id: record.id,
            text: record.text,
            embedding,
            metadata,
        });
    }

    stats.inserted = store.insert_chunks(&chunks).await?;

    tracing::info!(
        "Imported {} chunks into {} ({} embedded)",
        stats.inserted,
        store.name(),
        stats.embedded
    );

    Ok(stats)
}

/// Read `path` and import its records.
pub async fn import_file(
    path: &Path,
    embedder: &dyn EmbeddingProvider,
    store: &dyn VectorStore,
) -> AppResult<ImportStats> {
    let records = read_chunk_file(path)?;
    import_chunks(records, embedder, store).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use crate::store::InMemoryVectorStore;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CHUNKS: &str = r#"[
        {
            "chunk_id": "hr_001",
            "text": "Employees receive 25 days of annual leave.",
            "metadata": {
                "source_document": "employee_handbook.md",
                "section_title": "Leave",
                "department": "general",
                "allowed_roles": ["general", "employee"]
            }
        },
        {
            "id": "fin_001",
            "text": "Q3 revenue grew 12 percent.",
            "embedding": [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
            "metadata": {
                "source_document": "quarterly_report.md",
                "allowed_roles": "finance"
            }
        }
    ]"#;

    fn chunk_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_import_file_embeds_missing_vectors() {
        let file = chunk_file(CHUNKS);
        let embedder = TrigramProvider::new(8);
        let store = InMemoryVectorStore::new(8);

        let stats = import_file(file.path(), &embedder, &store).await.unwrap();
        assert_eq!(
            stats,
            ImportStats {
                records: 2,
                embedded: 1,
                inserted: 2
            }
        );
        assert_eq!(store.count().await.unwrap(), 2);

        // Finance chunk: visible to finance and admin only
        let finance = store
            .query(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0], 5, "role_finance")
            .await
            .unwrap();
        assert_eq!(finance.ids(), ["fin_001"]);
        assert_eq!(finance.metadatas()[0].section_title, "N/A");

        let admin = store
            .query(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0], 5, "role_admin")
            .await
            .unwrap();
        assert_eq!(admin.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_ids_rejected() {
        let records: Vec<ChunkRecord> = serde_json::from_str(
            r#"[
                {"id": "a", "text": "one", "metadata": {"allowed_roles": ["hr"]}},
                {"id": "a", "text": "two", "metadata": {"allowed_roles": ["hr"]}}
            ]"#,
        )
        .unwrap();

        let store = InMemoryVectorStore::new(8);
        let result = import_chunks(records, &TrigramProvider::new(8), &store).await;
        assert!(matches!(result, Err(AppError::Serialization(_))));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reimport_keeps_ids_unique() {
        let file = chunk_file(CHUNKS);
        let embedder = TrigramProvider::new(8);
        let store = InMemoryVectorStore::new(8);

        import_file(file.path(), &embedder, &store).await.unwrap();
        let stats = import_file(file.path(), &embedder, &store).await.unwrap();
        assert_eq!(stats.inserted, 2);
        assert_eq!(store.count().await.unwrap(), 2);

        let retriever = crate::Retriever::new(
            std::sync::Arc::new(TrigramProvider::new(8)),
            std::sync::Arc::new(store),
        );
        let result = retriever
            .search("annual leave", crate::Role::Employee, 5)
            .await
            .unwrap();
        assert_eq!(result.ids(), ["hr_001"]);
    }

    #[tokio::test]
    async fn test_admin_added_to_allowed_roles() {
        let records: Vec<ChunkRecord> = serde_json::from_str(
            r#"[{"id": "a", "text": "one", "metadata": {"role_hr": true}}]"#,
        )
        .unwrap();

        let store = InMemoryVectorStore::new(8);
        import_chunks(records, &TrigramProvider::new(8), &store)
            .await
            .unwrap();

        let embedding = TrigramProvider::new(8).embed("one").await.unwrap();
        let admin = store.query(&embedding, 5, "role_admin").await.unwrap();
        assert_eq!(admin.metadatas()[0].allowed_roles, vec!["hr", "admin"]);
        assert_eq!(
            crate::roles::filter_results(admin, crate::Role::Admin).ids(),
            ["a"]
        );
    }

    #[tokio::test]
    async fn test_wrong_width_rejected() {
        let records: Vec<ChunkRecord> = serde_json::from_str(
            r#"[{"id": "a", "text": "one", "embedding": [1.0, 0.0], "metadata": {}}]"#,
        )
        .unwrap();

        let store = InMemoryVectorStore::new(8);
        let result = import_chunks(records, &TrigramProvider::new(8), &store).await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }
}
