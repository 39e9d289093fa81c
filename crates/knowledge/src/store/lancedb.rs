//! LanceDB-backed vector store.

use super::{check_dimensions, check_filter_key, VectorStore};
use crate::types::{ChunkMetadata, DocumentChunk, RoleFlags, SearchResult};
use arrow_array::{
    Array, BooleanArray, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator,
    StringArray,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use docgate_core::{AppError, AppResult};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};
use std::path::Path;
use std::sync::Arc;

const VECTOR_COLUMN: &str = "vector";
const DISTANCE_COLUMN: &str = "_distance";
// Ids per delete predicate
const DELETE_BATCH_SIZE: usize = 256;

/// Persistent chunk store on LanceDB.
pub struct LanceDbStore {
    table: Table,
    embedding_dim: usize,
}

impl LanceDbStore {
    /// Create or open the chunk table at `db_path`.
    ///
    /// # Arguments
    /// * `db_path` - Directory path for the LanceDB database
    /// * `table_name` - Name of the table (typically "company_documents")
    /// * `embedding_dim` - Dimension of embedding vectors (e.g., 384)
    ///
    /// An existing table whose vector width differs from `embedding_dim` is
    /// rejected.
    pub async fn open(db_path: &Path, table_name: &str, embedding_dim: usize) -> AppResult<Self> {
        std::fs::create_dir_all(db_path).map_err(|e| {
            AppError::Retrieval(format!("Failed to create store directory: {}", e))
        })?;

        let uri = db_path.to_string_lossy().to_string();
        let conn = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to connect to LanceDB: {}", e)))?;

        let table_names = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to list tables: {}", e)))?;

        let table = if table_names.iter().any(|t| t == table_name) {
            let table = conn
                .open_table(table_name)
                .execute()
                .await
                .map_err(|e| AppError::Retrieval(format!("Failed to open table: {}", e)))?;
            Self::check_table_width(&table, embedding_dim).await?;
            table
        } else {
            let schema = Self::create_schema(embedding_dim);
            let empty_batch = RecordBatch::new_empty(schema.clone());

            conn.create_table(
                table_name,
                RecordBatchIterator::new(vec![Ok(empty_batch)], schema),
            )
            .execute()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to create table: {}", e)))?
        };

        tracing::debug!("Opened LanceDB table '{}' at {:?}", table_name, db_path);

        Ok(Self {
            table,
            embedding_dim,
        })
    }

    async fn check_table_width(table: &Table, embedding_dim: usize) -> AppResult<()> {
        let schema = table
            .schema()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to read table schema: {}", e)))?;

        match schema.field_with_name(VECTOR_COLUMN).map(|f| f.data_type()) {
            Ok(DataType::FixedSizeList(_, width)) if *width as usize == embedding_dim => Ok(()),
            Ok(DataType::FixedSizeList(_, width)) => Err(AppError::Config(format!(
                "Vector store holds {}-dimensional vectors but the embedding provider produces {}",
                width, embedding_dim
            ))),
            _ => Err(AppError::Retrieval(format!(
                "Table has no '{}' vector column",
                VECTOR_COLUMN
            ))),
        }
    }

    /// Arrow schema for the chunk table: text, vector, attribution and one
    /// boolean column per role flag.
    fn create_schema(embedding_dim: usize) -> SchemaRef {
        let mut fields = vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new(
                VECTOR_COLUMN,
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    embedding_dim as i32,
                ),
                false,
            ),
            Field::new("source_document", DataType::Utf8, false),
            Field::new("section_title", DataType::Utf8, false),
            Field::new("department", DataType::Utf8, false),
            // Comma-joined, as ingestion writes it
            Field::new("allowed_roles", DataType::Utf8, false),
        ];
        fields.extend(
            RoleFlags::KEYS
                .iter()
                .map(|key| Field::new(*key, DataType::Boolean, false)),
        );

        Arc::new(Schema::new(fields))
    }

    /// Convert chunks to one Arrow RecordBatch.
    fn chunks_to_batch(&self, chunks: &[DocumentChunk]) -> AppResult<RecordBatch> {
        let schema = Self::create_schema(self.embedding_dim);

        let mut flat = Vec::with_capacity(chunks.len() * self.embedding_dim);
        for chunk in chunks {
            check_dimensions(self.embedding_dim, chunk.embedding.len(), "Chunk embedding")?;
            flat.extend_from_slice(&chunk.embedding);
        }

        let vectors = FixedSizeListArray::try_new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            self.embedding_dim as i32,
            Arc::new(Float32Array::from(flat)),
            None,
        )
        .map_err(|e| AppError::Retrieval(format!("Failed to build vector column: {}", e)))?;

        let strings = |f: fn(&DocumentChunk) -> String| -> Arc<dyn Array> {
            Arc::new(StringArray::from(chunks.iter().map(f).collect::<Vec<_>>()))
        };

        let mut columns: Vec<Arc<dyn Array>> = vec![
            strings(|c| c.id.clone()),
            strings(|c| c.text.clone()),
            Arc::new(vectors),
            strings(|c| c.metadata.source_document.clone()),
            strings(|c| c.metadata.section_title.clone()),
            strings(|c| c.metadata.department.clone()),
            strings(|c| c.metadata.allowed_roles.join(",")),
        ];
        for key in RoleFlags::KEYS {
            let values: Vec<bool> = chunks
                .iter()
                .map(|c| c.metadata.flags.get(key).unwrap_or(false))
                .collect();
            columns.push(Arc::new(BooleanArray::from(values)));
        }

        RecordBatch::try_new(schema, columns)
            .map_err(|e| AppError::Retrieval(format!("Failed to create RecordBatch: {}", e)))
    }

    /// Remove stored rows whose id is in `chunks`.
    async fn delete_ids(&self, chunks: &[DocumentChunk]) -> AppResult<()> {
        for batch in chunks.chunks(DELETE_BATCH_SIZE) {
            let ids = batch
                .iter()
                .map(|c| format!("'{}'", c.id.replace('\'', "''")))
                .collect::<Vec<_>>()
                .join(", ");

            self.table
                .delete(&format!("id IN ({})", ids))
                .await
                .map_err(|e| AppError::Retrieval(format!("Failed to replace chunks: {}", e)))?;
        }
        Ok(())
    }

    /// Append the rows of a result batch to `result`.
    fn read_batch(batch: &RecordBatch, result: &mut SearchResult) -> AppResult<()> {
        let ids = string_column(batch, "id")?;
        let texts = string_column(batch, "text")?;
        let sources = string_column(batch, "source_document")?;
        let sections = string_column(batch, "section_title")?;
        let departments = string_column(batch, "department")?;
        let allowed = string_column(batch, "allowed_roles")?;
        let distances = batch
            .column_by_name(DISTANCE_COLUMN)
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
            .ok_or_else(|| AppError::Retrieval("Missing distance column".to_string()))?;
        let flag_columns = RoleFlags::KEYS
            .iter()
            .map(|key| bool_column(batch, key))
            .collect::<AppResult<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            let flag = |i: usize| flag_columns[i].value(row);
            let metadata = ChunkMetadata {
                source_document: sources.value(row).to_string(),
                section_title: sections.value(row).to_string(),
                department: departments.value(row).to_string(),
                allowed_roles: allowed
                    .value(row)
                    .split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(str::to_string)
                    .collect(),
                flags: RoleFlags {
                    role_admin: flag(0),
                    role_finance: flag(1),
                    role_engineering: flag(2),
                    role_hr: flag(3),
                    role_marketing: flag(4),
                    role_general: flag(5),
                },
            };

            result.push(ids.value(row), texts.value(row), metadata, distances.value(row));
        }

        Ok(())
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| AppError::Retrieval(format!("Invalid {} column", name)))
}

fn bool_column<'a>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a BooleanArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<BooleanArray>())
        .ok_or_else(|| AppError::Retrieval(format!("Invalid {} column", name)))
}

#[async_trait::async_trait]
impl VectorStore for LanceDbStore {
    fn name(&self) -> &str {
        "lancedb"
    }

    fn dimensions(&self) -> usize {
        self.embedding_dim
    }

    async fn query(
        &self,
        embedding: &[f32],
        n_results: usize,
        filter_key: &str,
    ) -> AppResult<SearchResult> {
        check_filter_key(filter_key)?;
        check_dimensions(self.embedding_dim, embedding.len(), "Query embedding")?;

        let mut result = SearchResult::default();

        // Vector search over an empty table errors in LanceDB
        if n_results == 0 || self.count().await? == 0 {
            return Ok(result);
        }

        let batches: Vec<RecordBatch> = self
            .table
            .query()
            .nearest_to(embedding.to_vec())
            .map_err(|e| AppError::Retrieval(format!("Failed to create query: {}", e)))?
            .column(VECTOR_COLUMN)
            .distance_type(DistanceType::Cosine)
            .only_if(format!("{} = true", filter_key))
            .limit(n_results)
            .execute()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to execute search: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to collect results: {}", e)))?;

        for batch in &batches {
            Self::read_batch(batch, &mut result)?;
        }

        tracing::debug!(
            filter_key,
            batches = batches.len(),
            returned = result.len(),
            "LanceDB query complete"
        );

        Ok(result)
    }

    async fn count(&self) -> AppResult<usize> {
        self.table
            .count_rows(None)
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to count rows: {}", e)))
    }

    async fn insert_chunks(&self, chunks: &[DocumentChunk]) -> AppResult<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let batch = self.chunks_to_batch(chunks)?;
        let schema = batch.schema();

        // Re-imported ids replace their old rows
        self.delete_ids(chunks).await?;

        self.table
            .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
            .execute()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to add chunks: {}", e)))?;

        tracing::debug!("Inserted {} chunks into LanceDB", chunks.len());
        Ok(chunks.len())
    }
}
