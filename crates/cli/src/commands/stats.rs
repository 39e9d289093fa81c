//! Stats command handler.
//!
//! Shows what the configured vector store holds.

use clap::Args;
use docgate_core::config::AppConfig;
use docgate_knowledge::{LanceDbStore, VectorStore};

/// Show vector store statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing stats command");

        let path = config.store_path();
        let store =
            LanceDbStore::open(&path, &config.store.table, config.embedding.dimensions).await?;
        let chunks = store.count().await?;

        if self.json {
            let output = serde_json::json!({
                "store": store.name(),
                "path": path,
                "table": config.store.table,
                "chunksCount": chunks,
                "dimensions": store.dimensions(),
                "embeddingProvider": config.embedding.provider,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Store:      {} ({})", path.display(), config.store.table);
            println!("Chunks:     {}", chunks);
            println!(
                "Embeddings: {} ({} dimensions)",
                config.embedding.provider,
                store.dimensions()
            );
        }

        Ok(())
    }
}
