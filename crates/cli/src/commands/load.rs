//! Load command handler.
//!
//! Imports a JSON file of chunks into the configured vector store.

use anyhow::Context;
use clap::Args;
use docgate_core::config::AppConfig;
use docgate_knowledge::{create_provider, import, LanceDbStore};
use std::path::PathBuf;

/// Load precomputed chunks into the vector store
#[derive(Args, Debug)]
pub struct LoadCommand {
    /// JSON file with an array of chunk records
    pub file: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl LoadCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing load command for {:?}", self.file);

        let records = import::read_chunk_file(&self.file)
            .with_context(|| format!("reading chunks from {}", self.file.display()))?;

        let embedder = create_provider(&config.embedding)?;
        let store = LanceDbStore::open(
            &config.store_path(),
            &config.store.table,
            config.embedding.dimensions,
        )
        .await?;

        let stats = import::import_chunks(records, embedder.as_ref(), &store).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!(
                "Loaded {} chunks into {} ({} embedded locally)",
                stats.inserted,
                config.store_path().display(),
                stats.embedded
            );
        }

        Ok(())
    }
}
