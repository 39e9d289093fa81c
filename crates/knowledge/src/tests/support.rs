//! Scripted providers and fixtures for pipeline tests.

use crate::embeddings::EmbeddingProvider;
use crate::store::{InMemoryVectorStore, VectorStore};
use crate::types::{ChunkMetadata, DocumentChunk};
use crate::Pipeline;
use docgate_core::{AppError, AppResult, PipelineSettings};
use docgate_llm::{LlmClient, LlmRequest, LlmResponse};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replies from a queue, then repeats `default`. Records every prompt.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<AppResult<String>>>,
    default: String,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn answering(default: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            default: default.to_string(),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn then(self, reply: AppResult<&str>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(reply.map(str::to_string));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.default.clone()));

        reply.map(|content| LlmResponse {
            content,
            model: request.model.clone(),
            usage: Default::default(),
        })
    }
}

/// Never answers within any reasonable timeout.
pub struct SlowLlm;

#[async_trait::async_trait]
impl LlmClient for SlowLlm {
    fn provider_name(&self) -> &str {
        "slow"
    }

    async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(AppError::Llm("too late".to_string()))
    }
}

/// Embeds every text to the same vector, so distances depend only on the
/// stored chunk vectors.
#[derive(Debug)]
pub struct FixedEmbedder(pub Vec<f32>);

#[async_trait::async_trait]
impl EmbeddingProvider for FixedEmbedder {
    fn provider_name(&self) -> &str {
        "fixed"
    }

    fn model_name(&self) -> &str {
        "fixed"
    }

    fn dimensions(&self) -> usize {
        self.0.len()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| self.0.clone()).collect())
    }
}

/// Query vector used with [`FixedEmbedder`].
pub const QUERY: [f32; 2] = [1.0, 0.0];

/// Chunk vector at cosine distance `distance` from [`QUERY`].
pub fn at_distance(distance: f32) -> Vec<f32> {
    let cos = 1.0 - distance;
    vec![cos, (1.0 - cos * cos).max(0.0).sqrt()]
}

pub fn chunk(id: &str, text: &str, distance: f32, roles: &[&str]) -> DocumentChunk {
    let mut metadata = ChunkMetadata::for_roles(&format!("{}.md", id), roles);
    metadata.section_title = format!("{} section", id);
    metadata.flags.role_admin = true;
    DocumentChunk {
        id: id.to_string(),
        text: text.to_string(),
        embedding: at_distance(distance),
        metadata,
    }
}

/// Company corpus: baseline handbook, engineering and finance content.
pub fn company_chunks() -> Vec<DocumentChunk> {
    vec![
        chunk(
            "handbook",
            "Remote work is allowed up to three days per week.",
            0.1,
            &["employee"],
        ),
        chunk(
            "runbook",
            "Deployments run every Tuesday after the change review.",
            0.2,
            &["engineering"],
        ),
        chunk(
            "quarterly_report",
            "Q3 revenue grew 12 percent year over year.",
            0.05,
            &["finance"],
        ),
        chunk(
            "benefits",
            "Health insurance covers dependants from the first day.",
            0.25,
            &["employee"],
        ),
    ]
}

pub async fn store_with(chunks: &[DocumentChunk]) -> Arc<InMemoryVectorStore> {
    let store = Arc::new(InMemoryVectorStore::new(QUERY.len()));
    store.insert_chunks(chunks).await.unwrap();
    store
}

pub async fn pipeline_with(
    chunks: &[DocumentChunk],
    llm: Arc<dyn LlmClient>,
    settings: PipelineSettings,
) -> Pipeline {
    Pipeline::builder(
        Arc::new(FixedEmbedder(QUERY.to_vec())),
        store_with(chunks).await,
        llm,
    )
    .model("test-model")
    .settings(settings)
    .build()
    .unwrap()
}
