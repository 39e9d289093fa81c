//! Role-aware question answering.
//!
//! The pipeline validates the role, retrieves permitted chunks, scores
//! confidence, optionally reranks, builds a prompt and generates an answer.
//! Every failure after construction becomes a well-formed
//! [`PipelineResponse`]; [`Pipeline::answer_query`] never returns an error.

use crate::confidence::{add_disclaimer, ConfidenceResult, ConfidenceScorer, SourceAttribution};
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::generation::{fallback_answer, AnswerGenerator};
use crate::normalize::normalize;
use crate::rerank::{LlmReranker, Reranker};
use crate::retrieval::Retriever;
use crate::roles::Role;
use crate::store::{LanceDbStore, VectorStore};
use crate::types::SearchResult;
use docgate_core::{AppConfig, AppResult, ConfidenceThresholds, PipelineSettings};
use docgate_llm::{create_client_from_config, LlmClient};
use docgate_prompt::{detect_query_type, format_context, ContextBlock, PromptBuilder, QueryType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const SEARCH_UNAVAILABLE: &str = "Document search is currently unavailable. Please try again later.";

/// A question asked on behalf of a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub role: String,

    /// Candidates to retrieve; the pipeline default when unset
    pub n_results: Option<usize>,

    pub include_citations: Option<bool>,

    pub max_tokens: Option<u32>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            role: role.into(),
            n_results: None,
            include_citations: None,
            max_tokens: None,
        }
    }

    pub fn with_n_results(mut self, n_results: usize) -> Self {
        self.n_results = Some(n_results);
        self
    }

    pub fn with_citations(mut self, include_citations: bool) -> Self {
        self.include_citations = Some(include_citations);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// How the answer text was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMethod {
    Generated,
    ExcerptFallback,
    NoResults,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub query: String,
    pub role: String,
    pub result_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_type: Option<QueryType>,
    pub method: AnswerMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub answer: String,
    pub sources: Vec<SourceAttribution>,
    pub confidence: ConfidenceResult,
    pub metadata: ResponseMetadata,
}

impl PipelineResponse {
    fn error(query: &str, role: &str, answer: String, error: String) -> Self {
        Self {
            answer,
            sources: Vec::new(),
            confidence: ConfidenceResult::none(),
            metadata: ResponseMetadata {
                query: query.to_string(),
                role: role.to_string(),
                result_count: 0,
                query_type: None,
                method: AnswerMethod::Error,
                error: Some(error),
            },
        }
    }

    /// Answer followed by the numbered sources and the confidence line.
    pub fn render_with_sources(&self) -> String {
        let mut text = self.answer.clone();

        if !self.sources.is_empty() {
            text.push_str("\n\nSources:");
            for source in &self.sources {
                text.push_str(&format!(
                    "\n  [{}] {} - {} ({}, {})",
                    source.rank,
                    source.source,
                    source.section,
                    source.relevance_percent,
                    source.quality
                ));
            }
        }

        text.push_str(&format!(
            "\n\nConfidence: {} ({})",
            self.confidence.level,
            self.confidence.percent()
        ));
        text
    }
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmClient>,
    model: String,
    settings: PipelineSettings,
    thresholds: ConfidenceThresholds,
    prompts: Option<PromptBuilder>,
    reranker: Option<Arc<dyn Reranker>>,
}

impl PipelineBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn thresholds(mut self, thresholds: ConfidenceThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn prompts(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = Some(prompts);
        self
    }

    /// Use a custom reranker. Reranking still requires `enable_reranking`.
    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn build(self) -> AppResult<Pipeline> {
        self.thresholds.validate()?;

        let prompts = match self.prompts {
            Some(prompts) => prompts,
            None => PromptBuilder::new()?,
        };

        let reranker = match (self.settings.enable_reranking, self.reranker) {
            (false, _) => None,
            (true, Some(reranker)) => Some(reranker),
            (true, None) => {
                let reranker: Arc<dyn Reranker> = Arc::new(
                    LlmReranker::new(self.llm.clone(), self.model.clone())
                        .with_max_tokens(self.settings.rerank_max_tokens)
                        .with_temperature(self.settings.rerank_temperature)
                        .with_timeout(Duration::from_secs(self.settings.rerank_timeout_secs)),
                );
                Some(reranker)
            }
        };

        let generator = AnswerGenerator::new(self.llm, self.model)
            .with_temperature(self.settings.answer_temperature)
            .with_timeout(Duration::from_secs(self.settings.generation_timeout_secs));

        Ok(Pipeline {
            retriever: Retriever::new(self.embedder, self.store),
            generator,
            prompts,
            scorer: ConfidenceScorer::new(self.thresholds),
            reranker,
            settings: self.settings,
        })
    }
}

/// Shared question-answering pipeline. Build once and share via `Arc`.
pub struct Pipeline {
    retriever: Retriever,
    generator: AnswerGenerator,
    prompts: PromptBuilder,
    scorer: ConfidenceScorer,
    reranker: Option<Arc<dyn Reranker>>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn builder(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LlmClient>,
    ) -> PipelineBuilder {
        PipelineBuilder {
            embedder,
            store,
            llm,
            model: String::new(),
            settings: PipelineSettings::default(),
            thresholds: ConfidenceThresholds::default(),
            prompts: None,
            reranker: None,
        }
    }

    /// Open the configured store and providers.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let embedder = create_provider(&config.embedding)?;
        let store = LanceDbStore::open(
            &config.store_path(),
            &config.store.table,
            config.embedding.dimensions,
        )
        .await?;
        let llm = create_client_from_config(config)?;
        let prompts = PromptBuilder::with_overrides(&config.prompts_dir())?;

        tracing::info!(
            provider = %config.provider,
            model = %config.model,
            embedding = %config.embedding.provider,
            store = ?config.store_path(),
            "Pipeline initialized"
        );

        Pipeline::builder(embedder, Arc::new(store), llm)
            .model(config.model.clone())
            .settings(config.pipeline.clone())
            .thresholds(config.confidence)
            .prompts(prompts)
            .build()
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        self.retriever.store()
    }

    /// Answer a question for a role.
    pub async fn answer_query(&self, request: QueryRequest) -> PipelineResponse {
        self.run(&request).await.0
    }

    /// Answer text only. A failed generation is replaced by the best excerpts.
    pub async fn answer_simple(&self, query: &str, role: &str) -> String {
        let (response, context) = self.run(&QueryRequest::new(query, role)).await;
        match context {
            Some(context) => fallback_answer(&context),
            None => response.answer,
        }
    }

    /// Answer text followed by sources and confidence.
    pub async fn answer_with_sources(&self, query: &str, role: &str) -> String {
        self.answer_query(QueryRequest::new(query, role))
            .await
            .render_with_sources()
    }

    /// The response, plus the answer context when generation failed.
    async fn run(&self, request: &QueryRequest) -> (PipelineResponse, Option<SearchResult>) {
        let Some(role) = Role::parse(&request.role) else {
            tracing::warn!(role = %request.role, "Rejected query with unknown role");
            let answer = format!(
                "Error: Invalid user role '{}'. Valid roles: {}",
                request.role,
                Role::ALL.map(|r| r.as_str()).join(", ")
            );
            return (
                PipelineResponse::error(
                    &request.query,
                    &request.role,
                    answer,
                    "Invalid role".to_string(),
                ),
                None,
            );
        };

        if normalize(&request.query).is_empty() {
            return (
                PipelineResponse::error(
                    &request.query,
                    role.as_str(),
                    "Error: Query cannot be empty".to_string(),
                    "Empty query".to_string(),
                ),
                None,
            );
        }

        let query = request.query.trim();
        let query_type = detect_query_type(query);
        let n_results = request.n_results.unwrap_or(self.settings.n_results);

        tracing::info!(role = %role, query_type = %query_type, n_results, "Answering query");

        let results = match self.retriever.search(query, role, n_results).await {
            Ok(results) => results,
            Err(e) => {
                tracing::error!("Search failed: {}", e);
                return (
                    PipelineResponse::error(
                        &request.query,
                        role.as_str(),
                        SEARCH_UNAVAILABLE.to_string(),
                        e.to_string(),
                    ),
                    None,
                );
            }
        };

        let metadata = |result_count: usize, method: AnswerMethod, error: Option<String>| {
            ResponseMetadata {
                query: request.query.clone(),
                role: role.as_str().to_string(),
                result_count,
                query_type: Some(query_type),
                method,
                error,
            }
        };

        if results.is_empty() {
            tracing::info!(role = %role, "No accessible documents matched");
            return (
                PipelineResponse {
                    answer: format!(
                        "No documents accessible to role '{}' were found for this query.",
                        role
                    ),
                    sources: Vec::new(),
                    confidence: ConfidenceResult::none(),
                    metadata: metadata(0, AnswerMethod::NoResults, None),
                },
                None,
            );
        }

        let result_count = results.len();
        let confidence = self.scorer.score(results.distances(), result_count);
        tracing::info!(
            results = result_count,
            score = confidence.score,
            level = %confidence.level,
            "Scored retrieval"
        );

        let ranked = match &self.reranker {
            Some(reranker) => {
                reranker
                    .rerank(query, results, self.settings.rerank_top_k)
                    .await
            }
            None => results,
        };

        let context = ranked.take(self.settings.context_size);
        let sources = self
            .scorer
            .source_scores(context.distances(), context.metadatas());

        if !self.settings.enable_generation {
            let answer = add_disclaimer(&fallback_answer(&context), confidence.level);
            return (
                PipelineResponse {
                    answer,
                    sources,
                    confidence,
                    metadata: metadata(result_count, AnswerMethod::ExcerptFallback, None),
                },
                None,
            );
        }

        let blocks: Vec<ContextBlock> = context
            .iter()
            .map(|hit| ContextBlock {
                text: hit.document.to_string(),
                source: hit.metadata.source_document.clone(),
                section: hit.metadata.section_title.clone(),
                distance: hit.distance,
            })
            .collect();

        let include_citations = request
            .include_citations
            .unwrap_or(self.settings.include_citations);
        let max_tokens = request
            .max_tokens
            .unwrap_or(self.settings.answer_max_tokens);

        let generated = match self
            .prompts
            .build(query, &format_context(&blocks), include_citations)
        {
            Ok(prompt) => self.generator.generate(&prompt.text, max_tokens).await,
            Err(e) => Err(e),
        };

        match generated {
            Ok(answer) => {
                tracing::info!(chars = answer.len(), "Generated answer");
                (
                    PipelineResponse {
                        answer: add_disclaimer(&answer, confidence.level),
                        sources,
                        confidence,
                        metadata: metadata(result_count, AnswerMethod::Generated, None),
                    },
                    None,
                )
            }
            Err(e) => {
                tracing::warn!("Answer generation failed: {}", e);
                (
                    PipelineResponse {
                        answer: format!("Error generating answer: {}", e),
                        sources,
                        confidence,
                        metadata: metadata(result_count, AnswerMethod::Error, Some(e.to_string())),
                    },
                    Some(context),
                )
            }
        }
    }
}
