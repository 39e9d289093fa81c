//! Optional LLM re-ranking of retrieved chunks.
//!
//! A reranker never fails the query: any provider error, timeout or
//! unusable reply leaves the search result as it was.

use crate::types::SearchResult;
use docgate_llm::{LlmClient, LlmRequest};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use unicode_segmentation::UnicodeSegmentation;

const PREVIEW_GRAPHEMES: usize = 200;
const SCORE_DOCUMENT_GRAPHEMES: usize = 300;
/// Relevance reported when the model gives no usable number.
pub const DEFAULT_RELEVANCE: f64 = 50.0;

/// Reorders a search result by relevance to the query.
#[async_trait::async_trait]
pub trait Reranker: Send + Sync {
    /// At most `top_k` entries of `result`, best first. Lists stay aligned.
    async fn rerank(&self, query: &str, result: SearchResult, top_k: usize) -> SearchResult;
}

/// Asks the generation model for a ranking of the candidates.
pub struct LlmReranker {
    client: Arc<dyn LlmClient>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl LlmReranker {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens: 50,
            temperature: 0.1,
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Relevance of one document to `query` on a 0-100 scale.
    ///
    /// Replies are clamped to the scale. Provider errors, timeouts and
    /// replies that are not a number give [`DEFAULT_RELEVANCE`].
    pub async fn score_relevance(&self, query: &str, document: &str) -> f64 {
        let prompt = format!(
            "Rate the relevance of the following document to the query on a scale of 0-100.\n\n\
Query: \"{}\"\n\n\
Document: \"{}\"\n\n\
Respond with ONLY a number between 0-100:",
            query,
            document
                .graphemes(true)
                .take(SCORE_DOCUMENT_GRAPHEMES)
                .collect::<String>()
        );
        let request = LlmRequest::new(prompt, &self.model)
            .with_max_tokens(10)
            .with_temperature(0.0);

        match tokio::time::timeout(self.timeout, self.client.complete(&request)).await {
            Ok(Ok(response)) => parse_relevance(&response.content),
            Ok(Err(e)) => {
                tracing::warn!("Relevance scoring failed: {}", e);
                DEFAULT_RELEVANCE
            }
            Err(_) => {
                tracing::warn!("Relevance scoring timed out after {:?}", self.timeout);
                DEFAULT_RELEVANCE
            }
        }
    }
}

fn preview(text: &str) -> String {
    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(PREVIEW_GRAPHEMES).collect();
    if graphemes.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// A 0-100 score from a reply such as " 87\n".
pub fn parse_relevance(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(score) if score.is_finite() => score.clamp(0.0, 100.0),
        _ => DEFAULT_RELEVANCE,
    }
}

/// Ranking prompt listing every candidate with a 1-based number.
pub fn build_rerank_prompt(query: &str, result: &SearchResult) -> String {
    let documents: Vec<String> = result
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "{}. [{} - {}]: {}",
                i + 1,
                hit.metadata.source_document,
                hit.metadata.section_title,
                preview(hit.document)
            )
        })
        .collect();

    format!(
        "You are an expert at ranking document relevance. \
Given a user query and a list of documents, rank them by relevance to the query.\n\n\
User Query: \"{}\"\n\n\
Documents to rank:\n{}\n\n\
Return ONLY a comma-separated list of document numbers in order of relevance \
(most relevant first). For example: 3,1,2\n\n\
ANSWER (ONLY numbers, no explanation):",
        query,
        documents.join("\n")
    )
}

/// 0-based indices from a reply such as "3, 1, 2".
///
/// Tokens that are not positive integers are ignored, as are indices
/// past `len` and repeats. At most `top_k` indices are returned.
pub fn parse_ranking(text: &str, len: usize, top_k: usize) -> Vec<usize> {
    let mut seen = HashSet::new();
    text.split(',')
        .filter_map(|token| token.trim().parse::<usize>().ok())
        .filter(|&n| n >= 1 && n <= len)
        .map(|n| n - 1)
        .filter(|i| seen.insert(*i))
        .take(top_k)
        .collect()
}

#[async_trait::async_trait]
impl Reranker for LlmReranker {
    async fn rerank(&self, query: &str, result: SearchResult, top_k: usize) -> SearchResult {
        if result.len() <= 1 {
            return result;
        }

        let request = LlmRequest::new(build_rerank_prompt(query, &result), &self.model)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        let response =
            match tokio::time::timeout(self.timeout, self.client.complete(&request)).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    tracing::warn!("Reranking failed, keeping search order: {}", e);
                    return result;
                }
                Err(_) => {
                    tracing::warn!(
                        "Reranking timed out after {:?}, keeping search order",
                        self.timeout
                    );
                    return result;
                }
            };

        let order = parse_ranking(&response.content, result.len(), top_k);
        if order.is_empty() {
            tracing::warn!(
                reply = %response.content.trim(),
                "Reranker reply had no usable indices, keeping search order"
            );
            return result;
        }

        tracing::debug!(?order, "Reranked results");
        result.select(&order)
    }
}
