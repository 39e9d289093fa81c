//! Answer generation through the configured LLM client.

use crate::confidence::{ConfidenceScorer, SourceAttribution};
use crate::types::SearchResult;
use docgate_core::{AppError, AppResult};
use docgate_llm::{LlmClient, LlmRequest};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Number of excerpts joined into a fallback answer.
const FALLBACK_EXCERPTS: usize = 2;
/// Number of references given to an explained answer.
const EXPLANATION_REFERENCES: usize = 3;

/// Answer that walks through how it was reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainedAnswer {
    pub answer: String,
    pub explanation: String,
    pub sources: Vec<SourceAttribution>,
}

/// Calls the LLM with a built prompt under a timeout.
#[derive(Clone)]
pub struct AnswerGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl AnswerGenerator {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: 0.5,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn client(&self) -> &Arc<dyn LlmClient> {
        &self.client
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generated answer text for `prompt`, trimmed.
    ///
    /// Provider failures and timeouts are `AppError::Llm`.
    pub async fn generate(&self, prompt: &str, max_tokens: u32) -> AppResult<String> {
        tracing::debug!(
            "Generating answer with {} (model: {}, max_tokens: {})",
            self.client.provider_name(),
            self.model,
            max_tokens
        );

        let request = LlmRequest::new(prompt, &self.model)
            .with_max_tokens(max_tokens)
            .with_temperature(self.temperature);

        let response = tokio::time::timeout(self.timeout, self.client.complete(&request))
            .await
            .map_err(|_| {
                AppError::Llm(format!(
                    "Generation timed out after {}s",
                    self.timeout.as_secs_f64()
                ))
            })??;

        tracing::debug!(
            "Generation used {} tokens",
            response.usage.total_tokens
        );

        Ok(response.content.trim().to_string())
    }

    /// Answer over the top references with a step-by-step explanation.
    ///
    /// An empty result answers without calling the model.
    pub async fn generate_with_explanation(
        &self,
        query: &str,
        result: &SearchResult,
        scorer: &ConfidenceScorer,
        max_tokens: u32,
    ) -> AppResult<ExplainedAnswer> {
        if result.is_empty() {
            return Ok(ExplainedAnswer {
                answer: "No relevant documents found.".to_string(),
                explanation: "No relevant information available.".to_string(),
                sources: Vec::new(),
            });
        }

        let top = result.take(EXPLANATION_REFERENCES);
        let references: Vec<String> = top
            .documents()
            .iter()
            .enumerate()
            .map(|(i, doc)| format!("[Ref {}] {}", i + 1, doc))
            .collect();

        let prompt = format!(
            "Based on the documents provided, answer the user's query with a clear explanation.\n\n\
User Query: {}\n\n\
Available Documents:\n{}\n\n\
Please provide:\n\
1. A clear, direct answer to the query\n\
2. Step-by-step explanation of how you arrived at this answer\n\
3. Key facts from the documents that support your answer\n\n\
Format your response clearly with sections.",
            query,
            references.join("\n\n")
        );

        let answer = self.generate(&prompt, max_tokens).await?;

        Ok(ExplainedAnswer {
            answer,
            explanation: "See answer above for detailed explanation".to_string(),
            sources: scorer.source_scores(top.distances(), top.metadatas()),
        })
    }
}

/// Answer made of the best excerpts, used when no generated answer is available.
pub fn fallback_answer(result: &SearchResult) -> String {
    if result.is_empty() {
        return "No relevant information found.".to_string();
    }

    result
        .documents()
        .iter()
        .take(FALLBACK_EXCERPTS)
        .map(|d| d.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}
