//! LLM integration crate for docgate.
//!
//! Provides a provider-agnostic completion interface used for answer
//! generation and reranking. Providers sit behind the [`LlmClient`] trait so
//! the answer pipeline never depends on a concrete backend.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenRouter**: Hosted chat-completions API
//!
//! # Example
//! ```no_run
//! use docgate_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, create_client_from_config};
pub use providers::{OllamaClient, OpenRouterClient};
pub use types::ProviderType;
