//! LLM provider factory.
//!
//! Resolves a provider name plus endpoint, key and timeout into a shared
//! client.

use crate::client::LlmClient;
use crate::providers::ollama::DEFAULT_OLLAMA_URL;
use crate::providers::{OllamaClient, OpenRouterClient};
use crate::types::ProviderType;
use docgate_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "openrouter")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key, required by OpenRouter
/// * `timeout` - Per-request HTTP timeout
///
/// # Errors
/// Returns error if the provider is unknown or a required key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or(DEFAULT_OLLAMA_URL);
            Ok(Arc::new(OllamaClient::with_timeout(base_url, timeout)?))
        }
        ProviderType::OpenRouter => {
            let key = api_key.ok_or_else(|| {
                AppError::Config("OpenRouter provider requires API key".to_string())
            })?;
            let client = match endpoint {
                Some(url) => OpenRouterClient::with_endpoint(url, key, timeout)?,
                None => OpenRouterClient::new(key, timeout)?,
            };
            Ok(Arc::new(client))
        }
    }
}

/// Create the generation client described by the application config.
pub fn create_client_from_config(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let provider = config.provider.as_str();
    let timeout = config
        .get_provider_config(provider)
        .and_then(|pc| pc.timeout())
        .unwrap_or(config.pipeline.generation_timeout_secs);

    tracing::debug!(provider, model = %config.model, "Creating LLM client");

    create_client(
        provider,
        config.provider_endpoint(provider).as_deref(),
        config.resolve_api_key(provider).as_deref(),
        Duration::from_secs(timeout),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(30);

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None, TIMEOUT).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client("ollama", Some("http://localhost:8080"), None, TIMEOUT);
        assert!(client.is_ok());
    }

    #[test]
    fn test_openrouter_requires_api_key() {
        match create_client("openrouter", None, None, TIMEOUT) {
            Err(err) => assert!(err.to_string().contains("requires API key")),
            Ok(_) => panic!("Expected error for OpenRouter without API key"),
        }
    }

    #[test]
    fn test_create_openrouter_client() {
        let client = create_client("openrouter", None, Some("sk-or-test"), TIMEOUT).unwrap();
        assert_eq!(client.provider_name(), "openrouter");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None, TIMEOUT) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }

    #[test]
    fn test_from_default_config() {
        let client = create_client_from_config(&AppConfig::default()).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }
}
