//! Configuration management for docgate.
//!
//! Configuration is merged from several sources, later ones winning:
//! - Built-in defaults
//! - The workspace config file (`.docgate/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! The confidence thresholds used by the scorer and by the per-source quality
//! labels live here, in one place, so they can be recalibrated from YAML.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Generation providers the factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "openrouter"];

/// Embedding providers the knowledge crate knows how to build.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["trigram", "ollama"];

/// Environment variable consulted for the OpenRouter key when no provider
/// config names one.
pub const OPENROUTER_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docgate/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Text-generation provider ("ollama", "openrouter")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// API key for the generation provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Provider configurations from config.yaml
    pub llm: Option<LlmConfig>,

    /// Query embedding settings
    pub embedding: EmbeddingSettings,

    /// Vector store location
    pub store: StoreSettings,

    /// Answer pipeline behaviour
    pub pipeline: PipelineSettings,

    /// Confidence calibration
    pub confidence: ConfidenceThresholds,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenRouter {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
        timeout: Option<u64>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenRouter { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Custom endpoint, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::OpenRouter { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }

    /// HTTP timeout in seconds, if configured.
    pub fn timeout(&self) -> Option<u64> {
        match self {
            Self::OpenRouter { timeout, .. } | Self::Ollama { timeout, .. } => *timeout,
        }
    }
}

/// Embedding provider settings.
///
/// The dimension must match the vector store the chunks were indexed into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Endpoint for remote providers
    pub endpoint: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreSettings {
    /// LanceDB directory, relative to the workspace unless absolute
    pub path: PathBuf,

    /// Table holding the document chunks
    pub table: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".docgate/vectorstore"),
            table: "company_documents".to_string(),
        }
    }
}

/// Answer pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineSettings {
    /// Candidates retrieved per query
    pub n_results: usize,

    /// Leading candidates placed in the prompt and cited as sources
    pub context_size: usize,

    /// Ask the generator to cite sources in general answers
    pub include_citations: bool,

    /// Call the generation provider; when off, answers are document excerpts
    pub enable_generation: bool,

    /// Run the LLM reranking stage
    pub enable_reranking: bool,

    /// Candidates kept after reranking
    pub rerank_top_k: usize,

    /// Default token budget for answers
    pub answer_max_tokens: u32,

    /// Sampling temperature for answers
    pub answer_temperature: f32,

    /// Token budget for the ranking reply
    pub rerank_max_tokens: u32,

    /// Sampling temperature for the ranking reply
    pub rerank_temperature: f32,

    /// Upper bound on one answer generation call
    pub generation_timeout_secs: u64,

    /// Upper bound on one rerank call
    pub rerank_timeout_secs: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            n_results: 5,
            context_size: 3,
            include_citations: true,
            enable_generation: true,
            enable_reranking: false,
            rerank_top_k: 3,
            answer_max_tokens: 400,
            answer_temperature: 0.5,
            rerank_max_tokens: 50,
            rerank_temperature: 0.1,
            generation_timeout_secs: 30,
            rerank_timeout_secs: 15,
        }
    }
}

/// Calibration constants for confidence levels and source quality labels.
///
/// A value at or above `high` is HIGH, at or above `medium` is MEDIUM, at or
/// above `low` is LOW, anything else VERY_LOW.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfidenceThresholds {
    pub high: f64,
    pub medium: f64,
    pub low: f64,

    /// Result count below which the score is scaled down proportionally
    pub min_expected_results: usize,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: 0.7,
            medium: 0.5,
            low: 0.3,
            min_expected_results: 3,
        }
    }
}

impl ConfidenceThresholds {
    /// Check that thresholds are ordered and the expected count is usable.
    pub fn validate(&self) -> AppResult<()> {
        if !(self.low <= self.medium && self.medium <= self.high) {
            return Err(AppError::Config(format!(
                "Confidence thresholds must satisfy low <= medium <= high (got {}, {}, {})",
                self.low, self.medium, self.high
            )));
        }

        if self.min_expected_results == 0 {
            return Err(AppError::Config(
                "minExpectedResults must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    embedding: Option<EmbeddingSettings>,
    store: Option<StoreSettings>,
    pipeline: Option<PipelineSettings>,
    confidence: Option<ConfidenceThresholds>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            embedding: EmbeddingSettings::default(),
            store: StoreSettings::default(),
            pipeline: PipelineSettings::default(),
            confidence: ConfidenceThresholds::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, the config file and defaults.
    ///
    /// Environment variables:
    /// - `DOCGATE_WORKSPACE`: Override workspace path
    /// - `DOCGATE_CONFIG`: Path to config file
    /// - `DOCGATE_PROVIDER`: Generation provider
    /// - `DOCGATE_MODEL`: Generation model
    /// - `DOCGATE_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("DOCGATE_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("DOCGATE_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.docgate_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("DOCGATE_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("DOCGATE_MODEL") {
            config.model = model;
        }

        if let Ok(key) = std::env::var("DOCGATE_API_KEY") {
            config.api_key = Some(key);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }

        if let Some(store) = config_file.store {
            result.store = store;
        }

        if let Some(pipeline) = config_file.pipeline {
            result.pipeline = pipeline;
        }

        if let Some(confidence) = config_file.confidence {
            result.confidence = confidence;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .docgate directory.
    pub fn docgate_dir(&self) -> PathBuf {
        self.workspace.join(".docgate")
    }

    /// Ensure the .docgate directory exists.
    pub fn ensure_docgate_dir(&self) -> AppResult<()> {
        let dir = self.docgate_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .docgate directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Directory holding the vector store.
    pub fn store_path(&self) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            self.workspace.join(&self.store.path)
        }
    }

    /// Directory searched for prompt template overrides.
    pub fn prompts_dir(&self) -> PathBuf {
        self.docgate_dir().join("prompts")
    }

    /// Get a provider configuration by name.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider))
    }

    /// Endpoint configured for a provider.
    pub fn provider_endpoint(&self, provider: &str) -> Option<String> {
        self.get_provider_config(provider)
            .and_then(|pc| pc.endpoint())
            .map(str::to_string)
    }

    /// Resolve the API key for a provider.
    ///
    /// Order: explicit `DOCGATE_API_KEY`, the provider's `apiKeyEnv`, then
    /// `OPENROUTER_API_KEY` for the OpenRouter provider.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        if let Some(ProviderConfig::OpenRouter { api_key_env, .. }) =
            self.get_provider_config(provider)
        {
            if let Ok(key) = std::env::var(api_key_env) {
                return Some(key);
            }
        }

        if provider.eq_ignore_ascii_case("openrouter") {
            return std::env::var(OPENROUTER_KEY_ENV).ok();
        }

        None
    }

    /// Validate configuration for the active provider and pipeline.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.to_lowercase();
        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider == "openrouter"
            && self.pipeline.enable_generation
            && self.resolve_api_key(&provider).is_none()
        {
            return Err(AppError::Config(format!(
                "OpenRouter API key not found. Set {} or DOCGATE_API_KEY",
                OPENROUTER_KEY_ENV
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if self.pipeline.context_size == 0 || self.pipeline.n_results == 0 {
            return Err(AppError::Config(
                "nResults and contextSize must be greater than zero".to_string(),
            ));
        }

        self.confidence.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.pipeline.n_results, 5);
        assert_eq!(config.pipeline.context_size, 3);
        assert_eq!(config.confidence.high, 0.7);
        assert_eq!(config.confidence.medium, 0.5);
        assert_eq!(config.confidence.low, 0.3);
        assert!(!config.verbose);
    }

    #[test]
    fn test_docgate_dir() {
        let config = AppConfig::default();
        assert!(config.docgate_dir().ends_with(".docgate"));
        assert!(config.store_path().ends_with(".docgate/vectorstore"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("openrouter".to_string()),
            Some("mistralai/mistral-7b-instruct:free".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "openrouter");
        assert_eq!(overridden.model, "mistralai/mistral-7b-instruct:free");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_sections() {
        let yaml = r#"
llm:
  activeProvider: ollama
  providers:
    ollama:
      endpoint: "http://gpu-box:11434"
      model: mistral
      timeout: 20
pipeline:
  enableReranking: true
  contextSize: 2
confidence:
  high: 0.8
"#;
        let merged = AppConfig::default().merge_yaml_str(yaml).unwrap();

        assert_eq!(merged.model, "mistral");
        assert_eq!(
            merged.provider_endpoint("ollama").as_deref(),
            Some("http://gpu-box:11434")
        );
        assert!(merged.pipeline.enable_reranking);
        assert_eq!(merged.pipeline.context_size, 2);
        // Unspecified fields keep their defaults
        assert_eq!(merged.pipeline.n_results, 5);
        assert_eq!(merged.confidence.high, 0.8);
        assert_eq!(merged.confidence.medium, 0.5);
    }

    #[test]
    fn test_merge_yaml_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "store:\n  table: handbook\n").unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.store.table, "handbook");
        assert_eq!(merged.store.path, PathBuf::from(".docgate/vectorstore"));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let config = AppConfig {
            provider: "unknown".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_threshold_order() {
        let mut config = AppConfig::default();
        config.confidence.medium = 0.9;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("low <= medium <= high"));
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let config = AppConfig {
            api_key: Some("sk-test".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.resolve_api_key("openrouter").as_deref(), Some("sk-test"));
    }
}
