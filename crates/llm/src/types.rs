//! Provider identification.

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Ollama,
    OpenRouter,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openrouter" | "open-router" => Some(Self::OpenRouter),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenRouter => "openrouter",
        }
    }

    /// Whether the provider needs an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenRouter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!(ProviderType::parse("ollama"), Some(ProviderType::Ollama));
        assert_eq!(ProviderType::parse("OpenRouter"), Some(ProviderType::OpenRouter));
        assert_eq!(ProviderType::parse("open-router"), Some(ProviderType::OpenRouter));
        assert_eq!(ProviderType::parse("claude"), None);
    }

    #[test]
    fn test_requires_api_key() {
        assert!(ProviderType::OpenRouter.requires_api_key());
        assert!(!ProviderType::Ollama.requires_api_key());
    }
}
