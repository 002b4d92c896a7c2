use std::fmt;
use std::str::FromStr;

use crate::error_handler::ConfigError;

/// Backend that serves embedding requests.
///
/// # Examples
///
/// ```
/// use embed_service::config::provider::EmbeddingProviderKind;
///
/// let kind: EmbeddingProviderKind = "ollama".parse().unwrap();
/// assert_eq!(kind, EmbeddingProviderKind::Ollama);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProviderKind {
    /// OpenAI or any OpenAI-compatible `/v1/embeddings` API.
    OpenAI,
    /// Local Ollama runtime (`/api/embeddings`).
    Ollama,
}

impl EmbeddingProviderKind {
    /// Endpoint used when none is configured.
    pub fn default_endpoint(self) -> &'static str {
        match self {
            EmbeddingProviderKind::OpenAI => "https://api.openai.com",
            EmbeddingProviderKind::Ollama => "http://localhost:11434",
        }
    }
}

impl FromStr for EmbeddingProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "open_ai" | "chatgpt" => Ok(EmbeddingProviderKind::OpenAI),
            "ollama" => Ok(EmbeddingProviderKind::Ollama),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

impl fmt::Display for EmbeddingProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingProviderKind::OpenAI => f.write_str("openai"),
            EmbeddingProviderKind::Ollama => f.write_str("ollama"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(
            " OpenAI ".parse::<EmbeddingProviderKind>(),
            Ok(EmbeddingProviderKind::OpenAI)
        );
        assert_eq!(
            "OLLAMA".parse::<EmbeddingProviderKind>(),
            Ok(EmbeddingProviderKind::Ollama)
        );
        assert_eq!(
            "cohere".parse::<EmbeddingProviderKind>(),
            Err(ConfigError::UnsupportedProvider("cohere".into()))
        );
    }
}
