use std::time::Duration;

use crate::config::provider::EmbeddingProviderKind;

/// Configuration for one embedding model endpoint.
///
/// # Fields
///
/// - `provider`: backend serving the model (OpenAI-compatible or Ollama).
/// - `model`: model identifier (e.g. `"text-embedding-3-small"`, `"bge-m3"`).
/// - `endpoint`: base URL without the API path.
/// - `api_key`: bearer token, required for OpenAI.
/// - `dim`: expected vector size; also sent as `dimensions` to OpenAI.
/// - `timeout_secs`: HTTP client timeout per request.
///
/// # Examples
///
/// ```
/// use embed_service::config::embedding_config::EmbeddingModelConfig;
/// use embed_service::config::provider::EmbeddingProviderKind;
///
/// let cfg = EmbeddingModelConfig {
///     provider: EmbeddingProviderKind::Ollama,
///     model: "bge-m3".to_string(),
///     endpoint: "http://localhost:11434".to_string(),
///     api_key: None,
///     dim: Some(1024),
///     timeout_secs: Some(30),
/// };
/// assert_eq!(cfg.timeout().as_secs(), 30);
/// ```
#[derive(Debug, Clone)]
pub struct EmbeddingModelConfig {
    pub provider: EmbeddingProviderKind,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub dim: Option<usize>,
    pub timeout_secs: Option<u64>,
}

impl EmbeddingModelConfig {
    /// Effective HTTP timeout (defaults to 30s).
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(30))
    }

    /// Endpoint with trailing slashes removed.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim().trim_end_matches('/')
    }
}
