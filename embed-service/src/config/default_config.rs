//! Embedding configs loaded from environment variables.
//!
//! # Environment variables
//!
//! - `EMBEDDING_PROVIDER`     = `openai` (default) | `ollama`
//! - `EMBEDDING_MODEL`        = model id (default `text-embedding-3-small` for OpenAI, required for Ollama)
//! - `EMBEDDING_ENDPOINT`     = base URL (defaults per provider; `OLLAMA_URL` is honoured for Ollama)
//! - `OPENAI_API_KEY`         = bearer token (required for OpenAI)
//! - `EMBEDDING_DIM`          = optional expected dimensionality
//! - `EMBEDDING_TIMEOUT_SECS` = optional request timeout (default 30)

use crate::{
    config::{embedding_config::EmbeddingModelConfig, provider::EmbeddingProviderKind},
    error_handler::{
        ConfigError, EmbedServiceError, env_opt_u64, must_env, opt_env, validate_http_endpoint,
    },
};

/// Model used by the OpenAI provider when `EMBEDDING_MODEL` is unset.
pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";

/// Builds the embedding config for whichever provider `EMBEDDING_PROVIDER` selects.
///
/// # Errors
/// - [`ConfigError::UnsupportedProvider`] for unknown providers
/// - [`ConfigError::MissingVar`] when a required variable is absent
/// - [`ConfigError::InvalidNumber`] / [`ConfigError::InvalidFormat`] on bad values
pub fn config_from_env() -> Result<EmbeddingModelConfig, EmbedServiceError> {
    let provider = match opt_env("EMBEDDING_PROVIDER") {
        Some(raw) => raw.parse::<EmbeddingProviderKind>()?,
        None => EmbeddingProviderKind::OpenAI,
    };

    match provider {
        EmbeddingProviderKind::OpenAI => config_openai_embedding(),
        EmbeddingProviderKind::Ollama => config_ollama_embedding(),
    }
}

/// Constructs a config for an OpenAI-compatible embedding endpoint.
///
/// # Defaults
/// - `model = text-embedding-3-small`
/// - `endpoint = https://api.openai.com`
/// - `timeout_secs = 30`
pub fn config_openai_embedding() -> Result<EmbeddingModelConfig, EmbedServiceError> {
    let api_key = must_env("OPENAI_API_KEY")?;
    let model = opt_env("EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
    let endpoint = opt_env("EMBEDDING_ENDPOINT")
        .unwrap_or_else(|| EmbeddingProviderKind::OpenAI.default_endpoint().to_string());

    build(EmbeddingProviderKind::OpenAI, model, endpoint, Some(api_key))
}

/// Constructs a config for an Ollama embedding model.
///
/// `EMBEDDING_MODEL` is mandatory here; there is no sensible default local model.
pub fn config_ollama_embedding() -> Result<EmbeddingModelConfig, EmbedServiceError> {
    let model = must_env("EMBEDDING_MODEL")?;
    let endpoint = opt_env("EMBEDDING_ENDPOINT")
        .or_else(|| opt_env("OLLAMA_URL"))
        .unwrap_or_else(|| EmbeddingProviderKind::Ollama.default_endpoint().to_string());

    build(EmbeddingProviderKind::Ollama, model, endpoint, None)
}

fn build(
    provider: EmbeddingProviderKind,
    model: String,
    endpoint: String,
    api_key: Option<String>,
) -> Result<EmbeddingModelConfig, EmbedServiceError> {
    if model.trim().is_empty() {
        return Err(ConfigError::EmptyModel.into());
    }
    validate_http_endpoint("EMBEDDING_ENDPOINT", &endpoint)?;

    let dim = env_opt_u64("EMBEDDING_DIM")?.map(|d| d as usize);
    let timeout_secs = env_opt_u64("EMBEDDING_TIMEOUT_SECS")?.or(Some(30));

    Ok(EmbeddingModelConfig {
        provider,
        model: model.trim().to_string(),
        endpoint: endpoint.trim().to_string(),
        api_key,
        dim,
        timeout_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_rejects_empty_model_and_bad_scheme() {
        let err = build(
            EmbeddingProviderKind::Ollama,
            "  ".into(),
            "http://localhost:11434".into(),
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EmbedServiceError::Config(ConfigError::EmptyModel)
        ));

        let err = build(
            EmbeddingProviderKind::Ollama,
            "bge-m3".into(),
            "localhost:11434".into(),
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EmbedServiceError::Config(ConfigError::InvalidFormat { .. })
        ));
    }
}
