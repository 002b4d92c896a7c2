//! Lightweight Ollama client for embeddings.
//!
//! - `POST {endpoint}/api/embeddings` with `{ model, prompt }`
//!
//! It uses [`EmbeddingModelConfig`] and ensures that the selected provider is
//! [`EmbeddingProviderKind::Ollama`].

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::config::embedding_config::EmbeddingModelConfig;
use crate::config::provider::EmbeddingProviderKind;
use crate::error_handler::{
    EmbedServiceError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
};

/// Thin client for Ollama embeddings.
///
/// Reuses one HTTP client with the configured timeout.
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: EmbeddingModelConfig,
    url_embeddings: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not Ollama
    /// - `InvalidEndpoint` if `cfg.endpoint` is empty or has no http/https scheme
    /// - [`EmbedServiceError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: EmbeddingModelConfig) -> Result<Self, EmbedServiceError> {
        if cfg.provider != EmbeddingProviderKind::Ollama {
            return Err(
                ProviderError::new(Provider::Ollama, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let base = cfg.base_url();
        if base.is_empty() || !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .brotli(true)
            .build()?;

        let url_embeddings = format!("{}/api/embeddings", base);

        Ok(Self {
            client,
            cfg,
            url_embeddings,
        })
    }

    /// Retrieves one embedding via `/api/embeddings`.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`EmbedServiceError::HttpTransport`] for client/network failures
    /// - `Decode` if the response cannot be parsed or the vector is empty
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, EmbedServiceError> {
        let started = Instant::now();
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            prompt: input,
        };

        debug!(input_len = input.len(), "POST {}", self.url_embeddings);
        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_embeddings.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            error!(
                %status,
                %url,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "Ollama /api/embeddings returned non-success status"
            );
            return Err(ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let out: EmbeddingsResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `{{ embedding: number[] }}`"
                )),
            )
        })?;

        if out.embedding.is_empty() {
            return Err(ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode("empty `embedding` in response".into()),
            )
            .into());
        }

        debug!(
            dim = out.embedding.len(),
            latency_ms = started.elapsed().as_millis(),
            "embeddings completed"
        );
        Ok(out.embedding)
    }
}

/// Request body for `/api/embeddings`.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response body for `/api/embeddings`.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}
