//! Shared embedding service over a single configured provider.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Holds one underlying HTTP client for the whole run.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use embed_service::EmbeddingService;
//! use embed_service::config::default_config::config_from_env;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let svc = Arc::new(EmbeddingService::new(config_from_env()?)?);
//!     let emb = svc.embed("Title: Dune\nAuthor: Frank Herbert").await?;
//!     println!("Embedding dim = {}", emb.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error_handler;
pub mod services;

pub use config::embedding_config::EmbeddingModelConfig;
pub use config::provider::EmbeddingProviderKind;
pub use error_handler::EmbedServiceError;

use tracing::info;

use crate::services::{ollama_service::OllamaService, open_ai_service::OpenAiService};

enum Backend {
    OpenAI(OpenAiService),
    Ollama(OllamaService),
}

/// Embedding service bound to one provider/model.
pub struct EmbeddingService {
    cfg: EmbeddingModelConfig,
    backend: Backend,
}

impl EmbeddingService {
    /// Creates the provider-specific client for `cfg`.
    ///
    /// # Errors
    /// Returns [`EmbedServiceError`] if the config is rejected by the provider
    /// client or the HTTP client cannot be built.
    pub fn new(cfg: EmbeddingModelConfig) -> Result<Self, EmbedServiceError> {
        let backend = match cfg.provider {
            EmbeddingProviderKind::OpenAI => Backend::OpenAI(OpenAiService::new(cfg.clone())?),
            EmbeddingProviderKind::Ollama => Backend::Ollama(OllamaService::new(cfg.clone())?),
        };

        info!(
            provider = %cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            "EmbeddingService initialized"
        );

        Ok(Self { cfg, backend })
    }

    /// Config the service was built from.
    pub fn config(&self) -> &EmbeddingModelConfig {
        &self.cfg
    }

    /// Computes one embedding for `input`.
    ///
    /// # Errors
    /// Returns [`EmbedServiceError`] on transport, status or decode failures.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, EmbedServiceError> {
        match &self.backend {
            Backend::OpenAI(cli) => cli.embeddings(input).await,
            Backend::Ollama(cli) => cli.embeddings(input).await,
        }
    }
}
