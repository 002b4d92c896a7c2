//! Remote embedding provider backed by `embed-service`.

use std::sync::Arc;

use embed_service::EmbeddingService;

use crate::embed::{EmbedFuture, EmbeddingsProvider};
use crate::errors::EmbedError;

/// Adapts the shared [`EmbeddingService`] to [`EmbeddingsProvider`].
#[derive(Clone)]
pub struct RemoteEmbedder {
    svc: Arc<EmbeddingService>,
    name: String,
}

impl RemoteEmbedder {
    pub fn new(svc: Arc<EmbeddingService>) -> Self {
        let cfg = svc.config();
        let name = format!("embedding service ({} {})", cfg.provider, cfg.model);
        Self { svc, name }
    }
}

impl EmbeddingsProvider for RemoteEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a> {
        Box::pin(async move {
            self.svc
                .embed(text)
                .await
                .map_err(|e| EmbedError::Service(e.to_string()))
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
