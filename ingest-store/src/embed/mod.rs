//! Embedding boundary: the provider trait and the per-item client around it.

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use tracing::warn;

use crate::errors::EmbedError;

pub mod remote;

/// Boxed future returned by [`EmbeddingsProvider::embed`].
pub type EmbedFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<f32>, EmbedError>> + Send + 'a>>;

/// Asynchronous embedding provider.
///
/// Implement this trait to plug in an embedding backend (remote API, local
/// model, test stub). One call is one outbound request; implementations must
/// not retry and must not hold shared mutable state across calls.
pub trait EmbeddingsProvider: Send + Sync {
    /// Produces an embedding vector for the given text.
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a>;

    /// Short name used in diagnostics.
    fn name(&self) -> &str {
        "embedding service"
    }
}

/// Per-item embedding client.
///
/// Rejects empty input before any remote call, bounds every call with a
/// timeout and folds every other failure into [`EmbedError::Service`].
#[derive(Clone)]
pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingsProvider>,
    timeout: Duration,
    expected_dim: Option<usize>,
}

impl EmbeddingClient {
    pub fn new(provider: Arc<dyn EmbeddingsProvider>, timeout: Duration) -> Self {
        Self {
            provider,
            timeout,
            expected_dim: None,
        }
    }

    /// Enforces a vector size; mismatches become [`EmbedError::Service`].
    pub fn with_expected_dim(mut self, dim: usize) -> Self {
        self.expected_dim = Some(dim);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Embeds one text.
    ///
    /// # Errors
    /// - [`EmbedError::EmptyInput`] for empty/whitespace-only text (no call made).
    /// - [`EmbedError::Service`] for provider failures, timeouts and size mismatches.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if text.trim().is_empty() {
            return Err(EmbedError::EmptyInput);
        }

        let result = match tokio::time::timeout(self.timeout, self.provider.embed(text)).await {
            Ok(Ok(v)) => self.check_dim(v),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(EmbedError::service(format!(
                "timed out after {}ms",
                self.timeout.as_millis()
            ))),
        };

        if let Err(EmbedError::Service(cause)) = &result {
            warn!(
                provider = %self.provider.name(),
                text_len = text.len(),
                %cause,
                "embedding call failed"
            );
        }
        result
    }

    fn check_dim(&self, v: Vec<f32>) -> Result<Vec<f32>, EmbedError> {
        if v.is_empty() {
            return Err(EmbedError::service("provider returned an empty vector"));
        }
        match self.expected_dim {
            Some(want) if v.len() != want => Err(EmbedError::service(format!(
                "vector size mismatch: got {}, want {want}",
                v.len()
            ))),
            _ => Ok(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        calls: AtomicUsize,
        delay: Duration,
        out: Result<Vec<f32>, EmbedError>,
    }

    impl Fixed {
        fn new(out: Result<Vec<f32>, EmbedError>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                out,
            }
        }
    }

    impl EmbeddingsProvider for Fixed {
        fn embed<'a>(&'a self, _text: &'a str) -> EmbedFuture<'a> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(self.delay).await;
                self.out.clone()
            })
        }
    }

    #[tokio::test]
    async fn empty_input_never_reaches_provider() {
        let p = Arc::new(Fixed::new(Ok(vec![1.0])));
        let client = EmbeddingClient::new(p.clone(), Duration::from_secs(1));
        assert_eq!(client.embed("  \n\t").await, Err(EmbedError::EmptyInput));
        assert_eq!(p.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_a_service_error() {
        let mut slow = Fixed::new(Ok(vec![1.0]));
        slow.delay = Duration::from_secs(60);
        let client = EmbeddingClient::new(Arc::new(slow), Duration::from_secs(2));
        match client.embed("text").await {
            Err(EmbedError::Service(cause)) => assert!(cause.contains("timed out")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn dimension_mismatch_is_a_service_error() {
        let client =
            EmbeddingClient::new(Arc::new(Fixed::new(Ok(vec![1.0, 2.0]))), Duration::from_secs(1))
                .with_expected_dim(3);
        assert!(matches!(
            client.embed("text").await,
            Err(EmbedError::Service(_))
        ));
    }

    #[tokio::test]
    async fn provider_errors_pass_through() {
        let p = Fixed::new(Err(EmbedError::service("HTTP 429")));
        let client = EmbeddingClient::new(Arc::new(p), Duration::from_secs(1));
        assert_eq!(
            client.embed("text").await,
            Err(EmbedError::Service("HTTP 429".into()))
        );
    }
}
