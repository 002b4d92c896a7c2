//! Bounded fan-out/fan-in over the embedding client.
//!
//! Each text is dispatched with its input position; results land in a
//! pre-sized slot vector keyed by that position, never by arrival order.

use crate::embed::EmbeddingClient;
use crate::errors::EmbedError;
use futures::stream::{self, StreamExt};
use tracing::debug;

/// Outcome of one item: a vector or the reason it has none.
pub type EmbedOutcome = Result<Vec<f32>, EmbedError>;

/// Runs at most `concurrency` embedding calls at a time.
#[derive(Clone)]
pub struct EmbeddingPool {
    client: EmbeddingClient,
    concurrency: usize,
}

impl EmbeddingPool {
    pub fn new(client: EmbeddingClient, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Embeds every text and returns one outcome per input, in input order.
    ///
    /// A failing item never cancels the others; all N items always complete.
    pub async fn embed_all(&self, texts: &[String]) -> Vec<EmbedOutcome> {
        debug!(
            "embed_pool::embed_all: total={} concurrency={}",
            texts.len(),
            self.concurrency
        );

        let client = &self.client;
        let mut slots: Vec<Option<EmbedOutcome>> = vec![None; texts.len()];

        let mut completed = stream::iter(texts.iter().enumerate())
            .map(|(i, text)| async move { (i, client.embed(text).await) })
            .buffer_unordered(self.concurrency);

        while let Some((i, outcome)) = completed.next().await {
            slots[i] = Some(outcome);
        }

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| Err(EmbedError::service("no result recorded"))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::{EmbedFuture, EmbeddingsProvider};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Echoes the numeric text as a vector after a delay that shrinks with the index.
    struct Reversed {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl EmbeddingsProvider for Reversed {
        fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a> {
            Box::pin(async move {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);

                let n: u64 = text.parse().map_err(|_| EmbedError::service("not a number"))?;
                tokio::time::sleep(Duration::from_millis(((n * 7) % 11) * 3)).await;

                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                if n % 5 == 4 {
                    return Err(EmbedError::service(format!("boom {n}")));
                }
                Ok(vec![n as f32])
            })
        }
    }

    #[tokio::test]
    async fn keeps_input_order_and_isolates_failures() {
        let provider = Arc::new(Reversed {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let client = EmbeddingClient::new(provider.clone(), Duration::from_secs(5));
        let pool = EmbeddingPool::new(client, 4);

        let texts: Vec<String> = (0..40).map(|i| i.to_string()).collect();
        let out = pool.embed_all(&texts).await;

        assert_eq!(out.len(), texts.len());
        for (i, r) in out.iter().enumerate() {
            if i % 5 == 4 {
                assert_eq!(r, &Err(EmbedError::Service(format!("boom {i}"))));
            } else {
                assert_eq!(r, &Ok(vec![i as f32]));
            }
        }
        let peak = provider.peak.load(Ordering::SeqCst);
        assert!(peak <= 4, "peak in-flight {peak} exceeded limit");
        assert!(peak > 1, "pool never ran calls concurrently");
    }

    #[tokio::test]
    async fn empty_batch_and_empty_text() {
        let provider = Arc::new(Reversed {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let pool = EmbeddingPool::new(
            EmbeddingClient::new(provider, Duration::from_secs(5)),
            0,
        );
        assert_eq!(pool.concurrency(), 1);
        assert!(pool.embed_all(&[]).await.is_empty());

        let out = pool.embed_all(&["1".into(), " ".into()]).await;
        assert_eq!(out, vec![Ok(vec![1.0]), Err(EmbedError::EmptyInput)]);
    }
}
