//! End-to-end ingestion: normalize → preflight → per batch (embed in parallel → upsert).
//!
//! Batches run strictly one after another; inside a batch at most
//! `concurrency` embedding calls are in flight. Only the preflight can fail
//! the run; after it, failures are counted per item or per batch.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{ExistingPolicy, IngestConfig};
use crate::embed::{EmbeddingClient, EmbeddingsProvider};
use crate::embed_pool::EmbeddingPool;
use crate::errors::{EmbedError, IndexError, IngestError};
use crate::index::VectorIndex;
use crate::ledger::{Ledger, corpus_fingerprint};
use crate::normalize::Normalizer;
use crate::progress::Progress;
use crate::record::{IngestUnit, PendingUnit, Record, record_id};
use crate::summary::IngestSummary;

/// Text sent once before the loop to check the service and learn the vector size.
const PROBE_TEXT: &str = "embedding service probe";

/// Drives one ingestion run over explicit provider and index handles.
pub struct Ingestor {
    cfg: IngestConfig,
    provider: Arc<dyn EmbeddingsProvider>,
    index: Arc<dyn VectorIndex>,
}

/// What happened to a single batch.
#[derive(Debug, Default)]
struct BatchOutcome {
    upserted: usize,
    /// Every item is in the index (written now or already present).
    complete: bool,
}

impl Ingestor {
    pub fn new(
        cfg: IngestConfig,
        provider: Arc<dyn EmbeddingsProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            cfg,
            provider,
            index,
        }
    }

    /// Runs the pipeline over `records` (positions as read from the source).
    ///
    /// Cancellation is checked between batches: the batch in flight finishes,
    /// no new batch starts, and the summary is marked `interrupted`.
    ///
    /// # Errors
    /// Only before the first batch: invalid config, an unreachable embedding
    /// service or index, a vector size mismatch, an unusable ledger location.
    pub async fn run(
        &self,
        records: &[Record],
        cancel: &CancellationToken,
        progress: &dyn Progress,
    ) -> Result<IngestSummary, IngestError> {
        let started = Instant::now();
        self.cfg.validate()?;

        let mut summary = IngestSummary {
            records_seen: records.len(),
            ..Default::default()
        };

        let units = self.normalize_all(records, &mut summary);
        info!(
            normalized = summary.normalized,
            incomplete = summary.dropped_incomplete,
            offset = self.cfg.start_offset,
            "normalization done"
        );

        let dim = self.preflight().await?;
        let client = EmbeddingClient::new(self.provider.clone(), self.cfg.embed_timeout)
            .with_expected_dim(dim);
        let pool = EmbeddingPool::new(client, self.cfg.concurrency);

        let mut ledger = match &self.cfg.ledger_path {
            Some(path) => {
                let fp = corpus_fingerprint(&units, self.cfg.batch_size, self.cfg.start_offset);
                Some(Ledger::open(path, &fp, self.cfg.batch_size).await?)
            }
            None => None,
        };

        let batches: Vec<&[PendingUnit]> = units.chunks(self.cfg.batch_size).collect();
        let total = batches.len();
        summary.batches_total = total;
        progress.set_total(total as u64);

        for (k, batch) in batches.into_iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(next_batch = k + 1, batches = total, "cancelled; no new batches will start");
                summary.interrupted = true;
                break;
            }

            if ledger.as_ref().is_some_and(|l| l.is_committed(k)) {
                debug!(batch = k + 1, "batch already committed; skipping");
                summary.batches_resumed += 1;
                progress.step(&format!("batch {}/{} resumed", k + 1, total));
                continue;
            }

            summary.batches_processed += 1;
            let outcome = self.process_batch(k, batch, &pool, &mut summary).await;

            if outcome.complete {
                if let Some(l) = ledger.as_mut() {
                    if let Err(e) = l.commit(k).await {
                        warn!(batch = k + 1, error = %e, "failed to record batch in ledger");
                    }
                }
            }

            let size = self.index.count().await.ok();
            info!(
                batch = k + 1,
                batches = total,
                upserted = outcome.upserted,
                processed = summary.upserted,
                index_size = size,
                elapsed_min = %format!("{:.2}", started.elapsed().as_secs_f64() / 60.0),
                "batch done"
            );
            progress.step(&format!(
                "batch {}/{}: {} upserted",
                k + 1,
                total,
                outcome.upserted
            ));
        }

        summary.index_size = match self.index.count().await {
            Ok(n) => Some(n),
            Err(e) => {
                warn!(error = %e, "final index count failed");
                None
            }
        };
        summary.elapsed = started.elapsed();

        progress.finish(if summary.interrupted {
            "Ingestion interrupted"
        } else {
            "Ingestion complete ✔"
        });
        info!(
            upserted = summary.upserted,
            excluded = summary.exclusions(),
            index_size = summary.index_size,
            interrupted = summary.interrupted,
            "ingestion finished"
        );
        Ok(summary)
    }

    /// Normalizes records from the start offset on; incomplete ones are counted and dropped.
    fn normalize_all(&self, records: &[Record], summary: &mut IngestSummary) -> Vec<PendingUnit> {
        let normalizer = Normalizer::new(
            self.cfg.required_fields.clone(),
            self.cfg.optional_fields.clone(),
        );

        let mut units = Vec::with_capacity(records.len());
        for r in records {
            if r.position < self.cfg.start_offset {
                summary.skipped_by_offset += 1;
                continue;
            }
            match normalizer.normalize(r) {
                Some(text) => units.push(PendingUnit {
                    id: record_id(&self.cfg.id_prefix, r.position),
                    text,
                }),
                None => summary.dropped_incomplete += 1,
            }
        }
        summary.normalized = units.len();
        units
    }

    /// Probes the embedding service and prepares the index.
    ///
    /// Returns the vector size every later embedding must match. Nothing is
    /// written to the index before this succeeds.
    async fn preflight(&self) -> Result<usize, IngestError> {
        let probe = EmbeddingClient::new(self.provider.clone(), self.cfg.embed_timeout);
        let vector = probe
            .embed(PROBE_TEXT)
            .await
            .map_err(|e| IngestError::Unreachable {
                dependency: "embedding service",
                cause: e.to_string(),
            })?;

        let dim = vector.len();
        if let Some(want) = self.cfg.embedding_dim {
            if want != dim {
                return Err(IngestError::Config(format!(
                    "{} returns vectors of size {dim}, configured embedding_dim is {want}",
                    probe.provider_name()
                )));
            }
        }
        debug!(dim, provider = probe.provider_name(), "embedding probe ok");

        self.index.prepare(dim).await.map_err(|e| match e {
            IndexError::VectorSize { got, want, .. } => IngestError::Config(format!(
                "{} holds vectors of size {want}, embeddings have size {got}",
                self.index.name()
            )),
            IndexError::Backend(cause) => IngestError::Unreachable {
                dependency: "vector index",
                cause,
            },
        })?;

        let existing = self
            .index
            .count()
            .await
            .map_err(|e| IngestError::Unreachable {
                dependency: "vector index",
                cause: e.to_string(),
            })?;
        info!(dim, existing, index = self.index.name(), "preflight ok");
        Ok(dim)
    }

    async fn process_batch(
        &self,
        k: usize,
        batch: &[PendingUnit],
        pool: &EmbeddingPool,
        summary: &mut IngestSummary,
    ) -> BatchOutcome {
        let pending = self.drop_existing(k, batch, summary).await;
        if pending.is_empty() {
            debug!(batch = k + 1, "every item already indexed");
            return BatchOutcome {
                upserted: 0,
                complete: true,
            };
        }

        let texts: Vec<String> = pending.iter().map(|u| u.text.clone()).collect();
        let outcomes = pool.embed_all(&texts).await;

        let mut units = Vec::with_capacity(pending.len());
        let mut failed = 0usize;
        for (unit, outcome) in pending.into_iter().zip(outcomes) {
            match outcome {
                Ok(vector) => units.push(IngestUnit {
                    id: unit.id.clone(),
                    text: unit.text.clone(),
                    vector,
                }),
                Err(EmbedError::EmptyInput) => {
                    debug!(id = %unit.id, "empty text; excluded");
                    summary.dropped_empty += 1;
                }
                Err(EmbedError::Service(cause)) => {
                    debug!(id = %unit.id, %cause, "embedding failed; excluded");
                    summary.dropped_embedding += 1;
                    failed += 1;
                }
            }
        }

        if units.is_empty() {
            warn!(batch = k + 1, "no item embedded; upsert skipped");
            return BatchOutcome {
                upserted: 0,
                complete: failed == 0,
            };
        }

        match self.index.upsert_batch(&units).await {
            Ok(n) => {
                summary.upserted += n;
                BatchOutcome {
                    upserted: n,
                    complete: failed == 0,
                }
            }
            Err(e) => {
                error!(batch = k + 1, units = units.len(), error = %e, "index write failed; batch skipped");
                summary.batches_failed += 1;
                summary.lost_to_index_errors += units.len();
                BatchOutcome::default()
            }
        }
    }

    /// Applies the existing-id policy; lookup failures fall back to overwrite.
    async fn drop_existing<'b>(
        &self,
        k: usize,
        batch: &'b [PendingUnit],
        summary: &mut IngestSummary,
    ) -> Vec<&'b PendingUnit> {
        if self.cfg.existing == ExistingPolicy::Overwrite {
            return batch.iter().collect();
        }

        let ids: Vec<String> = batch.iter().map(|u| u.id.clone()).collect();
        match self.index.existing_ids(&ids).await {
            Ok(present) => {
                let kept: Vec<&PendingUnit> =
                    batch.iter().filter(|u| !present.contains(&u.id)).collect();
                summary.skipped_existing += batch.len() - kept.len();
                kept
            }
            Err(e) => {
                warn!(batch = k + 1, error = %e, "existing-id lookup failed; overwriting");
                batch.iter().collect()
            }
        }
    }
}
