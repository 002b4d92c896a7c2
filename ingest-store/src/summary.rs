//! Run summary returned by the ingestion driver.

use std::fmt;
use std::time::Duration;

/// Counters collected over one ingestion run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Records handed to the run, including those before the start offset.
    pub records_seen: usize,
    /// Records before the start offset, never looked at.
    pub skipped_by_offset: usize,
    /// Records missing at least one required field.
    pub dropped_incomplete: usize,
    /// Records that produced a normalized text.
    pub normalized: usize,
    /// Items rejected as empty input by the embedding client.
    pub dropped_empty: usize,
    /// Items whose embedding call failed.
    pub dropped_embedding: usize,
    /// Items left untouched because their id was already indexed.
    pub skipped_existing: usize,

    pub batches_total: usize,
    /// Batches that reached the embedding stage in this run.
    pub batches_processed: usize,
    /// Batches skipped because the ledger marks them committed.
    pub batches_resumed: usize,
    /// Batches whose upsert failed.
    pub batches_failed: usize,

    /// Units written to the index in this run.
    pub upserted: usize,
    /// Embedded units lost to failed upserts.
    pub lost_to_index_errors: usize,
    /// Index size after the run; `None` if the final count failed.
    pub index_size: Option<u64>,

    /// The run stopped early on cancellation.
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl IngestSummary {
    /// Records excluded from the index in this run: incomplete, empty, failed embedding.
    pub fn exclusions(&self) -> usize {
        self.dropped_incomplete + self.dropped_empty + self.dropped_embedding
    }
}

impl fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.interrupted {
            "interrupted"
        } else {
            "complete"
        };
        writeln!(f, "Ingestion {status} in {:.2} min", self.elapsed.as_secs_f64() / 60.0)?;
        writeln!(
            f,
            "  records: {} seen, {} before offset, {} normalized, {} incomplete",
            self.records_seen, self.skipped_by_offset, self.normalized, self.dropped_incomplete
        )?;
        writeln!(
            f,
            "  embeddings: {} failed, {} empty, {} already indexed",
            self.dropped_embedding, self.dropped_empty, self.skipped_existing
        )?;
        writeln!(
            f,
            "  batches: {} total, {} processed, {} resumed, {} failed",
            self.batches_total, self.batches_processed, self.batches_resumed, self.batches_failed
        )?;
        writeln!(
            f,
            "  upserted: {} ({} lost to index write errors)",
            self.upserted, self.lost_to_index_errors
        )?;
        writeln!(f, "  excluded: {}", self.exclusions())?;
        match self.index_size {
            Some(n) => write!(f, "  index size: {n}"),
            None => write!(f, "  index size: unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusions_and_display() {
        let s = IngestSummary {
            records_seen: 1000,
            dropped_incomplete: 50,
            normalized: 950,
            dropped_embedding: 2,
            upserted: 948,
            index_size: Some(948),
            ..Default::default()
        };
        assert_eq!(s.exclusions(), 52);

        let text = s.to_string();
        assert!(text.starts_with("Ingestion complete"));
        assert!(text.contains("upserted: 948"));
        assert!(text.contains("index size: 948"));
    }
}
