//! Vector index boundary consumed by the ingestion driver.

use std::{collections::HashSet, future::Future, pin::Pin};

use crate::errors::IndexError;
use crate::record::IngestUnit;

/// Boxed future returned by [`VectorIndex`] operations.
pub type IndexFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, IndexError>> + Send + 'a>>;

/// Write-side view of a vector index.
///
/// Upserts are keyed by [`IngestUnit::id`]: writing an existing id replaces
/// it. The driver never issues two calls concurrently.
pub trait VectorIndex: Send + Sync {
    /// Ensures the target collection exists for vectors of size `dim`.
    fn prepare<'a>(&'a self, dim: usize) -> IndexFuture<'a, ()>;

    /// Writes one batch in a single call; returns the number of units written.
    fn upsert_batch<'a>(&'a self, units: &'a [IngestUnit]) -> IndexFuture<'a, usize>;

    /// Number of entries currently stored.
    fn count<'a>(&'a self) -> IndexFuture<'a, u64>;

    /// Subset of `ids` already stored.
    fn existing_ids<'a>(&'a self, ids: &'a [String]) -> IndexFuture<'a, HashSet<String>>;

    /// Short name used in diagnostics.
    fn name(&self) -> &str {
        "vector index"
    }
}
