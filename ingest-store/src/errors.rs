//! Unified error types for the crate.
//!
//! Failures are split by blast radius:
//! - [`EmbedError`] affects one item and never aborts its batch.
//! - [`IndexError`] affects one batch and never aborts the run.
//! - [`IngestError`] is fatal and only raised before the batch loop starts.

use thiserror::Error;

/// Per-item embedding failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbedError {
    /// Text was empty or whitespace-only; no remote call was made.
    #[error("empty input")]
    EmptyInput,

    /// Network, timeout, rate-limit, model or shape error from the embedding service.
    #[error("embedding service error: {0}")]
    Service(String),
}

impl EmbedError {
    pub fn service(cause: impl Into<String>) -> Self {
        EmbedError::Service(cause.into())
    }
}

/// Per-batch vector index failure.
#[derive(Debug, Clone, Error)]
pub enum IndexError {
    /// Backend rejected the call or was unreachable.
    #[error("index backend error: {0}")]
    Backend(String),

    /// A vector did not match the collection dimensionality.
    #[error("vector for id {id} has size {got}, collection expects {want}")]
    VectorSize { id: String, got: usize, want: usize },
}

/// Top-level error for ingest-store operations.
#[derive(Debug, Error)]
pub enum IngestError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization errors.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// CSV reader errors.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// A required dependency failed its preflight check.
    #[error("{dependency} is unreachable: {cause}")]
    Unreachable {
        dependency: &'static str,
        cause: String,
    },

    /// Qdrant client construction errors.
    #[error("qdrant error: {0}")]
    Qdrant(String),

    /// Progress ledger could not be read or written.
    #[error("ledger error: {0}")]
    Ledger(String),
}
