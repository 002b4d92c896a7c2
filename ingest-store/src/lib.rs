//! Resumable embedding ingestion of tabular records into a vector index.
//!
//! This crate provides:
//! - CSV / JSONL record readers and a deterministic text normalizer
//! - A bounded, order-preserving embedding pool over any [`EmbeddingsProvider`]
//! - A batch upsert driver with per-item and per-batch fault isolation
//! - A progress ledger so interrupted runs resume at the first unfinished batch
//! - A Qdrant implementation of the [`VectorIndex`] boundary
//!
//! The design is flat (no deep nesting) and splits responsibilities into focused modules.

mod config;
mod embed;
mod embed_pool;
mod errors;
mod index;
mod ingest;
mod io_tabular;
mod ledger;
mod normalize;
mod progress;
mod qdrant_facade;
mod record;
mod summary;

pub use config::{DistanceKind, ExistingPolicy, IngestConfig, QdrantConfig, parse_field_list};
pub use embed::remote::RemoteEmbedder;
pub use embed::{EmbedFuture, EmbeddingClient, EmbeddingsProvider};
pub use embed_pool::{EmbedOutcome, EmbeddingPool};
pub use errors::{EmbedError, IndexError, IngestError};
pub use index::{IndexFuture, VectorIndex};
pub use ingest::Ingestor;
pub use io_tabular::{read_csv, read_jsonl, read_records};
pub use ledger::{Ledger, LedgerState, corpus_fingerprint};
pub use normalize::{Normalizer, is_missing};
pub use progress::{IndicatifProgress, NoopProgress, Progress};
pub use qdrant_facade::QdrantIndex;
pub use record::{IngestUnit, PendingUnit, Record, record_id, stable_uuid};
pub use summary::IngestSummary;
