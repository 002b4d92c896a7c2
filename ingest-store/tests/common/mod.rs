#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use ingest_store::{
    EmbedError, EmbedFuture, EmbeddingsProvider, IndexError, IndexFuture, IngestConfig,
    IngestUnit, Record, VectorIndex,
};
use tokio_util::sync::CancellationToken;

pub const DIM: usize = 8;

/// Marker that makes [`StubEmbedder`] fail for a text.
pub const FAIL_MARKER: &str = "#fail#";

/// Deterministic embedder: fails for texts carrying [`FAIL_MARKER`].
#[derive(Default)]
pub struct StubEmbedder {
    pub calls: AtomicUsize,
    pub down: AtomicBool,
    /// Cancelled once `calls` reaches the given count.
    pub cancel_at: Option<(usize, CancellationToken)>,
}

impl StubEmbedder {
    pub fn unreachable() -> Self {
        let s = Self::default();
        s.down.store(true, Ordering::SeqCst);
        s
    }

    pub fn cancelling_at(call: usize, token: CancellationToken) -> Self {
        Self {
            cancel_at: Some((call, token)),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn vector_for(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    for (i, b) in text.bytes().enumerate() {
        v[i % DIM] += f32::from(b);
    }
    v
}

impl EmbeddingsProvider for StubEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a> {
        Box::pin(async move {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((at, token)) = &self.cancel_at {
                if n == *at {
                    token.cancel();
                }
            }
            tokio::task::yield_now().await;

            if self.down.load(Ordering::SeqCst) {
                return Err(EmbedError::service("connection refused"));
            }
            if text.contains(FAIL_MARKER) {
                return Err(EmbedError::service("HTTP 500"));
            }
            Ok(vector_for(text))
        })
    }

    fn name(&self) -> &str {
        "stub embedder"
    }
}

/// In-memory index keyed by id, with failure injection.
#[derive(Default)]
pub struct MemoryIndex {
    pub points: Mutex<HashMap<String, IngestUnit>>,
    pub dim: AtomicUsize,
    /// Successful upsert calls.
    pub mutations: AtomicUsize,
    /// Upsert calls seen, failed or not.
    pub upsert_calls: AtomicUsize,
    /// 0-based upsert call numbers that fail.
    pub fail_calls: Mutex<HashSet<usize>>,
    pub down: AtomicBool,
    /// Makes `existing_ids` fail while writes keep working.
    pub down_lookup: AtomicBool,
}

impl MemoryIndex {
    pub fn unreachable() -> Self {
        let s = Self::default();
        s.down.store(true, Ordering::SeqCst);
        s
    }

    pub fn failing_calls(calls: &[usize]) -> Self {
        let s = Self::default();
        s.fail_calls
            .lock()
            .unwrap()
            .extend(calls.iter().copied());
        s
    }

    pub fn heal(&self) {
        self.fail_calls.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.points.lock().unwrap().len()
    }

    pub fn get(&self, id: &str) -> Option<IngestUnit> {
        self.points.lock().unwrap().get(id).cloned()
    }

    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }
}

impl VectorIndex for MemoryIndex {
    fn prepare<'a>(&'a self, dim: usize) -> IndexFuture<'a, ()> {
        Box::pin(async move {
            if self.down.load(Ordering::SeqCst) {
                return Err(IndexError::Backend("transport error".into()));
            }
            self.dim.store(dim, Ordering::SeqCst);
            Ok(())
        })
    }

    fn upsert_batch<'a>(&'a self, units: &'a [IngestUnit]) -> IndexFuture<'a, usize> {
        Box::pin(async move {
            let call = self.upsert_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_calls.lock().unwrap().contains(&call) {
                return Err(IndexError::Backend(format!("write {call} rejected")));
            }
            let want = self.dim.load(Ordering::SeqCst);
            for u in units {
                if u.vector.len() != want {
                    return Err(IndexError::VectorSize {
                        id: u.id.clone(),
                        got: u.vector.len(),
                        want,
                    });
                }
            }
            let mut points = self.points.lock().unwrap();
            for u in units {
                points.insert(u.id.clone(), u.clone());
            }
            self.mutations.fetch_add(1, Ordering::SeqCst);
            Ok(units.len())
        })
    }

    fn count<'a>(&'a self) -> IndexFuture<'a, u64> {
        Box::pin(async move {
            if self.down.load(Ordering::SeqCst) {
                return Err(IndexError::Backend("transport error".into()));
            }
            Ok(self.points.lock().unwrap().len() as u64)
        })
    }

    fn existing_ids<'a>(&'a self, ids: &'a [String]) -> IndexFuture<'a, HashSet<String>> {
        Box::pin(async move {
            if self.down_lookup.load(Ordering::SeqCst) {
                return Err(IndexError::Backend("lookup timed out".into()));
            }
            let points = self.points.lock().unwrap();
            Ok(ids
                .iter()
                .filter(|id| points.contains_key(*id))
                .cloned()
                .collect())
        })
    }
}

pub fn book(position: usize, title: &str, description: &str) -> Record {
    Record::new(
        position,
        vec![
            ("Title".into(), title.into()),
            ("Author".into(), format!("Author {position}")),
            ("Subjects".into(), "Fiction; Classics".into()),
            ("Description".into(), description.into()),
        ],
    )
}

/// `n` complete records with distinct titles.
pub fn books(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| book(i, &format!("Title {i}"), &format!("Story number {i}.")))
        .collect()
}

pub fn config(batch_size: usize) -> IngestConfig {
    IngestConfig {
        batch_size,
        concurrency: 6,
        ..IngestConfig::default()
    }
}
