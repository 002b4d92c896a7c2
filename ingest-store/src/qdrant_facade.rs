//! Thin adapter around `qdrant-client` implementing [`VectorIndex`].
//!
//! This facade concentrates all Qdrant interactions behind the narrow
//! write-side API the driver needs, hiding the builder pattern and keeping
//! the rest of the crate decoupled from `qdrant-client`.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::{DistanceKind, QdrantConfig};
use crate::errors::{IndexError, IngestError};
use crate::index::{IndexFuture, VectorIndex};
use crate::record::{IngestUnit, stable_uuid};

use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, GetPointsBuilder, PointId,
    PointStruct, UpsertPointsBuilder, VectorParamsBuilder, vectors_config,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::json;
use tracing::{debug, info, warn};

/// A facade over the Qdrant client.
///
/// Point ids are UUIDv5 of the string id; the string id itself is stored in
/// the payload as `eid` next to `text`.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    distance: DistanceKind,
    dim: AtomicUsize,
}

impl QdrantIndex {
    /// Creates a new facade from the given configuration.
    ///
    /// No request is made here; reachability is checked by [`VectorIndex::prepare`].
    pub fn new(cfg: &QdrantConfig) -> Result<Self, IngestError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.url);
        if let Some(key) = &cfg.api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| IngestError::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            collection: cfg.collection.clone(),
            distance: cfg.distance,
            dim: AtomicUsize::new(0),
        })
    }

    /// Ensures that the collection exists.
    ///
    /// - If the collection exists → verifies its vector size when Qdrant reports one.
    /// - If missing → creates it with `dim` and the configured distance.
    async fn ensure_collection(&self, dim: usize) -> Result<(), IndexError> {
        info!(
            "Ensuring collection '{}' with size={} distance={:?}",
            self.collection, dim, self.distance
        );

        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| IndexError::Backend(e.to_string()))?;

        if exists {
            debug!("Collection '{}' already exists", self.collection);
            if let Some(existing) = self.collection_dim().await {
                if existing != dim {
                    return Err(IndexError::VectorSize {
                        id: format!("collection '{}'", self.collection),
                        got: dim,
                        want: existing,
                    });
                }
            }
            return Ok(());
        }

        let distance = match self.distance {
            DistanceKind::Cosine => Distance::Cosine,
            DistanceKind::Dot => Distance::Dot,
            DistanceKind::Euclid => Distance::Euclid,
        };

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(dim as u64, distance)),
            )
            .await
            .map_err(|e| IndexError::Backend(e.to_string()))?;

        info!("Collection '{}' created successfully", self.collection);
        Ok(())
    }

    /// Vector size of an existing single-vector collection, best-effort.
    async fn collection_dim(&self) -> Option<usize> {
        let info = match self.client.collection_info(&self.collection).await {
            Ok(info) => info,
            Err(e) => {
                warn!("Could not read collection info for '{}': {e}", self.collection);
                return None;
            }
        };
        let config = info.result?.config?.params?.vectors_config?.config?;
        match config {
            vectors_config::Config::Params(p) => Some(p.size as usize),
            _ => None,
        }
    }

    fn to_point(unit: &IngestUnit) -> Result<PointStruct, IndexError> {
        let payload: Payload = json!({
            "text": unit.text,
            "eid": unit.id,
        })
        .try_into()
        .map_err(|e| IndexError::Backend(format!("payload convert: {e}")))?;

        Ok(PointStruct::new(
            stable_uuid(&unit.id).to_string(),
            unit.vector.clone(),
            payload,
        ))
    }
}

impl VectorIndex for QdrantIndex {
    fn prepare<'a>(&'a self, dim: usize) -> IndexFuture<'a, ()> {
        Box::pin(async move {
            self.ensure_collection(dim).await?;
            self.dim.store(dim, Ordering::Relaxed);
            Ok(())
        })
    }

    fn upsert_batch<'a>(&'a self, units: &'a [IngestUnit]) -> IndexFuture<'a, usize> {
        Box::pin(async move {
            if units.is_empty() {
                debug!("No points provided for upsert");
                return Ok(0);
            }

            let want = self.dim.load(Ordering::Relaxed);
            let mut points = Vec::with_capacity(units.len());
            for unit in units {
                if want != 0 && unit.vector.len() != want {
                    return Err(IndexError::VectorSize {
                        id: unit.id.clone(),
                        got: unit.vector.len(),
                        want,
                    });
                }
                points.push(Self::to_point(unit)?);
            }

            debug!(
                "Upserting {} points into collection '{}'",
                points.len(),
                self.collection
            );

            let n = points.len();
            self.client
                .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
                .await
                .map_err(|e| IndexError::Backend(e.to_string()))?;

            Ok(n)
        })
    }

    fn count<'a>(&'a self) -> IndexFuture<'a, u64> {
        Box::pin(async move {
            let res = self
                .client
                .count(CountPointsBuilder::new(&self.collection).exact(true))
                .await
                .map_err(|e| IndexError::Backend(e.to_string()))?;
            Ok(res.result.map(|r| r.count).unwrap_or(0))
        })
    }

    fn existing_ids<'a>(&'a self, ids: &'a [String]) -> IndexFuture<'a, HashSet<String>> {
        Box::pin(async move {
            if ids.is_empty() {
                return Ok(HashSet::new());
            }

            let point_ids: Vec<PointId> = ids
                .iter()
                .map(|id| PointId::from(stable_uuid(id).to_string()))
                .collect();

            let res = self
                .client
                .get_points(
                    GetPointsBuilder::new(&self.collection, point_ids)
                        .with_payload(true)
                        .with_vectors(false),
                )
                .await
                .map_err(|e| IndexError::Backend(e.to_string()))?;

            let found = res
                .result
                .into_iter()
                .filter_map(|p| {
                    p.payload
                        .get("eid")
                        .and_then(|v| v.clone().into_json().as_str().map(str::to_string))
                })
                .collect();
            Ok(found)
        })
    }

    fn name(&self) -> &str {
        "vector index (qdrant)"
    }
}
