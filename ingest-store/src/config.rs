//! Runtime, pipeline and collection configuration.

use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::IngestError;

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceKind {
    /// Cosine distance (recommended for most embeddings).
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
    /// Euclidean distance (L2).
    Euclid,
}

impl FromStr for DistanceKind {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceKind::Cosine),
            "dot" | "dotproduct" => Ok(DistanceKind::Dot),
            "euclid" | "l2" => Ok(DistanceKind::Euclid),
            other => Err(IngestError::Config(format!("unknown distance '{other}'"))),
        }
    }
}

/// What to do with ids that are already present in the index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExistingPolicy {
    /// Re-embed and upsert; same id overwrites.
    #[default]
    Overwrite,
    /// Look ids up before dispatching and leave present ones untouched.
    SkipExisting,
}

/// Qdrant connection and collection settings.
#[derive(Clone, Debug)]
pub struct QdrantConfig {
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub url: String,
    /// Optional API key for Qdrant Cloud.
    pub api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Distance function (Cosine by default).
    pub distance: DistanceKind,
}

impl QdrantConfig {
    /// Validates config values.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.url.trim().is_empty() {
            return Err(IngestError::Config("qdrant url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(IngestError::Config("collection is empty".into()));
        }
        Ok(())
    }
}

/// Configuration of the ingestion pipeline itself.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Records per batch (one upsert call per batch).
    pub batch_size: usize,
    /// Maximum simultaneous embedding calls within a batch.
    pub concurrency: usize,
    /// Fields every record must carry, in output order.
    pub required_fields: Vec<String>,
    /// Fields appended after the required ones when present.
    pub optional_fields: Vec<String>,
    /// Source position to start from (manual resume).
    pub start_offset: usize,
    /// Prefix of the stable string id (`{prefix}_{position}`).
    pub id_prefix: String,
    /// Bound on a single embedding call.
    pub embed_timeout: Duration,
    /// Expected embedding size; probed from the service when `None`.
    pub embedding_dim: Option<usize>,
    /// Handling of ids already in the index.
    pub existing: ExistingPolicy,
    /// Where committed batches are recorded; no resume when `None`.
    pub ledger_path: Option<PathBuf>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            concurrency: 6,
            required_fields: ["Title", "Author", "Subjects", "Description"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            optional_fields: Vec::new(),
            start_offset: 0,
            id_prefix: "book".to_string(),
            embed_timeout: Duration::from_secs(30),
            embedding_dim: None,
            existing: ExistingPolicy::Overwrite,
            ledger_path: None,
        }
    }
}

impl IngestConfig {
    /// Validates config values. Any error here is fatal before work starts.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.batch_size == 0 {
            return Err(IngestError::Config("batch_size must be > 0".into()));
        }
        if self.concurrency == 0 {
            return Err(IngestError::Config("concurrency must be > 0".into()));
        }
        if self.required_fields.is_empty() {
            return Err(IngestError::Config(
                "at least one required field is needed".into(),
            ));
        }
        if self.embed_timeout.is_zero() {
            return Err(IngestError::Config("embed timeout must be > 0".into()));
        }
        if self.embedding_dim == Some(0) {
            return Err(IngestError::Config("embedding_dim must be > 0".into()));
        }
        if self.id_prefix.trim().is_empty() {
            return Err(IngestError::Config("id_prefix is empty".into()));
        }

        let mut seen = HashSet::new();
        for f in self.required_fields.iter().chain(&self.optional_fields) {
            if f.trim().is_empty() {
                return Err(IngestError::Config("field names must not be empty".into()));
            }
            if !seen.insert(f.trim()) {
                return Err(IngestError::Config(format!("field '{f}' listed twice")));
            }
        }
        Ok(())
    }
}

/// Splits a comma-separated field list, trimming entries and dropping blanks.
pub fn parse_field_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        IngestConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_zero_sizes_and_duplicate_fields() {
        let cfg = IngestConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = IngestConfig {
            concurrency: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = IngestConfig {
            optional_fields: vec!["Title".into()],
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = IngestConfig {
            required_fields: Vec::new(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn field_list_parsing() {
        assert_eq!(
            parse_field_list(" Title, Author ,,Subjects "),
            vec!["Title", "Author", "Subjects"]
        );
    }

    #[test]
    fn distance_parsing() {
        assert_eq!("L2".parse::<DistanceKind>().unwrap(), DistanceKind::Euclid);
        assert!("manhattan".parse::<DistanceKind>().is_err());
    }
}
