//! Command-line flags with environment fallbacks.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use ingest_store::{DistanceKind, ExistingPolicy, IngestConfig, QdrantConfig, parse_field_list};

#[derive(Parser, Debug)]
#[command(
    name = "shelf-ingest",
    version,
    about = "Embed a book catalogue and load it into a Qdrant collection"
)]
pub struct Cli {
    /// Source table (.csv with a header row, or .jsonl / .ndjson)
    #[arg(long, env = "INGEST_INPUT", default_value = "model/books_cleaned.csv")]
    pub input: PathBuf,

    /// Records per batch; one index write per batch
    #[arg(long, env = "INGEST_BATCH_SIZE", default_value_t = 500)]
    pub batch_size: usize,

    /// Maximum embedding calls in flight within a batch
    #[arg(long, env = "INGEST_CONCURRENCY", default_value_t = 6)]
    pub concurrency: usize,

    /// Comma-separated fields every record must have, in output order
    #[arg(
        long,
        env = "INGEST_REQUIRED_FIELDS",
        default_value = "Title,Author,Subjects,Description"
    )]
    pub required_fields: String,

    /// Comma-separated fields appended when present
    #[arg(long, env = "INGEST_OPTIONAL_FIELDS", default_value = "")]
    pub optional_fields: String,

    /// Skip source records before this position
    #[arg(long, env = "INGEST_START_OFFSET", default_value_t = 0)]
    pub start_offset: usize,

    /// Prefix of record ids (`<prefix>_<position>`)
    #[arg(long, env = "INGEST_ID_PREFIX", default_value = "book")]
    pub id_prefix: String,

    /// Ledger file used to resume interrupted runs
    #[arg(long, env = "INGEST_LEDGER")]
    pub ledger: Option<PathBuf>,

    /// Leave ids already in the collection untouched instead of overwriting them
    #[arg(long, env = "INGEST_SKIP_EXISTING", default_value_t = false)]
    pub skip_existing: bool,

    /// Max seconds to wait for each embedding call
    #[arg(long, env = "EMBEDDING_TIMEOUT_SECS", default_value_t = 30)]
    pub embed_timeout_secs: u64,

    /// Qdrant gRPC endpoint
    #[arg(long, env = "QDRANT_URL", default_value = "http://localhost:6334")]
    pub qdrant_url: String,

    /// Qdrant API key
    #[arg(long, env = "QDRANT_API_KEY", hide_env_values = true)]
    pub qdrant_api_key: Option<String>,

    /// Target collection
    #[arg(long, env = "QDRANT_COLLECTION", default_value = "books")]
    pub collection: String,

    /// Distance function for a newly created collection (cosine, dot, euclid)
    #[arg(long, env = "QDRANT_DISTANCE", default_value = "cosine")]
    pub distance: String,

    /// Debug-level logs for the pipeline crates
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    pub fn ingest_config(&self, embedding_dim: Option<usize>) -> Result<IngestConfig> {
        if self.embed_timeout_secs == 0 {
            bail!("--embed-timeout-secs must be > 0");
        }
        let cfg = IngestConfig {
            batch_size: self.batch_size,
            concurrency: self.concurrency,
            required_fields: parse_field_list(&self.required_fields),
            optional_fields: parse_field_list(&self.optional_fields),
            start_offset: self.start_offset,
            id_prefix: self.id_prefix.trim().to_string(),
            embed_timeout: Duration::from_secs(self.embed_timeout_secs),
            embedding_dim,
            existing: if self.skip_existing {
                ExistingPolicy::SkipExisting
            } else {
                ExistingPolicy::Overwrite
            },
            ledger_path: self.ledger.clone(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn qdrant_config(&self) -> Result<QdrantConfig> {
        let cfg = QdrantConfig {
            url: self.qdrant_url.clone(),
            api_key: self.qdrant_api_key.clone().filter(|k| !k.trim().is_empty()),
            collection: self.collection.clone(),
            distance: self.distance.parse::<DistanceKind>()?,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_catalogue_run() {
        let cli = Cli::try_parse_from(["shelf-ingest"]).unwrap();
        let cfg = cli.ingest_config(None).unwrap();
        assert_eq!(cfg.batch_size, 500);
        assert_eq!(cfg.concurrency, 6);
        assert_eq!(
            cfg.required_fields,
            vec!["Title", "Author", "Subjects", "Description"]
        );
        assert!(cfg.optional_fields.is_empty());
        assert_eq!(cfg.existing, ExistingPolicy::Overwrite);
        assert_eq!(cli.qdrant_config().unwrap().distance, DistanceKind::Cosine);
    }

    #[test]
    fn rejects_bad_values() {
        let cli = Cli::try_parse_from(["shelf-ingest", "--batch-size", "0"]).unwrap();
        assert!(cli.ingest_config(None).is_err());

        let cli = Cli::try_parse_from(["shelf-ingest", "--distance", "manhattan"]).unwrap();
        assert!(cli.qdrant_config().is_err());

        let cli = Cli::try_parse_from(["shelf-ingest", "--skip-existing"]).unwrap();
        assert_eq!(
            cli.ingest_config(None).unwrap().existing,
            ExistingPolicy::SkipExisting
        );
    }
}
