//! File-based progress ledger (JSON on disk).
//!
//! Records which batches of a corpus were fully persisted so an interrupted
//! run can resume without re-embedding them.
//!
//! Key: SHA256 over batch size, start offset and every `(id, text)` pair.
//! A ledger whose fingerprint does not match the current corpus is ignored.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::errors::IngestError;
use crate::record::PendingUnit;

const LEDGER_VERSION: u32 = 1;

/// On-disk ledger contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub version: u32,
    pub fingerprint: String,
    pub batch_size: usize,
    /// Indices of batches whose every item was persisted.
    pub committed: BTreeSet<usize>,
    /// RFC3339 time of the last commit.
    pub updated_at: String,
}

impl LedgerState {
    fn fresh(fingerprint: &str, batch_size: usize) -> Self {
        Self {
            version: LEDGER_VERSION,
            fingerprint: fingerprint.to_string(),
            batch_size,
            committed: BTreeSet::new(),
            updated_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Committed-batch ledger bound to one corpus fingerprint.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    state: LedgerState,
}

impl Ledger {
    /// Loads the ledger at `path`, or starts an empty one when the file is
    /// missing, unreadable, or belongs to another corpus.
    ///
    /// # Errors
    /// `IngestError::Ledger` if the parent directory cannot be created.
    pub async fn open(
        path: impl AsRef<Path>,
        fingerprint: &str,
        batch_size: usize,
    ) -> Result<Self, IngestError> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| IngestError::Ledger(format!("{}: {e}", dir.display())))?;
        }

        let state = match fs::read(&path).await {
            Ok(data) => match serde_json::from_slice::<LedgerState>(&data) {
                Ok(s)
                    if s.version == LEDGER_VERSION
                        && s.fingerprint == fingerprint
                        && s.batch_size == batch_size =>
                {
                    info!(
                        path = %path.display(),
                        committed = s.committed.len(),
                        "resuming from ledger"
                    );
                    s
                }
                Ok(_) => {
                    warn!(
                        path = %path.display(),
                        "ledger belongs to a different corpus or batch size; starting fresh"
                    );
                    LedgerState::fresh(fingerprint, batch_size)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ledger is corrupt; starting fresh");
                    LedgerState::fresh(fingerprint, batch_size)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no ledger yet");
                LedgerState::fresh(fingerprint, batch_size)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ledger unreadable; starting fresh");
                LedgerState::fresh(fingerprint, batch_size)
            }
        };

        Ok(Self { path, state })
    }

    pub fn is_committed(&self, batch: usize) -> bool {
        self.state.committed.contains(&batch)
    }

    pub fn committed_count(&self) -> usize {
        self.state.committed.len()
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// Marks `batch` as fully persisted and writes the ledger.
    ///
    /// The file is replaced atomically (temp file, then rename).
    pub async fn commit(&mut self, batch: usize) -> Result<(), IngestError> {
        self.state.committed.insert(batch);
        self.state.updated_at = Utc::now().to_rfc3339();

        let json = serde_json::to_vec_pretty(&self.state)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json)
            .await
            .map_err(|e| IngestError::Ledger(format!("{}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| IngestError::Ledger(format!("{}: {e}", self.path.display())))?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Deterministic fingerprint of the normalized corpus as it will be batched.
pub fn corpus_fingerprint(units: &[PendingUnit], batch_size: usize, start_offset: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("v{LEDGER_VERSION}:{batch_size}:{start_offset}:"));
    for u in units {
        hasher.update(u.id.as_bytes());
        hasher.update([0u8]);
        hasher.update(u.text.as_bytes());
        hasher.update([0xffu8]);
    }
    format!("{:x}", hasher.finalize())
}
