//! Per-user dataset persistence: one CSV file per account under the data
//! directory, named deterministically from the username.
//!
//! The raw uploaded bytes are stored verbatim, so columns beyond the
//! required seven survive on disk even though the typed rows ignore them.
//! Persistence is last-write-never: once a user has a dataset, later
//! uploads return the stored one and replacement happens out of band.

use std::path::PathBuf;
use std::sync::Arc;

use model::{Dataset, ParseError, parse_dataset};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// Why a dataset could not be loaded or stored.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A stored dataset no longer parses. Fatal for this user until the
    /// file is repaired out of band; never retried.
    #[error("stored dataset for '{username}' is corrupt: {source}")]
    Corrupt {
        username: String,
        #[source]
        source: ParseError,
    },

    /// Uploaded bytes were rejected by the parser; nothing was persisted.
    #[error(transparent)]
    Invalid(#[from] ParseError),

    #[error("dataset storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether a user's dataset is stored or still awaited.
#[derive(Debug)]
pub enum DatasetOrPending {
    Ready(Dataset),
    PendingUpload,
}

/// Outcome of an upload: the dataset now on disk, and whether it was
/// already there before this request.
#[derive(Debug)]
pub struct SavedDataset {
    pub dataset: Dataset,
    pub existing: bool,
}

/// File-backed store of one dataset per account.
#[derive(Debug, Clone)]
pub struct DatasetRepository {
    data_dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl DatasetRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Deterministic file path for a username. Anything outside
    /// `[A-Za-z0-9_-]` maps to `_` so the name cannot escape the data dir.
    fn dataset_path(&self, username: &str) -> PathBuf {
        let safe: String = username
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.data_dir.join(format!("{safe}.csv"))
    }

    /// The user's stored dataset, or a pending-upload marker when none
    /// exists yet.
    #[instrument(skip(self))]
    pub async fn load_or_request_upload(&self, username: &str) -> Result<DatasetOrPending, DatasetError> {
        let path = self.dataset_path(username);

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let dataset = parse_dataset(&bytes).map_err(|source| {
                    warn!(username, "stored dataset failed to parse");
                    DatasetError::Corrupt {
                        username: username.to_string(),
                        source,
                    }
                })?;
                Ok(DatasetOrPending::Ready(dataset))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DatasetOrPending::PendingUpload),
            Err(e) => Err(e.into()),
        }
    }

    /// Parse and persist uploaded bytes for a user.
    ///
    /// If a dataset already exists the stored one is returned untouched
    /// (first upload is sticky). Writes are serialized across users, so two
    /// tabs racing on the same account cannot interleave.
    #[instrument(skip(self, bytes))]
    pub async fn save_uploaded(&self, username: &str, bytes: &[u8]) -> Result<SavedDataset, DatasetError> {
        // Parse first: nothing reaches disk unless the bytes validate.
        let dataset = parse_dataset(bytes)?;

        let _guard = self.write_lock.lock().await;

        let path = self.dataset_path(username);
        if tokio::fs::try_exists(&path).await? {
            info!(username, "dataset already stored, keeping the first upload");
            if let DatasetOrPending::Ready(stored) = self.load_or_request_upload(username).await? {
                return Ok(SavedDataset {
                    dataset: stored,
                    existing: true,
                });
            }
            // The file vanished between the check and the read; fall
            // through and store this upload.
        }

        tokio::fs::create_dir_all(&self.data_dir).await?;

        // Write to a sibling temp file and rename, so a concurrent reader
        // never observes a half-written dataset.
        let tmp = path.with_extension("csv.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        info!(username, rows = dataset.len(), "dataset stored");
        Ok(SavedDataset {
            dataset,
            existing: false,
        })
    }
}
