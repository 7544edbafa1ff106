// SPDX-License-Identifier: MIT

//! Periodic zstd-compressed snapshots of materialized state, so WAL
//! replay cost stays bounded on long-running installs.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("compression error: {0}")]
    Zstd(String),
}

#[derive(serde::Serialize, serde::Deserialize)]
struct Snapshot<S> {
    seq: u64,
    state: S,
}

/// Writes/reads zstd-compressed JSON snapshots tagged with the WAL seq
/// they were taken at.
pub struct Checkpointer {
    path: PathBuf,
}

impl Checkpointer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn save<S: Serialize>(&self, seq: u64, state: &S) -> Result<(), CheckpointError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec(&Snapshot { seq, state })?;
        let compressed = zstd::encode_all(json.as_slice(), 3).map_err(|e| CheckpointError::Zstd(e.to_string()))?;

        let tmp_path = {
            let mut os = self.path.as_os_str().to_owned();
            os.push(".tmp");
            PathBuf::from(os)
        };
        {
            let mut f = std::fs::File::create(&tmp_path)?;
            f.write_all(&compressed)?;
            f.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Load the snapshot, if one exists, returning `(seq, state)`.
    pub fn load<S: DeserializeOwned>(&self) -> Result<Option<(u64, S)>, CheckpointError> {
        let compressed = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let json = zstd::decode_all(compressed.as_slice()).map_err(|e| CheckpointError::Zstd(e.to_string()))?;
        let snapshot: Snapshot<S> = serde_json::from_slice(&json)?;
        Ok(Some((snapshot.seq, snapshot.state)))
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
