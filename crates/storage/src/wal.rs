// SPDX-License-Identifier: MIT

//! Generic append-only write-ahead log, replayed into whatever
//! materialized state a caller builds from its entries. Shared by the
//! sync queue and the dead-letter queue.
//!
//! Entries are newline-delimited JSON so a truncated last line (a crash
//! mid-write) can be detected and dropped instead of poisoning the whole
//! replay.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt WAL entry at seq {0}")]
    Corrupt(u64),
}

#[derive(Debug, Clone)]
pub struct WalEntry<T> {
    pub seq: u64,
    pub entry: T,
}

/// An append-only log of `T` entries, each tagged with a monotonic `seq`.
pub struct Wal<T> {
    path: PathBuf,
    file: File,
    write_seq: u64,
    processed_seq: u64,
    _marker: std::marker::PhantomData<T>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct Envelope<T> {
    seq: u64,
    entry: T,
}

impl<T> Wal<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Open (creating if absent) the WAL at `path`. `processed_seq` is the
    /// last seq the caller has already folded into its materialized
    /// state (e.g. from a checkpoint), used so `entries_after` only
    /// replays the tail.
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).read(true).open(&path)?;

        let write_seq = Self::scan_last_seq(&path)?;

        Ok(Self { path, file, write_seq, processed_seq, _marker: std::marker::PhantomData })
    }

    fn scan_last_seq(path: &Path) -> Result<u64, WalError> {
        let reader = BufReader::new(File::open(path)?);
        let mut last = 0;
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(envelope) = serde_json::from_str::<Envelope<serde_json::Value>>(&line) {
                last = envelope.seq;
            }
            // A trailing partial line (crash mid-write) simply fails to
            // parse and is ignored — it was never durable.
        }
        Ok(last)
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    /// Append one entry, returning its assigned seq. Not yet guaranteed
    /// durable until `flush`.
    pub fn append(&mut self, entry: &T) -> Result<u64, WalError> {
        self.write_seq += 1;
        let envelope = Envelope { seq: self.write_seq, entry: entry.clone() };
        let line = serde_json::to_string(&envelope).map_err(|_| WalError::Corrupt(self.write_seq))?;
        writeln!(self.file, "{line}")?;
        Ok(self.write_seq)
    }

    pub fn flush(&mut self) -> Result<(), WalError> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }

    /// Replay every entry with `seq > after`, in order. Used at startup
    /// to fold the tail of the log into a freshly loaded snapshot.
    pub fn entries_after(&self, after: u64) -> Result<Vec<WalEntry<T>>, WalError> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut out = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let Ok(envelope) = serde_json::from_str::<Envelope<T>>(&line) else {
                continue;
            };
            if envelope.seq > after {
                out.push(WalEntry { seq: envelope.seq, entry: envelope.entry });
            }
        }
        Ok(out)
    }

    /// Mark entries up to and including `seq` as processed — tracked
    /// in-memory only; durability of the high-water mark is the
    /// checkpoint's job, not the WAL's.
    pub fn mark_processed(&mut self, seq: u64) {
        self.processed_seq = self.processed_seq.max(seq);
    }

    /// Truncate the log to empty and reset seq counters. Called by the
    /// checkpointer immediately after a snapshot is durably written, so
    /// the WAL never grows without bound.
    pub fn truncate(&mut self) -> Result<(), WalError> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.processed_seq = self.write_seq;
        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
