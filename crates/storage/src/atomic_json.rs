// SPDX-License-Identifier: MIT

//! Atomic JSON state files: write-to-tmp + rename, with an optional
//! advisory file lock for state shared across concurrent processes on
//! the same data directory (the circuit breaker).

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Load `path` as JSON, falling back to `T::default()` if the file is
/// missing or corrupt. A corrupt file is left in place — it is
/// overwritten wholesale on the next save.
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "state file corrupt, using defaults");
                T::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => T::default(),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "failed to read state file, using defaults");
            T::default()
        }
    }
}

/// Write `value` to `path` atomically: serialize to `<path>.tmp`, then
/// rename over `path`.
pub fn save_atomic<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = tmp_path_for(path);
    let body = serde_json::to_string_pretty(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    {
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(body.as_bytes())?;
        tmp.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Same as `save_atomic`, but guarded by a non-blocking advisory lock at
/// `<path>.lock`. If the lock is held by another process, the save is
/// silently skipped — the in-memory state of this process remains
/// authoritative for its own lifetime; the next process to win the lock
/// will persist its view.
pub fn save_atomic_locked<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let lock_path = lock_path_for(path);
    let lock_file = OpenOptions::new().create(true).write(true).truncate(false).open(&lock_path)?;

    match lock_file.try_lock_exclusive() {
        Ok(()) => {
            let result = save_atomic(path, value);
            let _ = fs2::FileExt::unlock(&lock_file);
            result
        }
        Err(_) => {
            tracing::trace!(path = %path.display(), "state save skipped (lock held)");
            Ok(())
        }
    }
}

fn tmp_path_for(path: &Path) -> std::path::PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    std::path::PathBuf::from(os)
}

fn lock_path_for(path: &Path) -> std::path::PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".lock");
    std::path::PathBuf::from(os)
}

#[cfg(test)]
#[path = "atomic_json_tests.rs"]
mod tests;
