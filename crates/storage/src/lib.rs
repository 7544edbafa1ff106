// SPDX-License-Identifier: MIT

//! ssync-storage: durable job queue, dead-letter queue, atomic JSON state
//! files, and advisory-locked persistence.

pub mod atomic_json;
pub mod checkpoint;
pub mod dlq;
pub mod queue;
pub mod stats;
pub mod sync_timestamps;
pub mod wal;

pub use atomic_json::{load_or_default, save_atomic, save_atomic_locked};
pub use checkpoint::Checkpointer;
pub use dlq::{Dlq, DlqError};
pub use queue::{Queue, QueueError, QueueStats};
pub use stats::StatsStore;
pub use sync_timestamps::SyncTimestampStore;
pub use wal::{Wal, WalEntry, WalError};
