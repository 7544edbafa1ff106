// SPDX-License-Identifier: MIT

//! ssync-core: data model, error taxonomy, backoff, and config for the
//! metadata sync service.

pub mod backoff;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use backoff::{BackoffPolicy, policy_for};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{PluginConfig, ConfigError, RawPluginConfig, ReconcileInterval, ReconcileScope};
pub use error::{ErrorKind, SyncError};
pub use model::{
    DeadLetterEntry, GapKind, GapResult, MatchConfidence, MatchResult, QueueItemStatus,
    SceneSnapshot, SyncJob, SyncStats, UpdateType,
};
