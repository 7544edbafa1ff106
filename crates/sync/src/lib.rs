// SPDX-License-Identifier: MIT

//! ssync-sync: sanitiser/validator, path obfuscation, Source/Target adapter
//! traits, fuzzy matcher, Target writer, and the reconciliation engine.

pub mod adapters;
pub mod matcher;
pub mod obfuscate;
pub mod reconciliation;
pub mod sanitize;
pub mod scene_extractor;
pub mod writer;

#[cfg(any(test, feature = "test-support"))]
pub mod fakes;

pub use adapters::{LibraryRef, SceneFilter, SourceApi, SourceScene, TargetApi, TargetItem};
pub use matcher::Matcher;
pub use obfuscate::PathObfuscator;
pub use reconciliation::{AutoReconciliationScheduler, GapDetector, ReconciliationEnqueuer, ReconciliationState};
pub use writer::{FieldSyncToggles, PartialSyncResult, TargetWriter, WriterPolicy};
