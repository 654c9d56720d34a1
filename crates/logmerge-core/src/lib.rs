// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! logmerge-core: chronological merge of independently time-ordered log sources.
//!
//! Two delivery models share one bounded [`Frontier`]:
//! - [`merge_sync`] pulls entries immediately from [`SyncSource`]s (classic
//!   k-way heap merge);
//! - [`AsyncMerge`] drives [`AsyncSource`]s whose fetches complete after a
//!   variable delay, keeping a bounded batch of fetches in flight and emitting
//!   only when the [`EmissionGate`] proves no earlier entry can still arrive.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod config;
mod entry;
mod error;
pub mod frontier;
mod gate;
mod scheduler;
pub mod sink;
mod slot;
pub mod source;
mod stats;
mod sync_merge;

/// Tunable limits for a merge run.
pub use config::{MergeConfig, MergeLimits};
/// Log entries, their timestamps and source identifiers.
pub use entry::{Entry, SourceId, Timestamp};
/// Error taxonomy for merge runs.
pub use error::{InvariantViolation, MergeError};
/// Bounded min-ordered candidate set.
pub use frontier::{Candidate, Frontier};
/// Emission rule over per-source bookkeeping.
pub use gate::EmissionGate;
/// Asynchronous batch-fetch merge scheduler.
pub use scheduler::{AsyncMerge, Tick};
/// Output contract and a line-oriented writer implementation.
pub use sink::{Sink, SinkError, WriterSink};
/// Per-source scheduler state machine.
pub use slot::{SourcePhase, SourceSlot};
/// Source capability traits and the replaying implementation.
pub use source::{AsyncSource, Delay, Fetch, ReplaySource, SourceError, SyncSource};
/// Counters describing a merge run.
pub use stats::MergeStats;
/// Synchronous k-way merge.
pub use sync_merge::{merge_sync, SyncMerge};
