// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Error taxonomy for merge runs.
//!
//! Source exhaustion is not an error; it is reported as
//! [`crate::Fetch::Exhausted`].

use thiserror::Error;

use crate::entry::{SourceId, Timestamp};
use crate::sink::SinkError;
use crate::slot::SourcePhase;
use crate::source::SourceError;

/// Scheduler bookkeeping reached a state that a correct scheduler never
/// produces. Always fatal for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// Resident plus reserved candidates would exceed the frontier ceiling.
    #[error("frontier occupancy {occupancy} exceeds capacity {capacity}")]
    FrontierOverflow {
        /// Occupancy the operation would have produced.
        occupancy: usize,
        /// Configured ceiling.
        capacity: usize,
    },
    /// More fetches were issued than the concurrency ceiling allows.
    #[error("{in_flight} fetches in flight exceeds limit {limit}")]
    InFlightOverflow {
        /// In-flight count the operation would have produced.
        in_flight: usize,
        /// Configured ceiling.
        limit: usize,
    },
    /// A fetch was requested for a source that is not idle.
    #[error("source {0} fetched while not idle")]
    SourceAlreadyLoading(SourceId),
    /// A slot transition was attempted from the wrong phase.
    #[error("source {source_id} expected phase {expected:?}, found {found:?}")]
    PhaseMismatch {
        /// Slot whose transition was rejected.
        source_id: SourceId,
        /// Phase the transition starts from.
        expected: SourcePhase,
        /// Phase the slot was actually in.
        found: SourcePhase,
    },
    /// A second resident candidate was inserted for the same source.
    #[error("source {0} already has a resident candidate")]
    DuplicateCandidate(SourceId),
    /// A frontier reservation was released without being taken.
    #[error("frontier reservation released without a matching reserve")]
    ReservationUnderflow,
    /// A tick could neither fetch, drain nor emit while live sources remain.
    #[error("scheduler stalled with {live} live sources and {in_flight} fetches in flight")]
    Stalled {
        /// Sources not yet drained.
        live: usize,
        /// Fetches outstanding when the stall was detected.
        in_flight: usize,
    },
}

/// Errors produced by [`crate::AsyncMerge::run`] and [`crate::merge_sync`].
#[derive(Debug, Error)]
pub enum MergeError {
    /// Scheduler bug; see [`InvariantViolation`].
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
    /// A source fetch failed. Fetches are not retried.
    #[error("fetch from source {source_id} failed: {error}")]
    Fetch {
        /// Source whose fetch failed.
        source_id: SourceId,
        /// Underlying failure.
        #[source]
        error: SourceError,
    },
    /// A source produced an entry earlier than its previous one.
    #[error("source {source_id} went backwards: {got} after {previous}")]
    SourceOrder {
        /// Offending source.
        source_id: SourceId,
        /// Timestamp of the source's previous entry.
        previous: Timestamp,
        /// Timestamp that arrived after it.
        got: Timestamp,
    },
    /// The sink rejected a write or the completion signal. The entry being
    /// written stays buffered.
    #[error("sink failed: {0}")]
    Sink(#[from] SinkError),
    /// Limits are unusable for the given source count.
    #[error("invalid merge config: {0}")]
    Config(String),
}
