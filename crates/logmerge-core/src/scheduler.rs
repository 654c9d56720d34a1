// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Batch-fetch merge scheduler for delayed sources.
//!
//! Fetch latency dominates and is serialized per source, so throughput comes
//! from keeping fetches to *different* sources outstanding at the same time.
//! Each tick:
//!
//! 1. admits at most one fetch, to the lowest idle source, if the frontier and
//!    the in-flight ceiling both have room;
//! 2. when nothing more can be admitted and fetches are outstanding, awaits the
//!    whole batch together (the only suspension point) and settles every result;
//! 3. emits the frontier minimum if the [`EmissionGate`] is open.
//!
//! The run completes once every source is drained and the frontier is empty,
//! at which point the sink's `done` is called.
//!
//! Fetches are never cancelled. A source that never resolves stalls the run.
//! The batch being awaited lives in the merge, not in the `run` future, so a
//! caller may drop `run` (for example under `tokio::time::timeout`) and call it
//! again later to resume the same barrier.

use std::future::Future;
use std::pin::Pin;
use std::task::Poll;

use futures_util::future::{maybe_done, poll_fn, BoxFuture, FutureExt, MaybeDone};
use tracing::{debug, info, instrument, trace, warn};

use crate::config::{MergeConfig, MergeLimits};
use crate::entry::{SourceId, Timestamp};
use crate::error::{InvariantViolation, MergeError};
use crate::frontier::{Candidate, Frontier};
use crate::gate::EmissionGate;
use crate::sink::Sink;
use crate::slot::{SourcePhase, SourceSlot};
use crate::source::{AsyncSource, Fetch, SourceError};
use crate::stats::MergeStats;

/// A settled fetch: the source comes back together with its result.
type Settled<S> = (SourceId, S, Result<Fetch, SourceError>);

/// An issued fetch, holding its result once resolved until the barrier settles.
type Pending<S> = MaybeDone<BoxFuture<'static, Settled<S>>>;

/// What a single scheduler tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tick {
    /// Source a fetch was issued to.
    pub fetch_issued: Option<SourceId>,
    /// Fetches settled at this tick's drain barrier.
    pub settled: usize,
    /// Timestamp of the entry handed to the sink.
    pub emitted: Option<Timestamp>,
    /// The run completed and the sink was told so.
    pub finished: bool,
}

/// Merges [`AsyncSource`]s into a [`Sink`] in global timestamp order.
pub struct AsyncMerge<S: AsyncSource, K: Sink> {
    slots: Vec<SourceSlot<S>>,
    frontier: Frontier,
    in_flight: Vec<Pending<S>>,
    gate: EmissionGate,
    limits: MergeLimits,
    sink: K,
    stats: MergeStats,
    finished: bool,
}

impl<S: AsyncSource, K: Sink> AsyncMerge<S, K> {
    /// Builds a merge over `sources`, validating `config` against their count.
    pub fn new(
        sources: impl IntoIterator<Item = S>,
        sink: K,
        config: MergeConfig,
    ) -> Result<Self, MergeError> {
        let slots: Vec<_> = sources
            .into_iter()
            .enumerate()
            .map(|(i, source)| SourceSlot::new(SourceId::new(i), source))
            .collect();
        let limits = config.limits(slots.len())?;
        Ok(Self {
            frontier: Frontier::with_capacity(limits.frontier_capacity()),
            in_flight: Vec::with_capacity(limits.max_in_flight()),
            gate: EmissionGate::new(slots.len()),
            slots,
            limits,
            sink,
            stats: MergeStats::default(),
            finished: false,
        })
    }

    /// Runs ticks until every source is drained and emitted.
    ///
    /// On error the run stops with its state intact: an entry the sink
    /// rejected stays in the frontier, so calling `run` again after the sink
    /// recovers resumes without loss or duplication. Once finished, further
    /// calls return the final stats without touching the sink.
    #[instrument(skip(self), fields(
        sources = self.slots.len(),
        frontier_capacity = self.limits.frontier_capacity(),
        max_in_flight = self.limits.max_in_flight(),
    ))]
    pub async fn run(&mut self) -> Result<MergeStats, MergeError> {
        while !self.finished {
            self.tick().await?;
        }
        Ok(self.stats)
    }

    /// Executes one scheduling tick.
    pub async fn tick(&mut self) -> Result<Tick, MergeError> {
        if self.finished {
            return Ok(Tick {
                finished: true,
                ..Tick::default()
            });
        }
        self.stats.ticks += 1;

        let mut tick = Tick {
            fetch_issued: self.admit()?,
            ..Tick::default()
        };
        if self.should_drain() {
            tick.settled = self.drain().await?;
        }
        debug_assert_eq!(self.gate.is_open(), EmissionGate::scan(&self.slots));
        if self.gate.is_open() {
            tick.emitted = self.emit()?;
        }

        if self.gate.live() == 0 && self.frontier.is_empty() && self.in_flight.is_empty() {
            self.sink.done()?;
            self.finished = true;
            tick.finished = true;
            info!(
                emitted = self.stats.emitted,
                batches = self.stats.batches,
                peak_in_flight = self.stats.peak_in_flight,
                "merge complete"
            );
        } else if tick.fetch_issued.is_none() && tick.settled == 0 && tick.emitted.is_none() {
            return Err(InvariantViolation::Stalled {
                live: self.gate.live(),
                in_flight: self.in_flight.len(),
            }
            .into());
        }
        Ok(tick)
    }

    /// Steps 1–3: pick an eligible source and issue its fetch if admission
    /// control allows.
    fn admit(&mut self) -> Result<Option<SourceId>, MergeError> {
        if !self.has_room() {
            return Ok(None);
        }
        let Some(index) = self.next_eligible() else {
            return Ok(None);
        };
        self.issue(index).map(Some)
    }

    fn has_room(&self) -> bool {
        !self.frontier.is_full() && self.in_flight.len() < self.limits.max_in_flight()
    }

    /// Idle sources have no fetch outstanding, are not drained and have no
    /// candidate buffered, so every eligible source closes a gap in the gate.
    fn next_eligible(&self) -> Option<usize> {
        self.slots.iter().position(|slot| {
            slot.phase() == SourcePhase::Idle && !self.frontier.contains(slot.id())
        })
    }

    fn issue(&mut self, index: usize) -> Result<SourceId, MergeError> {
        let in_flight = self.in_flight.len() + 1;
        if in_flight > self.limits.max_in_flight() {
            return Err(InvariantViolation::InFlightOverflow {
                in_flight,
                limit: self.limits.max_in_flight(),
            }
            .into());
        }
        self.frontier.reserve()?;
        let slot = &mut self.slots[index];
        let id = slot.id();
        let mut source = match slot.begin_fetch() {
            Ok(source) => source,
            Err(violation) => {
                self.frontier.release()?;
                return Err(violation.into());
            }
        };
        self.in_flight.push(maybe_done(
            async move {
                let result = source.fetch_next().await;
                (id, source, result)
            }
            .boxed(),
        ));
        self.stats.observe_in_flight(in_flight);
        self.stats.observe_occupancy(self.frontier.occupancy());
        trace!(source = %id, in_flight, "fetch issued");
        Ok(id)
    }

    /// Step 4: drain once nothing more can be admitted this tick.
    fn should_drain(&self) -> bool {
        !self.in_flight.is_empty() && (!self.has_room() || self.next_eligible().is_none())
    }

    /// Awaits the entire in-flight batch, then settles every result before
    /// reporting the first failure, so no settled entry is lost.
    ///
    /// Results are parked in `self.in_flight` until the whole batch resolved.
    /// If this future is dropped early, nothing leaves the merge.
    async fn drain(&mut self) -> Result<usize, MergeError> {
        let size = self.in_flight.len();
        debug!(
            batch = size,
            occupancy = self.frontier.occupancy(),
            "awaiting fetch batch"
        );
        let pending = &mut self.in_flight;
        poll_fn(|cx| {
            let mut all_ready = true;
            for fetch in pending.iter_mut() {
                all_ready &= Pin::new(fetch).poll(cx).is_ready();
            }
            if all_ready {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await;
        self.stats.batches += 1;

        let mut first_error = None;
        for mut fetch in std::mem::take(&mut self.in_flight) {
            let Some((id, source, result)) = Pin::new(&mut fetch).take_output() else {
                continue;
            };
            if let Err(err) = self.settle(id, source, result) {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(size),
        }
    }

    fn settle(
        &mut self,
        id: SourceId,
        source: S,
        result: Result<Fetch, SourceError>,
    ) -> Result<(), MergeError> {
        let slot = &mut self.slots[id.index()];
        slot.restore(source);
        self.frontier.release()?;
        match result {
            Ok(Fetch::Entry(entry)) => {
                slot.settle_entry(entry.timestamp())?;
                self.frontier.insert(Candidate::new(entry, id))?;
                self.gate.on_buffered();
                self.stats.fetched += 1;
            }
            Ok(Fetch::Exhausted) => {
                slot.settle_exhausted()?;
                self.gate.on_drained();
                self.stats.exhausted += 1;
                debug!(source = %id, live = self.gate.live(), "source drained");
            }
            Err(error) => {
                slot.settle_failed()?;
                warn!(source = %id, %error, "fetch failed");
                return Err(MergeError::Fetch {
                    source_id: id,
                    error,
                });
            }
        }
        Ok(())
    }

    /// Step 5: hand the frontier minimum to the sink, then remove it.
    fn emit(&mut self) -> Result<Option<Timestamp>, MergeError> {
        let Some(head) = self.frontier.peek_min() else {
            return Ok(None);
        };
        if let Err(err) = self.sink.print(&head.entry) {
            warn!(source = %head.source, %err, "sink rejected entry; keeping it buffered");
            return Err(err.into());
        }
        let Some(candidate) = self.frontier.pop_min() else {
            return Ok(None);
        };
        self.slots[candidate.source.index()].emitted()?;
        self.gate.on_emitted();
        self.stats.emitted += 1;
        let at = candidate.entry.timestamp();
        trace!(source = %candidate.source, timestamp = %at, "emitted");
        Ok(Some(at))
    }

    /// Per-source bookkeeping, indexed by [`SourceId`].
    pub fn slots(&self) -> &[SourceSlot<S>] {
        &self.slots
    }

    /// Current frontier.
    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Fetches currently outstanding.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Resolved limits.
    pub fn limits(&self) -> MergeLimits {
        self.limits
    }

    /// Counters so far.
    pub fn stats(&self) -> MergeStats {
        self.stats
    }

    /// `true` once the sink has been told the run completed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Borrows the sink.
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Mutably borrows the sink.
    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Consumes the merge, returning the sink.
    pub fn into_sink(self) -> K {
        self.sink
    }
}

impl<S: AsyncSource, K: Sink> std::fmt::Debug for AsyncMerge<S, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncMerge")
            .field("sources", &self.slots.len())
            .field("live", &self.gate.live())
            .field("frontier", &self.frontier.len())
            .field("in_flight", &self.in_flight.len())
            .field("limits", &self.limits)
            .field("stats", &self.stats)
            .field("finished", &self.finished)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entry::Entry;
    use crate::source::ReplaySource;

    fn merge(count: usize, config: MergeConfig) -> AsyncMerge<ReplaySource, Vec<Entry>> {
        let sources = (0..count as u64).map(|i| ReplaySource::new([Entry::new(i, "e")]));
        AsyncMerge::new(sources, Vec::new(), config).unwrap()
    }

    #[test]
    fn issuing_past_the_concurrency_ceiling_is_rejected() {
        let mut m = merge(2, MergeConfig::default().with_max_in_flight(1));
        m.issue(0).unwrap();
        let err = m.issue(1).unwrap_err();
        assert!(
            matches!(
                err,
                MergeError::Invariant(InvariantViolation::InFlightOverflow {
                    in_flight: 2,
                    limit: 1
                })
            ),
            "got {err:?}"
        );
        assert_eq!(m.in_flight(), 1);
        assert_eq!(m.frontier().reserved(), 1);
        assert_eq!(m.slots()[1].phase(), SourcePhase::Idle);
    }

    #[test]
    fn issuing_to_a_loading_source_releases_its_reservation() {
        let mut m = merge(2, MergeConfig::default());
        m.issue(0).unwrap();
        let err = m.issue(0).unwrap_err();
        assert!(
            matches!(
                err,
                MergeError::Invariant(InvariantViolation::SourceAlreadyLoading(id)) if id.index() == 0
            ),
            "got {err:?}"
        );
        assert_eq!(m.in_flight(), 1);
        assert_eq!(m.frontier().reserved(), 1);
    }

    #[tokio::test]
    async fn loading_slot_without_a_fetch_stalls() {
        let mut m = merge(1, MergeConfig::default());
        // Lose the source outside the scheduler: the slot reads as loading
        // but nothing is in flight to settle it.
        drop(m.slots[0].begin_fetch().unwrap());
        let err = m.tick().await.unwrap_err();
        assert!(
            matches!(
                err,
                MergeError::Invariant(InvariantViolation::Stalled {
                    live: 1,
                    in_flight: 0
                })
            ),
            "got {err:?}"
        );
        assert!(!m.is_finished());
        assert!(m.sink().is_empty());
    }

    #[tokio::test]
    async fn drain_settles_the_whole_batch_together() {
        let mut m = merge(3, MergeConfig::default());
        let mut settled = 0;
        while settled == 0 {
            settled = m.tick().await.unwrap().settled;
        }
        assert_eq!(settled, 3);
        assert_eq!(m.stats().batches, 1);
        assert_eq!(m.frontier().reserved(), 0);
        assert_eq!(m.in_flight(), 0);
    }
}
