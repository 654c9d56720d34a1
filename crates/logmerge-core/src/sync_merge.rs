// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Synchronous k-way merge over immediate sources.
//!
//! Reference baseline for [`crate::AsyncMerge`]: pops are immediate, so after
//! priming one candidate per source the gate is always open and each emission
//! refills only the source it came from.

use tracing::{info, instrument, trace};

use crate::config::{MergeConfig, MergeLimits};
use crate::entry::SourceId;
use crate::error::MergeError;
use crate::frontier::{Candidate, Frontier};
use crate::gate::EmissionGate;
use crate::sink::Sink;
use crate::slot::SourceSlot;
use crate::source::SyncSource;
use crate::stats::MergeStats;

/// Resumable synchronous merge.
///
/// Like the async scheduler, an entry leaves the frontier only after the sink
/// accepted it, so `run` may be retried after a sink failure.
#[derive(Debug)]
pub struct SyncMerge<S, K> {
    slots: Vec<SourceSlot<S>>,
    frontier: Frontier,
    refill: Vec<usize>,
    limits: MergeLimits,
    sink: K,
    stats: MergeStats,
    finished: bool,
}

impl<S: SyncSource, K: Sink> SyncMerge<S, K> {
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
            refill: (0..slots.len()).rev().collect(),
            slots,
            limits,
            sink,
            stats: MergeStats::default(),
            finished: false,
        })
    }

    /// Merges every source into the sink and signals completion once.
    #[instrument(skip(self), fields(sources = self.slots.len()))]
    pub fn run(&mut self) -> Result<MergeStats, MergeError> {
        if self.finished {
            return Ok(self.stats);
        }
        loop {
            self.stats.ticks += 1;
            while let Some(index) = self.refill.pop() {
                if let Err(err) = self.pull(index) {
                    self.refill.push(index);
                    return Err(err);
                }
            }
            debug_assert!(EmissionGate::scan(&self.slots));

            let Some(head) = self.frontier.peek_min() else {
                break;
            };
            self.sink.print(&head.entry)?;
            let Some(candidate) = self.frontier.pop_min() else {
                break;
            };
            let index = candidate.source.index();
            self.slots[index].emitted()?;
            self.stats.emitted += 1;
            trace!(source = %candidate.source, timestamp = %candidate.entry.timestamp(), "emitted");
            self.refill.push(index);
        }
        self.sink.done()?;
        self.finished = true;
        info!(emitted = self.stats.emitted, "merge complete");
        Ok(self.stats)
    }

    fn pull(&mut self, index: usize) -> Result<(), MergeError> {
        let slot = &mut self.slots[index];
        if slot.is_drained() {
            return Ok(());
        }
        let mut source = slot.begin_fetch()?;
        let next = source.pop();
        slot.restore(source);
        match next {
            Some(entry) => {
                slot.settle_entry(entry.timestamp())?;
                self.frontier.insert(Candidate::new(entry, slot.id()))?;
                self.stats.fetched += 1;
                self.stats.observe_occupancy(self.frontier.occupancy());
            }
            None => {
                slot.settle_exhausted()?;
                self.stats.exhausted += 1;
            }
        }
        Ok(())
    }

    /// Per-source bookkeeping, indexed by [`SourceId`].
    pub fn slots(&self) -> &[SourceSlot<S>] {
        &self.slots
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

    /// Consumes the merge, returning the sink.
    pub fn into_sink(self) -> K {
        self.sink
    }
}

/// One-shot synchronous merge of `sources` into `sink`.
///
/// ```
/// use logmerge_core::{merge_sync, Entry, MergeConfig, ReplaySource};
///
/// let a = ReplaySource::new([Entry::new(1, "a1"), Entry::new(4, "a4")]);
/// let b = ReplaySource::new([Entry::new(2, "b2")]);
/// let mut out: Vec<Entry> = Vec::new();
/// merge_sync([a, b], &mut out, MergeConfig::default()).unwrap();
/// let ts: Vec<u64> = out.iter().map(|e| e.timestamp().value()).collect();
/// assert_eq!(ts, vec![1, 2, 4]);
/// ```
pub fn merge_sync<S, K>(
    sources: impl IntoIterator<Item = S>,
    sink: K,
    config: MergeConfig,
) -> Result<MergeStats, MergeError>
where
    S: SyncSource,
    K: Sink,
{
    SyncMerge::new(sources, sink, config)?.run()
}
