// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Run counters.

/// What a merge run did. Peaks are high-water marks over the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MergeStats {
    /// Entries delivered to the sink.
    pub emitted: u64,
    /// Entries produced by sources.
    pub fetched: u64,
    /// Sources that reported exhaustion.
    pub exhausted: u64,
    /// Drain barriers executed.
    pub batches: u64,
    /// Scheduler ticks.
    pub ticks: u64,
    /// Most fetches outstanding at once.
    pub peak_in_flight: usize,
    /// Most frontier slots (resident plus reserved) held at once.
    pub peak_occupancy: usize,
}

impl MergeStats {
    pub(crate) fn observe_in_flight(&mut self, in_flight: usize) {
        self.peak_in_flight = self.peak_in_flight.max(in_flight);
    }

    pub(crate) fn observe_occupancy(&mut self, occupancy: usize) {
        self.peak_occupancy = self.peak_occupancy.max(occupancy);
    }
}
