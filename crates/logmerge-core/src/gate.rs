// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Emission gate.
//!
//! Each source yields non-decreasing timestamps and has at most one resident
//! candidate. The frontier minimum is therefore safe to emit only once every
//! live source has contributed a candidate: a source without one could still
//! produce an earlier entry.

use crate::slot::SourceSlot;

/// Tracks how many live sources currently have a buffered candidate.
///
/// The scheduler reports every slot transition; [`EmissionGate::is_open`] is
/// then O(1) per tick. [`EmissionGate::scan`] recomputes the same answer from
/// the slots directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmissionGate {
    live: usize,
    covered: usize,
}

impl EmissionGate {
    /// Gate for `live` sources, none of which has a candidate yet.
    pub fn new(live: usize) -> Self {
        Self { live, covered: 0 }
    }

    /// Sources not yet drained.
    pub fn live(&self) -> usize {
        self.live
    }

    /// Live sources with a buffered candidate.
    pub fn covered(&self) -> usize {
        self.covered
    }

    /// `true` when every live source has a buffered candidate. Trivially true
    /// with no live sources.
    pub fn is_open(&self) -> bool {
        self.covered == self.live
    }

    /// A source's fetch produced a candidate.
    pub fn on_buffered(&mut self) {
        self.covered += 1;
    }

    /// A source's candidate was emitted.
    pub fn on_emitted(&mut self) {
        self.covered = self.covered.saturating_sub(1);
    }

    /// A live source reported exhaustion.
    pub fn on_drained(&mut self) {
        self.live = self.live.saturating_sub(1);
    }

    /// Stateless form of the gate rule over raw slots.
    pub fn scan<S>(slots: &[SourceSlot<S>]) -> bool {
        slots
            .iter()
            .filter(|slot| slot.is_live())
            .all(|slot| slot.buffer_count() >= 1)
    }
}
