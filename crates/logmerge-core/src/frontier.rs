// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Bounded merge frontier.
//!
//! Ordering invariant:
//! - Candidates pop in ascending `(timestamp, source)` order.
//! - At most one resident candidate per source, so `(timestamp, source)` is a
//!   unique key and the order is total.
//!
//! Capacity covers resident candidates *and* reservations held by in-flight
//! fetches. Overflowing it is a scheduler bug and surfaces as
//! [`InvariantViolation::FrontierOverflow`].

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;

use crate::entry::{Entry, SourceId, Timestamp};
use crate::error::InvariantViolation;

/// A fetched entry waiting for emission, tagged with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Buffered entry.
    pub entry: Entry,
    /// Source that produced it.
    pub source: SourceId,
}

impl Candidate {
    /// Pairs an entry with its source.
    pub fn new(entry: Entry, source: SourceId) -> Self {
        Self { entry, source }
    }

    fn key(&self) -> (Timestamp, SourceId) {
        (self.entry.timestamp(), self.source)
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-ordered candidate set with a hard occupancy ceiling.
#[derive(Debug)]
pub struct Frontier {
    heap: BinaryHeap<Reverse<Candidate>>,
    resident: FxHashSet<SourceId>,
    reserved: usize,
    capacity: usize,
}

impl Frontier {
    /// Empty frontier holding at most `capacity` resident plus reserved slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            resident: FxHashSet::default(),
            reserved: 0,
            capacity,
        }
    }

    /// Configured ceiling.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resident candidates.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// `true` when no candidate is resident. Reservations do not count.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Slots held by in-flight fetches.
    pub fn reserved(&self) -> usize {
        self.reserved
    }

    /// Resident plus reserved slots.
    pub fn occupancy(&self) -> usize {
        self.heap.len() + self.reserved
    }

    /// `true` when another reservation would overflow.
    pub fn is_full(&self) -> bool {
        self.occupancy() >= self.capacity
    }

    /// `true` if `source` has a resident candidate.
    pub fn contains(&self, source: SourceId) -> bool {
        self.resident.contains(&source)
    }

    /// Claims a slot for a fetch about to be issued.
    pub fn reserve(&mut self) -> Result<(), InvariantViolation> {
        let occupancy = self.occupancy() + 1;
        if occupancy > self.capacity {
            return Err(InvariantViolation::FrontierOverflow {
                occupancy,
                capacity: self.capacity,
            });
        }
        self.reserved += 1;
        Ok(())
    }

    /// Returns a slot claimed by [`Frontier::reserve`]. Call before inserting
    /// the fetched candidate, if any.
    pub fn release(&mut self) -> Result<(), InvariantViolation> {
        self.reserved = self
            .reserved
            .checked_sub(1)
            .ok_or(InvariantViolation::ReservationUnderflow)?;
        Ok(())
    }

    /// Inserts a candidate. O(log K).
    ///
    /// The candidate takes a resident slot of its own. A fetched candidate
    /// should [`Frontier::release`] its reservation first; inserting without
    /// one counts toward occupancy and fails with `FrontierOverflow` at the
    /// ceiling.
    pub fn insert(&mut self, candidate: Candidate) -> Result<(), InvariantViolation> {
        if self.resident.contains(&candidate.source) {
            return Err(InvariantViolation::DuplicateCandidate(candidate.source));
        }
        let occupancy = self.occupancy() + 1;
        if occupancy > self.capacity {
            return Err(InvariantViolation::FrontierOverflow {
                occupancy,
                capacity: self.capacity,
            });
        }
        self.resident.insert(candidate.source);
        self.heap.push(Reverse(candidate));
        Ok(())
    }

    /// Earliest resident candidate.
    pub fn peek_min(&self) -> Option<&Candidate> {
        self.heap.peek().map(|Reverse(c)| c)
    }

    /// Removes and returns the earliest resident candidate. O(log K).
    pub fn pop_min(&mut self) -> Option<Candidate> {
        let Reverse(candidate) = self.heap.pop()?;
        self.resident.remove(&candidate.source);
        Some(candidate)
    }
}
