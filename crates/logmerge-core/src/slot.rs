// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Per-source bookkeeping for the merge schedulers.

use crate::entry::{SourceId, Timestamp};
use crate::error::{InvariantViolation, MergeError};

/// Lifecycle of one source within a merge run.
///
/// ```text
/// Idle ──fetch──▶ Loading ──entry──▶ Buffered ──emit──▶ Idle
///                    │ └──failure──▶ Idle
///                    └──exhausted──▶ Drained
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePhase {
    /// Live, no candidate buffered, no fetch outstanding. Eligible for a fetch.
    Idle,
    /// A fetch is outstanding; the source value lives inside it.
    Loading,
    /// Exactly one candidate from this source is resident in the frontier.
    Buffered,
    /// Exhausted. Terminal.
    Drained,
}

/// Scheduler view of one source.
///
/// `source` is `None` exactly while the phase is [`SourcePhase::Loading`].
#[derive(Debug)]
pub struct SourceSlot<S> {
    id: SourceId,
    source: Option<S>,
    phase: SourcePhase,
    last: Option<Timestamp>,
}

impl<S> SourceSlot<S> {
    pub(crate) fn new(id: SourceId, source: S) -> Self {
        Self {
            id,
            source: Some(source),
            phase: SourcePhase::Idle,
            last: None,
        }
    }

    /// Source identity.
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SourcePhase {
        self.phase
    }

    /// Not yet drained.
    pub fn is_live(&self) -> bool {
        self.phase != SourcePhase::Drained
    }

    /// Exhaustion observed. Never reverts.
    pub fn is_drained(&self) -> bool {
        self.phase == SourcePhase::Drained
    }

    /// A fetch is outstanding.
    pub fn is_loading(&self) -> bool {
        self.phase == SourcePhase::Loading
    }

    /// Candidates from this source resident in the frontier (0 or 1).
    pub fn buffer_count(&self) -> usize {
        usize::from(self.phase == SourcePhase::Buffered)
    }

    /// Timestamp of the most recent entry this source produced.
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.last
    }

    /// `Idle → Loading`, handing the source to the caller for the fetch.
    pub(crate) fn begin_fetch(&mut self) -> Result<S, InvariantViolation> {
        if self.phase != SourcePhase::Idle {
            return Err(InvariantViolation::SourceAlreadyLoading(self.id));
        }
        let source = self
            .source
            .take()
            .ok_or(InvariantViolation::SourceAlreadyLoading(self.id))?;
        self.phase = SourcePhase::Loading;
        Ok(source)
    }

    /// Returns the source after its fetch settled. The phase is still
    /// `Loading`; follow with one of the `settle_*` transitions.
    pub(crate) fn restore(&mut self, source: S) {
        self.source = Some(source);
    }

    /// `Loading → Buffered`, checking the source did not go backwards.
    pub(crate) fn settle_entry(&mut self, at: Timestamp) -> Result<(), MergeError> {
        self.expect(SourcePhase::Loading)?;
        if let Some(previous) = self.last {
            if at < previous {
                self.phase = SourcePhase::Idle;
                return Err(MergeError::SourceOrder {
                    source_id: self.id,
                    previous,
                    got: at,
                });
            }
        }
        self.last = Some(at);
        self.phase = SourcePhase::Buffered;
        Ok(())
    }

    /// `Loading → Drained`.
    pub(crate) fn settle_exhausted(&mut self) -> Result<(), InvariantViolation> {
        self.expect(SourcePhase::Loading)?;
        self.phase = SourcePhase::Drained;
        Ok(())
    }

    /// `Loading → Idle` after a failed fetch.
    pub(crate) fn settle_failed(&mut self) -> Result<(), InvariantViolation> {
        self.expect(SourcePhase::Loading)?;
        self.phase = SourcePhase::Idle;
        Ok(())
    }

    /// `Buffered → Idle` once the candidate reached the sink.
    pub(crate) fn emitted(&mut self) -> Result<(), InvariantViolation> {
        self.expect(SourcePhase::Buffered)?;
        self.phase = SourcePhase::Idle;
        Ok(())
    }

    fn expect(&self, expected: SourcePhase) -> Result<(), InvariantViolation> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(InvariantViolation::PhaseMismatch {
                source_id: self.id,
                expected,
                found: self.phase,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn slot() -> SourceSlot<&'static str> {
        SourceSlot::new(SourceId::new(3), "src")
    }

    fn mismatch(expected: SourcePhase, found: SourcePhase) -> InvariantViolation {
        InvariantViolation::PhaseMismatch {
            source_id: SourceId::new(3),
            expected,
            found,
        }
    }

    #[test]
    fn fetch_while_loading_is_rejected() {
        let mut s = slot();
        let src = s.begin_fetch().unwrap();
        assert!(s.is_loading());
        assert_eq!(
            s.begin_fetch().unwrap_err(),
            InvariantViolation::SourceAlreadyLoading(SourceId::new(3))
        );
        s.restore(src);
        assert_eq!(
            s.begin_fetch().unwrap_err(),
            InvariantViolation::SourceAlreadyLoading(SourceId::new(3))
        );
        assert_eq!(s.phase(), SourcePhase::Loading);
    }

    #[test]
    fn fetch_from_buffered_or_drained_is_rejected() {
        let mut buffered = slot();
        let src = buffered.begin_fetch().unwrap();
        buffered.restore(src);
        buffered.settle_entry(Timestamp::new(1)).unwrap();
        assert!(matches!(
            buffered.begin_fetch(),
            Err(InvariantViolation::SourceAlreadyLoading(_))
        ));

        let mut drained = slot();
        let src = drained.begin_fetch().unwrap();
        drained.restore(src);
        drained.settle_exhausted().unwrap();
        assert!(matches!(
            drained.begin_fetch(),
            Err(InvariantViolation::SourceAlreadyLoading(_))
        ));
        assert!(drained.is_drained());
    }

    #[test]
    fn settling_an_idle_slot_is_a_phase_mismatch() {
        let mut s = slot();
        let expected = mismatch(SourcePhase::Loading, SourcePhase::Idle);
        assert_eq!(s.settle_exhausted().unwrap_err(), expected);
        assert_eq!(s.settle_failed().unwrap_err(), expected);
        assert!(matches!(
            s.settle_entry(Timestamp::new(1)),
            Err(MergeError::Invariant(v)) if v == expected
        ));
        assert_eq!(s.phase(), SourcePhase::Idle);
    }

    #[test]
    fn drained_slot_stays_drained() {
        let mut s = slot();
        let src = s.begin_fetch().unwrap();
        s.restore(src);
        s.settle_exhausted().unwrap();
        let expected = mismatch(SourcePhase::Loading, SourcePhase::Drained);
        assert_eq!(s.settle_exhausted().unwrap_err(), expected);
        assert_eq!(s.settle_failed().unwrap_err(), expected);
        assert_eq!(
            s.emitted().unwrap_err(),
            mismatch(SourcePhase::Buffered, SourcePhase::Drained)
        );
        assert!(s.is_drained());
    }

    #[test]
    fn emitting_without_a_candidate_is_a_phase_mismatch() {
        let mut s = slot();
        assert_eq!(
            s.emitted().unwrap_err(),
            mismatch(SourcePhase::Buffered, SourcePhase::Idle)
        );
        let src = s.begin_fetch().unwrap();
        s.restore(src);
        assert_eq!(
            s.emitted().unwrap_err(),
            mismatch(SourcePhase::Buffered, SourcePhase::Loading)
        );
    }

    #[test]
    fn backwards_entry_returns_slot_to_idle() {
        let mut s = slot();
        let src = s.begin_fetch().unwrap();
        s.restore(src);
        s.settle_entry(Timestamp::new(9)).unwrap();
        s.emitted().unwrap();
        let src = s.begin_fetch().unwrap();
        s.restore(src);
        let err = s.settle_entry(Timestamp::new(4)).unwrap_err();
        assert!(matches!(err, MergeError::SourceOrder { .. }), "got {err:?}");
        assert_eq!(s.phase(), SourcePhase::Idle);
        assert_eq!(s.last_timestamp(), Some(Timestamp::new(9)));
    }
}
