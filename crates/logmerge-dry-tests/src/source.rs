// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scripted sources with per-fetch delays and failures.

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

use logmerge_core::{AsyncSource, Entry, Fetch, SourceError, SyncSource};

use crate::entries::{entries, tagged_entries};
use crate::probe::FetchProbe;

/// One scripted fetch outcome.
#[derive(Debug, Clone)]
pub enum Step {
    /// Resolve to `entry` after `delay`.
    Entry(Entry, Duration),
    /// Fail with `message` after `delay`.
    Fail(String, Duration),
}

/// Deterministic fake source: plays its script, then reports exhaustion
/// forever.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use logmerge_dry_tests::ScriptedSource;
///
/// let source = ScriptedSource::from_timestamps(&[1, 5, 9])
///     .with_uniform_delay(Duration::from_millis(10));
/// assert_eq!(source.remaining(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    script: VecDeque<Step>,
    exhaust_delay: Duration,
    probe: Option<FetchProbe>,
    fetches: usize,
    fetches_after_exhausted: usize,
    drained: bool,
}

impl ScriptedSource {
    /// Source with an empty script: exhausted on first fetch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries at `timestamps` (payload `"t<ts>"`), no delay.
    pub fn from_timestamps(timestamps: &[u64]) -> Self {
        Self::from_entries(entries(timestamps))
    }

    /// Entries at `timestamps` with payload `"<tag>:<index>"`, no delay.
    pub fn tagged(tag: &str, timestamps: &[u64]) -> Self {
        Self::from_entries(tagged_entries(tag, timestamps))
    }

    /// The given entries, no delay.
    pub fn from_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        Self {
            script: entries
                .into_iter()
                .map(|e| Step::Entry(e, Duration::ZERO))
                .collect(),
            ..Self::default()
        }
    }

    /// Appends an entry resolving after `delay`.
    pub fn then_entry(mut self, entry: Entry, delay: Duration) -> Self {
        self.script.push_back(Step::Entry(entry, delay));
        self
    }

    /// Appends a failing fetch resolving after `delay`.
    pub fn then_fail(mut self, message: impl Into<String>, delay: Duration) -> Self {
        self.script.push_back(Step::Fail(message.into(), delay));
        self
    }

    /// Applies `delay` to every scripted step and to exhaustion.
    pub fn with_uniform_delay(mut self, delay: Duration) -> Self {
        for step in &mut self.script {
            match step {
                Step::Entry(_, d) | Step::Fail(_, d) => *d = delay,
            }
        }
        self.exhaust_delay = delay;
        self
    }

    /// Applies `delays[i % len]` to the i-th step. Empty `delays` is a no-op.
    pub fn with_delays(mut self, delays: &[Duration]) -> Self {
        if delays.is_empty() {
            return self;
        }
        for (i, step) in self.script.iter_mut().enumerate() {
            match step {
                Step::Entry(_, d) | Step::Fail(_, d) => *d = delays[i % delays.len()],
            }
        }
        self
    }

    /// Delay before reporting exhaustion.
    pub fn with_exhaust_delay(mut self, delay: Duration) -> Self {
        self.exhaust_delay = delay;
        self
    }

    /// Reports every fetch to `probe`.
    pub fn with_probe(mut self, probe: FetchProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Scripted steps not yet played.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Fetches (or pops) performed so far.
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    /// Fetches performed after exhaustion was already reported.
    pub fn fetches_after_exhausted(&self) -> usize {
        self.fetches_after_exhausted
    }

    /// `true` once exhaustion has been reported.
    pub fn is_drained(&self) -> bool {
        self.drained
    }

    fn next_step(&mut self) -> Option<Step> {
        self.fetches += 1;
        if self.drained {
            self.fetches_after_exhausted += 1;
        }
        self.script.pop_front()
    }
}

impl AsyncSource for ScriptedSource {
    fn fetch_next(&mut self) -> impl Future<Output = Result<Fetch, SourceError>> + Send {
        async move {
            let _guard = self.probe.as_ref().map(FetchProbe::enter);
            let (delay, outcome) = match self.next_step() {
                Some(Step::Entry(entry, delay)) => (delay, Ok(Fetch::Entry(entry))),
                Some(Step::Fail(message, delay)) => (delay, Err(SourceError::msg(message))),
                None => {
                    self.drained = true;
                    (self.exhaust_delay, Ok(Fetch::Exhausted))
                }
            };
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            outcome
        }
    }

    fn is_drained(&self) -> bool {
        self.drained
    }
}

/// Delays are ignored and failures read as exhaustion on the sync path.
impl SyncSource for ScriptedSource {
    fn pop(&mut self) -> Option<Entry> {
        match self.next_step() {
            Some(Step::Entry(entry, _)) => Some(entry),
            Some(Step::Fail(..)) | None => {
                self.drained = true;
                self.script.clear();
                None
            }
        }
    }

    fn is_drained(&self) -> bool {
        self.drained
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn plays_script_then_exhausts_forever() {
        let probe = FetchProbe::new();
        let mut source = ScriptedSource::from_timestamps(&[3])
            .then_fail("flaky", Duration::from_millis(20))
            .with_exhaust_delay(Duration::from_millis(5))
            .with_probe(probe.clone());

        let start = Instant::now();
        let first = source.fetch_next().await.unwrap();
        assert_eq!(first.into_entry().map(|e| e.timestamp().value()), Some(3));
        assert!(source.fetch_next().await.is_err());
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert!(matches!(source.fetch_next().await, Ok(Fetch::Exhausted)));
        assert!(matches!(source.fetch_next().await, Ok(Fetch::Exhausted)));
        assert!(source.is_drained());
        assert_eq!(source.fetches(), 4);
        assert_eq!(source.fetches_after_exhausted(), 1);
        assert_eq!(probe.started(), 4);
        assert_eq!(probe.active(), 0);
    }

    #[test]
    fn sync_pop_treats_failure_as_end() {
        let mut source = ScriptedSource::tagged("x", &[1, 2]).then_fail("stop", Duration::ZERO);
        assert_eq!(source.pop().map(Entry::into_payload).as_deref(), Some("x:0"));
        assert_eq!(source.pop().map(Entry::into_payload).as_deref(), Some("x:1"));
        assert_eq!(source.pop(), None);
        assert!(SyncSource::is_drained(&source));
        assert_eq!(source.remaining(), 0);
    }
}
