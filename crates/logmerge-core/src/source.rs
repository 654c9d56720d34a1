// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Source capabilities: where merged entries come from.
//!
//! A source wraps one chronological entry generator. Every source must yield
//! non-decreasing timestamps and, once it reports exhaustion, keep reporting it.
//!
//! Async fetches advance the source's cursor as a side effect, so a second
//! fetch must never start before the previous one settles. Callers enforce
//! this, not implementations: [`crate::AsyncMerge`] moves the source into its
//! in-flight fetch, so there is no handle left to fetch with.

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::entry::Entry;

/// Outcome of a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetch {
    /// The source's next entry.
    Entry(Entry),
    /// The source has nothing more to yield, now or later.
    Exhausted,
}

impl Fetch {
    /// Returns the entry, or `None` when exhausted.
    pub fn into_entry(self) -> Option<Entry> {
        match self {
            Self::Entry(entry) => Some(entry),
            Self::Exhausted => None,
        }
    }
}

/// A fetch failed for a reason other than exhaustion.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SourceError {
    message: String,
    #[source]
    cause: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl SourceError {
    /// Failure described only by a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Failure wrapping an underlying error.
    pub fn new(cause: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        let cause = cause.into();
        Self {
            message: cause.to_string(),
            cause: Some(cause),
        }
    }
}

/// Immediate pull-model source.
pub trait SyncSource {
    /// Returns the next entry, or `None` once exhausted (and forever after).
    fn pop(&mut self) -> Option<Entry>;

    /// `true` once `pop` has reported exhaustion.
    fn is_drained(&self) -> bool;
}

/// Delayed fetch-model source.
///
/// Implementations are not required to be re-entrant; see the module docs.
pub trait AsyncSource: Send + 'static {
    /// Fetches the next entry. Resolves after a source-specific delay.
    fn fetch_next(&mut self) -> impl Future<Output = Result<Fetch, SourceError>> + Send;

    /// `true` once a fetch has resolved to [`Fetch::Exhausted`].
    fn is_drained(&self) -> bool;
}

/// Per-call latency applied by [`ReplaySource`] before each async fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Delay {
    /// Fetches resolve on the next poll.
    #[default]
    None,
    /// Every fetch waits the same duration.
    Fixed(Duration),
    /// The n-th fetch waits `delays[n % len]`. An empty list means no delay.
    Cycle(Vec<Duration>),
}

impl Delay {
    fn for_call(&self, call: usize) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Fixed(d) => *d,
            Self::Cycle(delays) if delays.is_empty() => Duration::ZERO,
            Self::Cycle(delays) => delays[call % delays.len()],
        }
    }
}

/// Replays a fixed list of entries, synchronously or with simulated latency.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    pending: VecDeque<Entry>,
    delay: Delay,
    calls: usize,
    drained: bool,
}

impl ReplaySource {
    /// Source yielding `entries` in the given order.
    pub fn new(entries: impl IntoIterator<Item = Entry>) -> Self {
        Self {
            pending: entries.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Sets the latency policy for async fetches.
    pub fn with_delay(mut self, delay: Delay) -> Self {
        self.delay = delay;
        self
    }

    /// Entries not yet yielded.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// `true` once exhaustion has been reported.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.drained
    }

    fn advance(&mut self) -> Fetch {
        match self.pending.pop_front() {
            Some(entry) => Fetch::Entry(entry),
            None => {
                self.drained = true;
                Fetch::Exhausted
            }
        }
    }
}

impl FromIterator<Entry> for ReplaySource {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl SyncSource for ReplaySource {
    fn pop(&mut self) -> Option<Entry> {
        self.advance().into_entry()
    }

    fn is_drained(&self) -> bool {
        self.drained
    }
}

impl AsyncSource for ReplaySource {
    fn fetch_next(&mut self) -> impl Future<Output = Result<Fetch, SourceError>> + Send {
        let wait = self.delay.for_call(self.calls);
        self.calls += 1;
        async move {
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
            Ok(self.advance())
        }
    }

    fn is_drained(&self) -> bool {
        self.drained
    }
}
