// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared counters observing fetches across many sources.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts fetches that are executing right now, the most that ever executed
/// together, and the total started. Clones share the same counters.
///
/// A fetch counts as executing from its first poll until it resolves (or is
/// dropped).
#[derive(Debug, Clone, Default)]
pub struct FetchProbe {
    inner: Arc<ProbeCounters>,
}

#[derive(Debug, Default)]
struct ProbeCounters {
    active: AtomicUsize,
    peak: AtomicUsize,
    started: AtomicUsize,
}

impl FetchProbe {
    /// Fresh probe with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a fetch as started. The returned guard marks it finished on drop.
    pub fn enter(&self) -> FetchGuard {
        let active = self.inner.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak.fetch_max(active, Ordering::SeqCst);
        self.inner.started.fetch_add(1, Ordering::SeqCst);
        FetchGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Fetches executing right now.
    pub fn active(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Most fetches observed executing together.
    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }

    /// Fetches started in total.
    pub fn started(&self) -> usize {
        self.inner.started.load(Ordering::SeqCst)
    }
}

/// Live marker for one executing fetch.
#[derive(Debug)]
pub struct FetchGuard {
    inner: Arc<ProbeCounters>,
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        self.inner.active.fetch_sub(1, Ordering::SeqCst);
    }
}
