// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recording sink with failure injection.

use std::sync::{Arc, Mutex, MutexGuard};

use logmerge_core::{Entry, Sink, SinkError};

use crate::entries::timestamps;

/// Records everything a merge hands it. Clones share the same record, so a
/// test can keep a handle while the merge owns the sink.
///
/// # Example
///
/// ```
/// use logmerge_core::{Entry, Sink};
/// use logmerge_dry_tests::RecordingSink;
///
/// let handle = RecordingSink::new();
/// let mut sink = handle.clone();
/// sink.print(&Entry::new(1, "a")).unwrap();
/// sink.done().unwrap();
/// assert_eq!(handle.timestamps(), vec![1]);
/// assert_eq!(handle.done_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<RecordingSinkInner>>,
}

#[derive(Debug, Default)]
struct RecordingSinkInner {
    entries: Vec<Entry>,
    print_attempts: usize,
    prints_after_done: usize,
    done_count: usize,
    entries_at_done: Option<usize>,
    failing_prints: usize,
    fail_on_done: bool,
}

impl RecordingSink {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RecordingSinkInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Makes the next `count` print attempts fail without recording.
    pub fn fail_next_prints(&self, count: usize) {
        self.lock().failing_prints = count;
    }

    /// Configures `done` to fail.
    pub fn set_fail_on_done(&self, fail: bool) {
        self.lock().fail_on_done = fail;
    }

    /// Accepted entries, in order.
    pub fn entries(&self) -> Vec<Entry> {
        self.lock().entries.clone()
    }

    /// Timestamps of accepted entries.
    pub fn timestamps(&self) -> Vec<u64> {
        timestamps(&self.lock().entries)
    }

    /// Payloads of accepted entries.
    pub fn payloads(&self) -> Vec<String> {
        self.lock()
            .entries
            .iter()
            .map(|e| e.payload().to_owned())
            .collect()
    }

    /// Calls to `print`, including failed ones.
    pub fn print_attempts(&self) -> usize {
        self.lock().print_attempts
    }

    /// Calls to `print` made after a successful `done`.
    pub fn prints_after_done(&self) -> usize {
        self.lock().prints_after_done
    }

    /// Successful calls to `done`.
    pub fn done_count(&self) -> usize {
        self.lock().done_count
    }

    /// Number of entries recorded when `done` first succeeded.
    pub fn entries_at_done(&self) -> Option<usize> {
        self.lock().entries_at_done
    }
}

impl Sink for RecordingSink {
    fn print(&mut self, entry: &Entry) -> Result<(), SinkError> {
        let mut inner = self.lock();
        inner.print_attempts += 1;
        if inner.done_count > 0 {
            inner.prints_after_done += 1;
        }
        if inner.failing_prints > 0 {
            inner.failing_prints -= 1;
            return Err(SinkError::msg("injected print failure"));
        }
        inner.entries.push(entry.clone());
        Ok(())
    }

    fn done(&mut self) -> Result<(), SinkError> {
        let mut inner = self.lock();
        if inner.fail_on_done {
            return Err(SinkError::msg("injected done failure"));
        }
        inner.done_count += 1;
        if inner.entries_at_done.is_none() {
            inner.entries_at_done = Some(inner.entries.len());
        }
        Ok(())
    }
}
