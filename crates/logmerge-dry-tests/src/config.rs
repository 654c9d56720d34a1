// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory profile store for testing without filesystem I/O.

use logmerge_config::{ConfigError, ConfigStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory implementation of [`ConfigStore`] for testing.
///
/// Clones share the same profiles, so a test can keep a handle while a
/// `MergeConfigService` owns the store. Call counts include failed attempts.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<InMemoryConfigStoreInner>>,
}

#[derive(Debug, Default)]
struct InMemoryConfigStoreInner {
    profiles: HashMap<String, Vec<u8>>,
    read_count: usize,
    write_count: usize,
    fail_on_read: bool,
    fail_on_write: bool,
}

impl InMemoryConfigStore {
    /// Create a new empty in-memory config store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding raw `data` for `profile`.
    pub fn with_raw(profile: &str, data: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        store.lock().profiles.insert(profile.to_owned(), data.into());
        store
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryConfigStoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Configure the store to fail on reads.
    pub fn set_fail_on_read(&self, fail: bool) {
        self.lock().fail_on_read = fail;
    }

    /// Configure the store to fail on writes.
    pub fn set_fail_on_write(&self, fail: bool) {
        self.lock().fail_on_write = fail;
    }

    /// Number of `read` calls.
    pub fn read_count(&self) -> usize {
        self.lock().read_count
    }

    /// Number of `write` calls.
    pub fn write_count(&self) -> usize {
        self.lock().write_count
    }

    /// Raw bytes stored for `profile`.
    pub fn raw(&self, profile: &str) -> Option<Vec<u8>> {
        self.lock().profiles.get(profile).cloned()
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn read(&self, profile: &str) -> Result<Option<Vec<u8>>, ConfigError> {
        let mut inner = self.lock();
        inner.read_count += 1;
        if inner.fail_on_read {
            return Err(ConfigError::Unavailable("simulated read failure".into()));
        }
        Ok(inner.profiles.get(profile).cloned())
    }

    fn write(&self, profile: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut inner = self.lock();
        inner.write_count += 1;
        if inner.fail_on_write {
            return Err(ConfigError::Unavailable("simulated write failure".into()));
        }
        inner.profiles.insert(profile.to_owned(), data.to_vec());
        Ok(())
    }
}
