// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Log entry value types.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Instant at which an entry was logged.
///
/// Timestamps are opaque `u64` ticks; the merge only relies on their total
/// order. By convention they count microseconds since the UNIX epoch, which is
/// what [`Timestamp::from_system_time`] produces.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(u64);

impl Timestamp {
    /// Constructs a timestamp from raw ticks.
    #[must_use]
    pub const fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Microseconds since the UNIX epoch. Instants before the epoch map to zero
    /// and instants past `u64::MAX` micros saturate.
    #[must_use]
    pub fn from_system_time(at: SystemTime) -> Self {
        let micros = at
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_micros()).unwrap_or(u64::MAX));
        Self(micros)
    }

    /// Returns the raw tick value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(ticks: u64) -> Self {
        Self(ticks)
    }
}

/// Index of a source in the order it was handed to a merge.
///
/// Equal timestamps from different sources are emitted in ascending
/// `SourceId` order.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(usize);

impl SourceId {
    /// Wraps a raw source index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw source index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single immutable log line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entry {
    timestamp: Timestamp,
    payload: String,
}

impl Entry {
    /// Creates an entry.
    pub fn new(timestamp: impl Into<Timestamp>, payload: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            payload: payload.into(),
        }
    }

    /// When the entry was logged.
    #[must_use]
    pub const fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Opaque log message.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Consumes the entry, returning its payload.
    #[must_use]
    pub fn into_payload(self) -> String {
        self.payload
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.timestamp, self.payload)
    }
}
