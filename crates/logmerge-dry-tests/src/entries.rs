// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Entry construction and inspection helpers.

use logmerge_core::Entry;

/// Entries at the given timestamps with payload `"t<ts>"`.
pub fn entries(timestamps: &[u64]) -> Vec<Entry> {
    timestamps
        .iter()
        .map(|&ts| Entry::new(ts, format!("t{ts}")))
        .collect()
}

/// Entries at the given timestamps with payload `"<tag>:<index>"`, so merged
/// output can be traced back to its source and position.
pub fn tagged_entries(tag: &str, timestamps: &[u64]) -> Vec<Entry> {
    timestamps
        .iter()
        .enumerate()
        .map(|(i, &ts)| Entry::new(ts, format!("{tag}:{i}")))
        .collect()
}

/// Raw timestamp values, in order.
pub fn timestamps(entries: &[Entry]) -> Vec<u64> {
    entries.iter().map(|e| e.timestamp().value()).collect()
}

/// `true` if timestamps never decrease.
pub fn is_non_decreasing(entries: &[Entry]) -> bool {
    entries
        .windows(2)
        .all(|w| w[0].timestamp() <= w[1].timestamp())
}
