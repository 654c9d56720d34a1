// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for logmerge crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`entries`] - Entry construction and inspection helpers
//! - [`probe`] - Shared counters observing concurrent fetches
//! - [`sink`] - Recording sink with failure injection
//! - [`source`] - Scripted sources with per-fetch delays and failures

pub mod config;
pub mod entries;
pub mod probe;
pub mod sink;
pub mod source;

// Re-export commonly used items at crate root for convenience
pub use config::InMemoryConfigStore;
pub use entries::{entries, is_non_decreasing, tagged_entries, timestamps};
pub use probe::FetchProbe;
pub use sink::RecordingSink;
pub use source::{ScriptedSource, Step};
