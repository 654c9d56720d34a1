// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted merge limits.
//!
//! [`MergeConfigService`] reads and writes named [`logmerge_core::MergeConfig`]
//! profiles as JSON through a [`ConfigStore`] port, validating them on the way
//! in and out. [`FsConfigStore`] keeps one file per profile.
#![forbid(unsafe_code)]

mod fs;
mod service;
mod store;

pub use fs::FsConfigStore;
pub use service::{MergeConfigService, DEFAULT_PROFILE};
pub use store::{ConfigError, ConfigStore};
