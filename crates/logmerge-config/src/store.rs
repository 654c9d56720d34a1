// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Storage port for merge profiles, and the errors around it.

use std::io;
use std::path::PathBuf;

use logmerge_core::MergeError;
use thiserror::Error;

/// Where serialized merge profiles live. A profile is a named
/// [`logmerge_core::MergeConfig`]; stores deal only in bytes.
pub trait ConfigStore {
    /// Bytes stored for `profile`, or `None` if the profile was never saved.
    fn read(&self, profile: &str) -> Result<Option<Vec<u8>>, ConfigError>;
    /// Replaces the bytes stored for `profile`.
    fn write(&self, profile: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failure loading or saving a merge profile.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Profile names must be plain file stems.
    #[error("invalid profile name {0:?}")]
    ProfileName(String),
    /// Reading or writing the backing file failed.
    #[error("cannot access {}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        error: io::Error,
    },
    /// Stored bytes are not a valid profile document.
    #[error("profile {profile:?} is not valid JSON for merge limits")]
    Json {
        /// Profile being decoded or encoded.
        profile: String,
        /// Underlying failure.
        #[source]
        error: serde_json::Error,
    },
    /// The profile decoded but its limits are unusable.
    #[error("profile {profile:?} holds unusable limits")]
    Invalid {
        /// Offending profile.
        profile: String,
        /// Validation failure from the merge core.
        #[source]
        error: MergeError,
    },
    /// The store itself is not available (no config dir, backend down).
    #[error("config store unavailable: {0}")]
    Unavailable(String),
}
