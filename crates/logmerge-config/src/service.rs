// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed access to stored merge profiles.

use logmerge_core::{MergeConfig, MergeError, MergeLimits};
use tracing::debug;

use crate::store::{ConfigError, ConfigStore};

/// Profile used when none is named.
pub const DEFAULT_PROFILE: &str = "merge";

/// Loads and saves one [`MergeConfig`] profile through a [`ConfigStore`].
///
/// Everything that crosses the store boundary is validated: a profile with a
/// zero ceiling is refused on save and reported on load, so a bad file fails
/// here instead of at merge construction.
#[derive(Debug, Clone)]
pub struct MergeConfigService<S> {
    store: S,
    profile: String,
}

impl<S> MergeConfigService<S> {
    /// Service over [`DEFAULT_PROFILE`].
    pub fn new(store: S) -> Self {
        Self {
            store,
            profile: DEFAULT_PROFILE.to_owned(),
        }
    }

    /// Switches to another named profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Active profile name.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Borrows the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the service, returning the store.
    pub fn into_inner(self) -> S {
        self.store
    }

    fn invalid(&self, error: MergeError) -> ConfigError {
        ConfigError::Invalid {
            profile: self.profile.clone(),
            error,
        }
    }
}

impl<S: ConfigStore> MergeConfigService<S> {
    /// Stored profile, or the default config when it is absent or empty.
    pub fn load(&self) -> Result<MergeConfig, ConfigError> {
        let Some(bytes) = self.store.read(&self.profile)?.filter(|b| !b.is_empty()) else {
            debug!(profile = %self.profile, "no stored merge profile; using defaults");
            return Ok(MergeConfig::default());
        };
        let config: MergeConfig =
            serde_json::from_slice(&bytes).map_err(|error| ConfigError::Json {
                profile: self.profile.clone(),
                error,
            })?;
        config.validate().map_err(|error| self.invalid(error))?;
        Ok(config)
    }

    /// Stored profile resolved against `source_count` sources.
    pub fn load_limits(&self, source_count: usize) -> Result<MergeLimits, ConfigError> {
        self.load()?
            .limits(source_count)
            .map_err(|error| self.invalid(error))
    }

    /// Validates and stores `config` as pretty JSON.
    pub fn save(&self, config: &MergeConfig) -> Result<(), ConfigError> {
        config.validate().map_err(|error| self.invalid(error))?;
        let data = serde_json::to_vec_pretty(config).map_err(|error| ConfigError::Json {
            profile: self.profile.clone(),
            error,
        })?;
        self.store.write(&self.profile, &data)?;
        debug!(profile = %self.profile, bytes = data.len(), "merge profile saved");
        Ok(())
    }
}
