// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Profiles as `<profile>.json` files, replaced atomically on save.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::store::{ConfigError, ConfigStore};

/// Directory of profile files. Defaults to the platform config dir
/// (e.g. `~/.config/logmerge`).
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    dir: PathBuf,
}

impl FsConfigStore {
    /// Store under the user config directory.
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("dev", "flyingrobots", "logmerge").ok_or_else(|| {
            ConfigError::Unavailable("no home directory to derive a config dir from".into())
        })?;
        Ok(Self::at(dirs.config_dir()))
    }

    /// Store under `dir`. The directory is created on first save.
    pub fn at(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the profile files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `profile`.
    pub fn path_for(&self, profile: &str) -> Result<PathBuf, ConfigError> {
        let plain = !profile.is_empty()
            && profile
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !plain {
            return Err(ConfigError::ProfileName(profile.to_owned()));
        }
        Ok(self.dir.join(format!("{profile}.json")))
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ConfigError + '_ {
    move |error| ConfigError::Io {
        path: path.to_path_buf(),
        error,
    }
}

impl ConfigStore for FsConfigStore {
    fn read(&self, profile: &str) -> Result<Option<Vec<u8>>, ConfigError> {
        let path = self.path_for(profile)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(&path)(err)),
        }
    }

    fn write(&self, profile: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(profile)?;
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;
        // Readers see either the old file or the new one, never a torn write.
        let staged = path.with_extension("json.tmp");
        fs::write(&staged, data).map_err(io_error(&staged))?;
        fs::rename(&staged, &path).map_err(io_error(&path))
    }
}
