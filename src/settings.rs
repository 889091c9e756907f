use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

pub const SETTINGS_FILE: &str = "showcase.toml";

/// Optional per-root settings read from `<root>/showcase.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSettings {
    /// File name of the derived read index, relative to the store root.
    pub index_file: String,
    /// Prefix the index projector puts in front of catalog-rooted asset paths.
    pub asset_url_prefix: String,
    pub lock_timeout_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            index_file: "index.json".to_string(),
            asset_url_prefix: "catalog".to_string(),
            lock_timeout_ms: 2_000,
        }
    }
}

impl StoreSettings {
    pub fn load(root: &Path) -> Result<Self, SettingsError> {
        let path = root.join(SETTINGS_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|source| SettingsError::Io {
            path: path.clone(),
            source,
        })?;
        let settings: StoreSettings =
            toml::from_str(&raw).map_err(|source| SettingsError::Parse {
                path: path.clone(),
                source,
            })?;
        settings.validate(&path)?;
        Ok(settings)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    fn validate(&self, path: &Path) -> Result<(), SettingsError> {
        let index = Path::new(&self.index_file);
        let plain_file_name = index.file_name().is_some_and(|name| name == index.as_os_str());
        if self.index_file.trim().is_empty() || !plain_file_name {
            return Err(SettingsError::Invalid {
                path: path.to_path_buf(),
                message: format!(
                    "index_file '{}' must be a plain file name",
                    self.index_file
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid {
        path: PathBuf,
        message: String,
    },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io { path, source } => {
                write!(f, "unable to read {}: {}", path.display(), source)
            }
            SettingsError::Parse { path, source } => {
                write!(f, "invalid settings in {}: {}", path.display(), source)
            }
            SettingsError::Invalid { path, message } => {
                write!(f, "invalid settings in {}: {}", path.display(), message)
            }
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SettingsError::Io { source, .. } => Some(source),
            SettingsError::Parse { source, .. } => Some(source),
            SettingsError::Invalid { .. } => None,
        }
    }
}
