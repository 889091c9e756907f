use std::error::Error;
use std::fmt;

use crate::assets::AssetError;
use crate::locks::LockError;
use crate::settings::SettingsError;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Asset(AssetError),
    Lock(LockError),
    Settings(SettingsError),
    Validation(String),
    NotFound(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "I/O error: {}", err),
            StoreError::Json(err) => write!(f, "JSON error: {}", err),
            StoreError::Asset(err) => write!(f, "{}", err),
            StoreError::Lock(err) => write!(f, "{}", err),
            StoreError::Settings(err) => write!(f, "{}", err),
            StoreError::Validation(message) => write!(f, "validation failed: {}", message),
            StoreError::NotFound(id) => write!(f, "project '{}' not found", id),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Json(err) => Some(err),
            StoreError::Asset(err) => Some(err),
            StoreError::Lock(err) => Some(err),
            StoreError::Settings(err) => Some(err),
            StoreError::Validation(_) => None,
            StoreError::NotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        StoreError::Io(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        StoreError::Json(value)
    }
}

impl From<AssetError> for StoreError {
    fn from(value: AssetError) -> Self {
        StoreError::Asset(value)
    }
}

impl From<LockError> for StoreError {
    fn from(value: LockError) -> Self {
        StoreError::Lock(value)
    }
}

impl From<SettingsError> for StoreError {
    fn from(value: SettingsError) -> Self {
        StoreError::Settings(value)
    }
}
