// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Saved audit profiles: a storage port, a JSON service over it, and a
//! filesystem adapter rooted at the platform config directory.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Environment variable that overrides the profile directory.
pub const CONFIG_DIR_ENV: &str = "BUFCPY_CONFIG_DIR";

/// Storage port for raw profile blobs (keyed by profile name).
pub trait ConfigStore {
    /// Load a raw blob. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist a raw blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Error type for profile operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// Profile names are limited to ASCII letters, digits, `-` and `_`.
    #[error("invalid profile name `{0}` (use letters, digits, - and _)")]
    InvalidKey(String),
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Serializes profile values and delegates storage to a [`ConfigStore`].
pub struct ConfigService<S> {
    store: S,
}

impl<S: ConfigStore> ConfigService<S> {
    /// Create a new service using the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load and deserialize the value saved under `key`. `Ok(None)` if missing.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        check_key(key)?;
        match self.store.load_raw(key) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Serialize and persist `value` under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        check_key(key)?;
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    let ok = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidKey(key.to_owned()))
    }
}

/// Profiles as `<name>.json` files in one directory.
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Store rooted at `$BUFCPY_CONFIG_DIR`, or the user config directory
    /// (e.g. `~/.config/bufcpy-auditor`).
    pub fn new() -> Result<Self, ConfigError> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Ok(Self::at(dir));
        }
        let proj = ProjectDirs::from("dev", "flyingrobots", "bufcpy-auditor")
            .ok_or_else(|| ConfigError::Other("could not resolve config dir".into()))?;
        Ok(Self::at(proj.config_dir()))
    }

    /// Store rooted at `base`; the directory is created on first save.
    pub fn at(base: impl AsRef<Path>) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.base)?;
        fs::write(self.path_for(key), data)?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::memory::InMemoryConfigStore;
    use super::*;

    #[test]
    fn missing_profile_is_none() {
        let service = ConfigService::new(InMemoryConfigStore::default());
        assert!(service.load::<serde_json::Value>("nightly").unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let store = InMemoryConfigStore::default();
        let service = ConfigService::new(store.clone());
        service.save("nightly", &serde_json::json!({"runs": 5})).unwrap();
        let loaded: serde_json::Value = service.load("nightly").unwrap().unwrap();
        assert_eq!(loaded["runs"], 5);
        assert_eq!(store.keys(), vec!["nightly".to_owned()]);
    }

    #[test]
    fn path_like_names_are_rejected() {
        let service = ConfigService::new(InMemoryConfigStore::default());
        for bad in ["", "../etc", "a/b", "with space"] {
            assert!(matches!(
                service.save(bad, &1u8),
                Err(ConfigError::InvalidKey(_))
            ));
        }
    }

    #[test]
    fn filesystem_store_writes_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path().join("profiles"));
        let service = ConfigService::new(store);
        service.save("big", &vec![1u32, 2, 3]).unwrap();
        assert!(dir.path().join("profiles/big.json").is_file());
        assert_eq!(service.load::<Vec<u32>>("big").unwrap(), Some(vec![1, 2, 3]));
        assert!(service.load::<Vec<u32>>("other").unwrap().is_none());
    }
}
