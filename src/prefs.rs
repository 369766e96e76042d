use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Key holding the JSON-encoded dark-mode flag.
pub const DARK_MODE_KEY: &str = "darkMode";

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("failed to write preferences to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

fn prefs_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("statusdash")
}

pub fn prefs_file_path() -> PathBuf {
    prefs_dir().join("preferences.json")
}

/// Durable key/value store of raw strings, one JSON object on disk.
///
/// Values are opaque strings, like browser local storage: callers decide
/// how to encode them. Every `set` rewrites the file synchronously.
#[derive(Clone, Debug)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn open_default() -> Self {
        Self::at(prefs_file_path())
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), PrefsError> {
        let mut entries = self.read_all();
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| PrefsError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, json).map_err(|source| PrefsError::Write {
            path: self.path.clone(),
            source,
        })
    }

    // A missing or corrupt file reads as empty.
    fn read_all(&self) -> BTreeMap<String, String> {
        let Ok(json) = fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };
        match serde_json::from_str(&json) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "ignoring unreadable preferences file");
                BTreeMap::new()
            }
        }
    }
}

/// Persisted light/dark flag. `false` is light.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisplayPreference {
    pub dark: bool,
}

impl DisplayPreference {
    /// Read the flag; anything but a stored JSON boolean means light.
    pub fn load(store: &PreferenceStore) -> Self {
        let raw = store.get(DARK_MODE_KEY).unwrap_or_else(|| "false".to_string());
        let dark = match serde_json::from_str::<bool>(&raw) {
            Ok(v) => v,
            Err(err) => {
                debug!(value = %raw, error = %err, "stored theme flag is not a JSON boolean, using light");
                false
            }
        };
        Self { dark }
    }

    pub fn save(&self, store: &PreferenceStore) -> Result<(), PrefsError> {
        store.set(DARK_MODE_KEY, &serde_json::to_string(&self.dark)?)
    }

    pub fn toggled(self) -> Self {
        Self { dark: !self.dark }
    }
}
