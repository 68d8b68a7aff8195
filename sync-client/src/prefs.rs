//! Persisted scalar preferences.
//!
//! Preferences are opaque key/value pairs. A file-backed store reads its
//! JSON file once when opened and rewrites the whole file on every change.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Preference storage errors.
#[derive(Debug, Error)]
pub enum PrefsError {
    /// Failed to read or write the preferences file.
    #[error("preferences I/O error for {path}: {source}")]
    Io {
        /// Path to the preferences file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file or a value was not valid JSON of the expected shape.
    #[error("invalid preference data: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Key/value preference store.
#[derive(Debug, Default)]
pub struct Preferences {
    path: Option<PathBuf>,
    values: DashMap<String, Value>,
}

impl Preferences {
    /// A store that is never persisted.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a file-backed store. A missing file starts empty.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PrefsError> {
        let path = path.into();
        let values = DashMap::new();

        match std::fs::read_to_string(&path) {
            Ok(content) if !content.trim().is_empty() => {
                let map: Map<String, Value> = serde_json::from_str(&content)?;
                for (key, value) in map {
                    values.insert(key, value);
                }
                tracing::debug!("Loaded {} preferences from {}", values.len(), path.display());
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No preferences file at {}", path.display());
            }
            Err(e) => return Err(PrefsError::Io { path, source: e }),
        }

        Ok(Self {
            path: Some(path),
            values,
        })
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read a value. Absent keys and values of another shape read as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?.clone();
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Ignoring preference {:?}: {}", key, e);
                None
            }
        }
    }

    /// Write a value and persist.
    ///
    /// If the file cannot be written the previous value is restored.
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<(), PrefsError> {
        let value = serde_json::to_value(value)?;
        if self.values.get(key).is_some_and(|current| *current == value) {
            return Ok(());
        }
        let previous = self.values.insert(key.to_string(), value);
        self.persist().inspect_err(|_| self.restore(key, previous))
    }

    /// Remove a value and persist. Returns whether it existed.
    ///
    /// If the file cannot be written the value is restored.
    pub fn remove(&self, key: &str) -> Result<bool, PrefsError> {
        let Some((_, previous)) = self.values.remove(key) else {
            return Ok(false);
        };
        self.persist()
            .inspect_err(|_| self.restore(key, Some(previous)))?;
        Ok(true)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn restore(&self, key: &str, previous: Option<Value>) {
        match previous {
            Some(value) => {
                self.values.insert(key.to_string(), value);
            }
            None => {
                self.values.remove(key);
            }
        }
    }

    fn persist(&self) -> Result<(), PrefsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        // Sorted so the file diffs cleanly.
        let snapshot: BTreeMap<String, Value> = self
            .values
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        let content = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(path, content).map_err(|e| PrefsError::Io {
            path: path.clone(),
            source: e,
        })
    }
}
