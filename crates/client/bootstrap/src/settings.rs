//! Settings file reader.
use std::path::{Path, PathBuf};

use runtime::SettingsProvider;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSettings {
    points_to_win: Option<i64>,
}

/// Reads `pointsToWin` from a JSON file each time a match starts, so edits
/// between matches are picked up.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: Option<PathBuf>,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Settings with no backing file; the runtime falls back to its default.
    pub fn none() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Loads the stored target score. `Ok(None)` when the file has no
    /// `pointsToWin` entry.
    pub fn load(path: &Path) -> Result<Option<i64>, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let stored: StoredSettings =
            serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(stored.points_to_win)
    }
}

impl SettingsProvider for FileSettings {
    fn target_score(&self) -> Option<i64> {
        let path = self.path.as_deref()?;
        match Self::load(path) {
            Ok(value) => value,
            Err(SettingsError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::debug!(path = %path.display(), "no settings file");
                None
            }
            Err(error) => {
                tracing::warn!(%error, "ignoring settings file");
                None
            }
        }
    }
}
