//! The on-disk settings store.
//!
//! A single JSON record, `{"directory": "<path>"}`, naming the directory a
//! file picker should start in. Loaded once and passed around as a value.
//! A missing file means "start in the current working directory".

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("home directory unavailable")]
    NoHomeDir,
    #[error("settings io error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("settings file '{path}' is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Default directory offered when picking a document.
    pub directory: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl Settings {
    /// `~/.config/pdf_to_png/settings.json`.
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        let home = dirs::home_dir().ok_or(SettingsError::NoHomeDir)?;
        Ok(home.join(".config").join("pdf_to_png").join("settings.json"))
    }

    /// Load from [`Settings::default_path`], falling back to defaults.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`; a missing file yields [`Settings::default`].
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| SettingsError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let raw = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, raw).map_err(io_err)
    }

    /// Resolve a user-supplied document path against [`Settings::directory`].
    pub fn resolve(&self, input: &Path) -> PathBuf {
        if input.is_absolute() {
            input.to_path_buf()
        } else {
            self.directory.join(input)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_defaults_to_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(s.directory, std::env::current_dir().unwrap());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let s = Settings {
            directory: PathBuf::from("/srv/scans"),
        };
        s.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), s);
    }

    #[test]
    fn reads_minimal_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"directory": "/home/me/pdfs"}"#).unwrap();
        let s = Settings::load_from(&path).unwrap();
        assert_eq!(s.directory, PathBuf::from("/home/me/pdfs"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Json { .. }));
    }

    #[test]
    fn resolve_relative_against_directory() {
        let s = Settings {
            directory: PathBuf::from("/srv/scans"),
        };
        assert_eq!(
            s.resolve(Path::new("a.pdf")),
            PathBuf::from("/srv/scans/a.pdf")
        );
        assert_eq!(s.resolve(Path::new("/tmp/b.pdf")), PathBuf::from("/tmp/b.pdf"));
    }
}
