use crate::error::StorageError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "pch.toml";

/// A TOML file holding one serde-typed settings value.
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `pch.toml` in the current directory.
    pub fn in_working_dir() -> Self {
        Self::new(DEFAULT_CONFIG_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the file, or `T::default()` if it does not exist.
    pub fn load<T: DeserializeOwned + Default>(&self) -> Result<T, StorageError> {
        if !self.path.exists() {
            debug!("{} not found; using defaults", self.path.display());
            return Ok(T::default());
        }
        let data = std::fs::read_to_string(&self.path)?;
        let value: T = toml::from_str(&data)?;
        debug!("Loaded configuration from {}", self.path.display());
        Ok(value)
    }

    pub fn save<T: Serialize>(&self, value: &T) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = toml::to_string_pretty(value)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Settings {
        level: String,
        retries: u32,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                level: "info".to_string(),
                retries: 3,
            }
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlConfigStore::new(temp_dir.path().join("pch.toml"));

        let settings = Settings {
            level: "debug".to_string(),
            retries: 5,
        };
        store.save(&settings).unwrap();
        assert!(store.exists());

        let loaded: Settings = store.load().unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("pch.toml");
        let store = TomlConfigStore::new(&path);

        store.save(&Settings::default()).unwrap();
        assert!(path.exists(), "Config file should exist");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlConfigStore::new(temp_dir.path().join("absent.toml"));
        let loaded: Settings = store.load().unwrap();
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pch.toml");
        std::fs::write(&path, "level = [unclosed").unwrap();

        let result = TomlConfigStore::new(&path).load::<Settings>();
        assert!(matches!(result, Err(StorageError::Deserialize(_))));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pch.toml");
        std::fs::write(&path, "retries = 9\n").unwrap();

        let loaded: Settings = TomlConfigStore::new(&path).load().unwrap();
        assert_eq!(loaded.retries, 9);
        assert_eq!(loaded.level, "info");
    }
}
