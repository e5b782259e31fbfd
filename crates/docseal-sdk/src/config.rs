use std::fs;
use std::path::{Path, PathBuf};

use docseal_lifecycle::{LifecycleConfig, RetryPolicy};
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Top-level configuration, usually read from `docseal.toml`.
///
/// ```toml
/// [storage]
/// backend = "fs"
/// root = "/var/lib/docseal"
///
/// [retry]
/// max_attempts = 4
/// initial_backoff_ms = 50
///
/// [lifecycle]
/// lock_timeout_ms = 5000
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocSealConfig {
    pub storage: StorageConfig,
    pub retry: RetryPolicy,
    pub lifecycle: LifecycleConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory holding `blobs/`, `documents/` and `ledger/`. Unused by the
    /// memory backend.
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Fs,
            root: PathBuf::from(".docseal"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Fs,
}

impl DocSealConfig {
    /// Everything in memory. Nothing survives the process.
    pub fn in_memory() -> Self {
        Self {
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Filesystem backend rooted at `root`, defaults elsewhere.
    pub fn at_root(root: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig {
                backend: StorageBackend::Fs,
                root: root.into(),
            },
            ..Default::default()
        }
    }

    /// Read a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.storage.root.join("ledger").join("anchors.journal")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = DocSealConfig::default();
        assert_eq!(c.storage.backend, StorageBackend::Fs);
        assert_eq!(c.storage.root, PathBuf::from(".docseal"));
        assert_eq!(c.retry.max_attempts, 4);
        assert_eq!(c.lifecycle.default_mime_type, "application/octet-stream");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c = DocSealConfig::from_toml_str(
            r#"
            [storage]
            backend = "memory"

            [retry]
            max_attempts = 7

            [lifecycle]
            default_author = "records-office"
            "#,
        )
        .unwrap();
        assert_eq!(c.storage.backend, StorageBackend::Memory);
        assert_eq!(c.retry.max_attempts, 7);
        assert_eq!(c.retry.initial_backoff_ms, 50);
        assert_eq!(c.lifecycle.default_author, "records-office");
        assert_eq!(c.lifecycle.lock_timeout_ms, 5_000);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = DocSealConfig::from_toml_str("[storage]\nbackend = \"s3\"\n").unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docseal.toml");
        let written = DocSealConfig::at_root("/srv/docseal");
        fs::write(&path, written.to_toml_string().unwrap()).unwrap();

        let loaded = DocSealConfig::load(&path).unwrap();
        assert_eq!(loaded, written);
        assert_eq!(loaded.ledger_path(), PathBuf::from("/srv/docseal/ledger/anchors.journal"));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = DocSealConfig::load(Path::new("/nonexistent/docseal.toml")).unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }
}
