//! Storage manager configuration.

use std::path::PathBuf;

use cap_core::EnvConfig;

/// Configuration for a single [`crate::StorageManager`] instance.
#[derive(Debug, Clone)]
pub struct StorageManagerConfig {
    /// Root directory holding one subdirectory per domain.
    pub base_dir: PathBuf,
    /// Whether `list` includes soft-deleted records by default.
    pub include_deleted: bool,
}

impl StorageManagerConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            include_deleted: false,
        }
    }

    pub fn with_include_deleted(mut self, include_deleted: bool) -> Self {
        self.include_deleted = include_deleted;
        self
    }

    /// Build from `WICKED_STORAGE_BASE` (via [`EnvConfig`]), falling back
    /// to the default `~/.something-wicked` tree.
    pub fn from_env() -> Self {
        Self::new(EnvConfig::from_env().storage_base)
    }
}
