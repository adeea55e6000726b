//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use safekit_core::backend::memory::FixedIdentifier;
use safekit_core::backend::MemoryPlatform;
use safekit_core::{Platform, SecureStorage, StoreConfig};
use uuid::Uuid;

/// Temporary directory removed on drop.
pub struct TempRoot {
    path: PathBuf,
}

impl TempRoot {
    /// Creates a fresh directory under the system temp dir.
    pub fn new(label: &str) -> Self {
        let path = std::env::temp_dir().join(format!("safekit-{label}-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&path).expect("create temp root");
        Self { path }
    }

    /// Path of the directory.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempRoot {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Default configuration with logging switched off.
pub fn quiet_config() -> StoreConfig {
    StoreConfig {
        enable_logging: false,
        ..StoreConfig::default()
    }
}

/// Storage over in-memory backends for `platform`.
pub fn memory_storage(platform: Platform) -> (Arc<MemoryPlatform>, SecureStorage) {
    let provider = Arc::new(MemoryPlatform::new(platform));
    let storage = SecureStorage::new(provider.as_ref(), quiet_config());
    (provider, storage)
}

/// Android-like storage whose system identifier answers `system_id`.
pub fn android_storage(
    system_id: &str,
) -> (Arc<MemoryPlatform>, Arc<FixedIdentifier>, SecureStorage) {
    let identifier = Arc::new(FixedIdentifier::new(system_id));
    let provider = Arc::new(MemoryPlatform::with_identifier(
        Platform::Android,
        identifier.clone(),
    ));
    let storage = SecureStorage::new(provider.as_ref(), quiet_config());
    (provider, identifier, storage)
}
