//! Platform abstraction traits for persistence.
//!
//! The store never touches disk or OS APIs directly. Every platform provides
//! one backend per namespace plus a source for the system device identifier:
//!
//! - [`KeyValueBackend`]: byte-level persistence for a single key space
//! - [`StorageProvider`]: bundles the backends and identifier for a platform
//!
//! # Platform Implementations
//!
//! ## iOS / macOS
//! - common: `UserDefaults` (foreign) or [`FileBackend`]
//! - credentials: Keychain Services (`KeychainBackend`, feature `platform-apple`)
//! - identifier: none, identity is generated and persisted in the Keychain
//!
//! ## Android (Kotlin)
//! - common: `SharedPreferences`
//! - credentials: `EncryptedSharedPreferences` backed by the Android Keystore
//! - identifier: `Settings.Secure.ANDROID_ID`
//!
//! ## Desktop
//! - both namespaces: [`FileBackend`] via [`FilePlatform`]

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::platform::{Platform, PlatformIdentifier};

mod file;
pub mod memory;

#[cfg(all(feature = "platform-apple", any(target_os = "macos", target_os = "ios")))]
mod keychain;

pub use file::{FileBackend, FilePlatform};
pub use memory::{MemoryBackend, MemoryPlatform};

#[cfg(all(feature = "platform-apple", any(target_os = "macos", target_os = "ios")))]
pub use keychain::{KeychainBackend, KeychainPlatform};

/// Byte-level persistence for one namespace.
///
/// Implementations must be internally synchronized. A completed `set_bytes`,
/// `remove` or `clear` must be visible to every subsequent call on the same
/// backend.
#[cfg_attr(feature = "ffi", uniffi::export(with_foreign))]
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Reads the bytes stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error only for actual I/O failures; a missing key is `Ok(None)`.
    async fn get_bytes(&self, key: String) -> StoreResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if the write could not be committed.
    async fn set_bytes(&self, key: String, value: Vec<u8>) -> StoreResult<()>;

    /// Removes `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error only for actual I/O failures.
    async fn remove(&self, key: String) -> StoreResult<()>;

    /// Removes every key. Clearing an empty backend succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry could not be removed.
    async fn clear(&self) -> StoreResult<()>;

    /// Checks whether `key` holds any value, regardless of its kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not be queried.
    async fn contains(&self, key: String) -> StoreResult<bool>;
}

/// Provider responsible for the platform-specific storage components.
#[cfg_attr(feature = "ffi", uniffi::export(with_foreign))]
pub trait StorageProvider: Send + Sync {
    /// Returns the backend for the plaintext `common` namespace.
    fn common_store(&self) -> Arc<dyn KeyValueBackend>;

    /// Returns the backend for the secure `credentials` namespace.
    fn credential_store(&self) -> Arc<dyn KeyValueBackend>;

    /// Returns the source of the system device identifier.
    fn platform_identifier(&self) -> Arc<dyn PlatformIdentifier>;

    /// Returns the platform the provider runs on, which selects the device
    /// identity strategy.
    fn platform(&self) -> Platform;
}
