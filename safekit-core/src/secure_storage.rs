//! The process-level storage object.

use std::path::Path;
use std::sync::Arc;

use crate::backend::StorageProvider;
use crate::clear::ProtectedClear;
use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::identity::DeviceIdentity;
use crate::logger;
use crate::namespace::Namespace;
use crate::platform::IdentityStrategy;
use crate::store::KeyValueStore;

/// Secure local storage with typed values and a stable device identity.
///
/// Build one instance at startup and share it (it is cheap to wrap in an
/// `Arc`). There is no global instance.
///
/// ```rust,no_run
/// # async fn example() -> safekit_core::StoreResult<()> {
/// use safekit_core::{Namespace, SecureStorage, StoreConfig};
///
/// let storage = SecureStorage::open("/var/lib/my-app/safekit", StoreConfig::default())?;
/// storage.store().save_string(Namespace::Credentials, "refresh_token", "r-123").await?;
/// let device_id = storage.get_device_id().await;
/// # let _ = device_id;
/// # Ok(())
/// # }
/// ```
pub struct SecureStorage {
    store: Arc<KeyValueStore>,
    identity: Arc<DeviceIdentity>,
    clear: ProtectedClear,
    config: StoreConfig,
}

impl SecureStorage {
    /// Assembles the storage from a platform provider.
    ///
    /// Applies the logging switch of `config` process-wide.
    #[must_use]
    pub fn new(provider: &dyn StorageProvider, config: StoreConfig) -> Self {
        logger::set_logging_enabled(config.enable_logging);

        let platform = provider.platform();
        let strategy = platform.identity_strategy();
        log::debug!("opening secure storage on {platform} with {strategy} identity");

        let store = Arc::new(KeyValueStore::from_provider(provider));
        let identity = Arc::new(DeviceIdentity::new(
            store.clone(),
            provider.platform_identifier(),
            strategy,
        ));
        let clear = ProtectedClear::new(store.clone(), identity.clone());

        Self {
            store,
            identity,
            clear,
            config,
        }
    }

    /// Opens the storage with the native provider for the current target.
    ///
    /// On Apple targets built with `platform-apple`, credentials live in the
    /// Keychain under `config.keychain_service`; everywhere else both
    /// namespaces are files under `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directories cannot be created.
    pub fn open<P: AsRef<Path>>(root: P, config: StoreConfig) -> StoreResult<Self> {
        #[cfg(all(feature = "platform-apple", any(target_os = "macos", target_os = "ios")))]
        let provider = crate::backend::KeychainPlatform::new(root, &config.keychain_service)?;

        #[cfg(not(all(feature = "platform-apple", any(target_os = "macos", target_os = "ios"))))]
        let provider = crate::backend::FilePlatform::new(root)?;

        Ok(Self::new(&provider, config))
    }

    /// Typed access to both namespaces.
    #[must_use]
    pub fn store(&self) -> &KeyValueStore {
        &self.store
    }

    /// The device identity provider.
    #[must_use]
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// The identity strategy selected for this platform.
    #[must_use]
    pub fn identity_strategy(&self) -> IdentityStrategy {
        self.identity.strategy()
    }

    /// The configuration this storage was opened with.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the stable device identifier. Never fails.
    pub async fn get_device_id(&self) -> String {
        self.identity.get_device_id().await
    }

    /// Clears `namespace`, keeping a locally stored device identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to clear or to restore the
    /// identity record.
    pub async fn clear_namespace(&self, namespace: Namespace) -> StoreResult<()> {
        self.clear.clear_namespace(namespace).await
    }

    /// Clears both namespaces, keeping a locally stored device identity.
    ///
    /// # Errors
    ///
    /// Returns an error if any namespace fails to clear or the identity
    /// record cannot be restored.
    pub async fn clear_all(&self) -> StoreResult<()> {
        self.clear.clear_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryPlatform;
    use crate::platform::Platform;

    #[tokio::test]
    async fn test_strategy_follows_platform() {
        let android = SecureStorage::new(
            &MemoryPlatform::new(Platform::Android),
            StoreConfig::default(),
        );
        assert_eq!(android.identity_strategy(), IdentityStrategy::SystemId);

        let ios = SecureStorage::new(&MemoryPlatform::new(Platform::Ios), StoreConfig::default());
        assert_eq!(ios.identity_strategy(), IdentityStrategy::GeneratedPersisted);
    }

    #[tokio::test]
    async fn test_android_without_system_id_still_has_identity() {
        // NoSystemIdentifier on a SystemId platform exercises the fallback
        let storage = SecureStorage::new(
            &MemoryPlatform::new(Platform::Android),
            StoreConfig::default(),
        );
        let id = storage.get_device_id().await;
        storage.clear_all().await.unwrap();
        assert_eq!(storage.get_device_id().await, id);
    }

    #[tokio::test]
    async fn test_open_on_disk() {
        let root = std::env::temp_dir().join(format!("safekit-open-{}", uuid::Uuid::new_v4()));
        let config = StoreConfig {
            keychain_service: format!("io.safekit.test.{}", uuid::Uuid::new_v4()),
            ..StoreConfig::default()
        };

        let id = {
            let storage = SecureStorage::open(&root, config.clone()).unwrap();
            storage
                .store()
                .save_int(Namespace::Common, "launches", 3)
                .await
                .unwrap();
            storage.get_device_id().await
        };

        let reopened = SecureStorage::open(&root, config).unwrap();
        assert_eq!(
            reopened.store().read_int(Namespace::Common, "launches").await,
            Some(3)
        );
        assert_eq!(reopened.get_device_id().await, id);

        reopened.clear_all().await.unwrap();
        std::fs::remove_dir_all(root).unwrap();
    }
}
