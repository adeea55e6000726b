//! Keychain-backed backend for the credentials namespace on Apple platforms.
//!
//! Each entry is a generic password item whose service is the namespace
//! service and whose account is the entry key. The Keychain cannot be
//! enumerated per service through the password API, so the backend keeps an
//! index item listing its keys; `clear` walks that index.
//!
//! Items use the default accessibility of `set_generic_password`. They are
//! not removed when the application is uninstalled.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use security_framework::passwords::{
    delete_generic_password, get_generic_password, set_generic_password,
};
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::platform::{NoSystemIdentifier, Platform, PlatformIdentifier};

use super::{FileBackend, KeyValueBackend, StorageProvider};

/// `errSecItemNotFound`.
const ERR_SEC_ITEM_NOT_FOUND: i32 = -25300;

/// Account of the item holding the key index.
const INDEX_ACCOUNT: &str = "__safekit_index__";

/// Keychain Services implementation of [`KeyValueBackend`].
pub struct KeychainBackend {
    service: String,
    /// Serializes index updates.
    index_lock: Mutex<()>,
}

impl KeychainBackend {
    /// Creates a backend storing items under `service`.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            index_lock: Mutex::new(()),
        }
    }

    async fn blocking<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(String) -> StoreResult<T> + Send + 'static,
    {
        let service = self.service.clone();
        tokio::task::spawn_blocking(move || f(service))
            .await
            .map_err(|e| StoreError::backend(format!("keychain task failed: {e}")))?
    }

    async fn read_index(&self) -> StoreResult<BTreeSet<String>> {
        let raw = self.blocking(|service| read_item(&service, INDEX_ACCOUNT)).await?;
        match raw {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Keychain(format!("corrupted key index: {e}"))),
            None => Ok(BTreeSet::new()),
        }
    }

    async fn write_index(&self, index: BTreeSet<String>) -> StoreResult<()> {
        if index.is_empty() {
            return self
                .blocking(|service| delete_item(&service, INDEX_ACCOUNT))
                .await;
        }
        let bytes =
            serde_json::to_vec(&index).map_err(|e| StoreError::serialization(e.to_string()))?;
        self.blocking(move |service| write_item(&service, INDEX_ACCOUNT, &bytes))
            .await
    }
}

fn read_item(service: &str, account: &str) -> StoreResult<Option<Vec<u8>>> {
    match get_generic_password(service, account) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.code() == ERR_SEC_ITEM_NOT_FOUND => Ok(None),
        Err(e) => Err(StoreError::Keychain(format!(
            "reading '{account}' from '{service}': {e}"
        ))),
    }
}

fn write_item(service: &str, account: &str, bytes: &[u8]) -> StoreResult<()> {
    set_generic_password(service, account, bytes).map_err(|e| {
        StoreError::Keychain(format!("writing '{account}' to '{service}': {e}"))
    })
}

fn delete_item(service: &str, account: &str) -> StoreResult<()> {
    match delete_generic_password(service, account) {
        Ok(()) => Ok(()),
        Err(e) if e.code() == ERR_SEC_ITEM_NOT_FOUND => Ok(()),
        Err(e) => Err(StoreError::Keychain(format!(
            "deleting '{account}' from '{service}': {e}"
        ))),
    }
}

fn check_key(key: &str) -> StoreResult<()> {
    if key == INDEX_ACCOUNT {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[async_trait]
impl KeyValueBackend for KeychainBackend {
    async fn get_bytes(&self, key: String) -> StoreResult<Option<Vec<u8>>> {
        check_key(&key)?;
        self.blocking(move |service| read_item(&service, &key)).await
    }

    async fn set_bytes(&self, key: String, value: Vec<u8>) -> StoreResult<()> {
        check_key(&key)?;
        let _guard = self.index_lock.lock().await;
        let account = key.clone();
        self.blocking(move |service| write_item(&service, &account, &value))
            .await?;

        let mut index = self.read_index().await?;
        if index.insert(key) {
            self.write_index(index).await?;
        }
        Ok(())
    }

    async fn remove(&self, key: String) -> StoreResult<()> {
        check_key(&key)?;
        let _guard = self.index_lock.lock().await;
        let account = key.clone();
        self.blocking(move |service| delete_item(&service, &account))
            .await?;

        let mut index = self.read_index().await?;
        if index.remove(&key) {
            self.write_index(index).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        let _guard = self.index_lock.lock().await;
        let index = self.read_index().await?;
        log::debug!("clearing {} keychain items from {}", index.len(), self.service);
        for key in index {
            self.blocking(move |service| delete_item(&service, &key))
                .await?;
        }
        self.write_index(BTreeSet::new()).await
    }

    async fn contains(&self, key: String) -> StoreResult<bool> {
        Ok(self.get_bytes(key).await?.is_some())
    }
}

/// Apple provider: plaintext entries on disk, credentials in the Keychain.
pub struct KeychainPlatform {
    common: Arc<FileBackend>,
    credentials: Arc<KeychainBackend>,
    identifier: Arc<dyn PlatformIdentifier>,
}

impl KeychainPlatform {
    /// Opens the common namespace under `root` and the credentials
    /// namespace under the Keychain service `<keychain_service>.credentials`.
    ///
    /// # Errors
    ///
    /// Returns an error if the common directory cannot be created.
    pub fn new<P: AsRef<Path>>(root: P, keychain_service: &str) -> StoreResult<Self> {
        Ok(Self {
            common: Arc::new(FileBackend::new(root.as_ref().join("common"))?),
            credentials: Arc::new(KeychainBackend::new(format!(
                "{keychain_service}.credentials"
            ))),
            identifier: Arc::new(NoSystemIdentifier),
        })
    }
}

impl StorageProvider for KeychainPlatform {
    fn common_store(&self) -> Arc<dyn KeyValueBackend> {
        self.common.clone()
    }

    fn credential_store(&self) -> Arc<dyn KeyValueBackend> {
        self.credentials.clone()
    }

    fn platform_identifier(&self) -> Arc<dyn PlatformIdentifier> {
        self.identifier.clone()
    }

    fn platform(&self) -> Platform {
        Platform::current()
    }
}
