//! Typed key-value access over the two namespaces.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::backend::{KeyValueBackend, StorageProvider};
use crate::error::{StoreError, StoreResult};
use crate::namespace::Namespace;
use crate::value::{self, StoredValue, TypedValue};

/// Uniform typed access to the `common` and `credentials` namespaces.
///
/// Reads never fail: a missing key, a value of another kind, undecodable
/// data and backend read errors all come back as `None` (the latter two are
/// logged). Writes and clears propagate backend failures, since a lost write
/// must be visible to the caller.
///
/// Concurrent writes to the same key are last-writer-wins.
pub struct KeyValueStore {
    common: Arc<dyn KeyValueBackend>,
    credentials: Arc<dyn KeyValueBackend>,
}

impl KeyValueStore {
    /// Creates a store over explicit backends.
    #[must_use]
    pub fn new(common: Arc<dyn KeyValueBackend>, credentials: Arc<dyn KeyValueBackend>) -> Self {
        Self {
            common,
            credentials,
        }
    }

    /// Creates a store over the backends of a platform provider.
    #[must_use]
    pub fn from_provider(provider: &dyn StorageProvider) -> Self {
        Self::new(provider.common_store(), provider.credential_store())
    }

    fn backend(&self, namespace: Namespace) -> &dyn KeyValueBackend {
        match namespace {
            Namespace::Common => self.common.as_ref(),
            Namespace::Credentials => self.credentials.as_ref(),
        }
    }

    /// Stores `value` under `key`, replacing any previous value of any kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty, the value cannot be encoded, or
    /// the backend fails to commit the write.
    pub async fn save(
        &self,
        namespace: Namespace,
        key: &str,
        value: impl Into<TypedValue> + Send,
    ) -> StoreResult<()> {
        validate_key(key)?;
        let bytes = value::encode(&value.into())?;
        self.backend(namespace)
            .set_bytes(key.to_string(), bytes)
            .await?;
        log::debug!("saved {namespace}/{key}");
        Ok(())
    }

    /// Reads the value stored under `key`, whatever its kind.
    pub async fn read(&self, namespace: Namespace, key: &str) -> Option<TypedValue> {
        let bytes = self.read_bytes_lenient(namespace, key).await?;
        value::decode_lenient(&bytes)
    }

    /// Reads the value stored under `key` if it has the kind of `T`.
    pub async fn read_as<T: StoredValue>(&self, namespace: Namespace, key: &str) -> Option<T> {
        let bytes = self.read_bytes_lenient(namespace, key).await?;
        value::decode_as(&bytes, T::KIND).and_then(T::from_typed)
    }

    /// Reads the stored representation of `key` without decoding it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or the backend read fails.
    pub async fn read_raw(&self, namespace: Namespace, key: &str) -> StoreResult<Option<Vec<u8>>> {
        validate_key(key)?;
        self.backend(namespace).get_bytes(key.to_string()).await
    }

    /// Removes `key`. Removing a missing key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or the backend fails.
    pub async fn remove(&self, namespace: Namespace, key: &str) -> StoreResult<()> {
        validate_key(key)?;
        self.backend(namespace).remove(key.to_string()).await?;
        log::debug!("removed {namespace}/{key}");
        Ok(())
    }

    /// Removes every key in `namespace`, including the device identity record.
    ///
    /// Use [`ProtectedClear`](crate::ProtectedClear) to keep the identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub async fn clear(&self, namespace: Namespace) -> StoreResult<()> {
        self.backend(namespace).clear().await?;
        log::debug!("cleared {namespace}");
        Ok(())
    }

    /// Reports whether `key` holds a string.
    ///
    /// This is a string-typed probe: a key holding any other kind reports
    /// `false`. Use [`KeyValueStore::contains`] for a kind-agnostic check.
    pub async fn contains_key(&self, namespace: Namespace, key: &str) -> bool {
        self.read_as::<String>(namespace, key).await.is_some()
    }

    /// Reports whether `key` holds a value of any kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or the backend cannot be queried.
    pub async fn contains(&self, namespace: Namespace, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        self.backend(namespace).contains(key.to_string()).await
    }

    async fn read_bytes_lenient(&self, namespace: Namespace, key: &str) -> Option<Vec<u8>> {
        match self.read_raw(namespace, key).await {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("reading {namespace}/{key} failed: {err}");
                None
            }
        }
    }

    // ---------------------------------------------------------------------
    // Typed helpers
    // ---------------------------------------------------------------------

    /// Stores a string.
    ///
    /// # Errors
    ///
    /// See [`KeyValueStore::save`].
    pub async fn save_string(
        &self,
        namespace: Namespace,
        key: &str,
        value: &str,
    ) -> StoreResult<()> {
        self.save(namespace, key, value).await
    }

    /// Reads a string.
    pub async fn read_string(&self, namespace: Namespace, key: &str) -> Option<String> {
        self.read_as(namespace, key).await
    }

    /// Stores a 64-bit integer.
    ///
    /// # Errors
    ///
    /// See [`KeyValueStore::save`].
    pub async fn save_int(&self, namespace: Namespace, key: &str, value: i64) -> StoreResult<()> {
        self.save(namespace, key, value).await
    }

    /// Reads a 64-bit integer. A stored double reads as absent.
    pub async fn read_int(&self, namespace: Namespace, key: &str) -> Option<i64> {
        self.read_as(namespace, key).await
    }

    /// Stores a double.
    ///
    /// # Errors
    ///
    /// See [`KeyValueStore::save`]; non-finite values are rejected.
    pub async fn save_double(
        &self,
        namespace: Namespace,
        key: &str,
        value: f64,
    ) -> StoreResult<()> {
        self.save(namespace, key, value).await
    }

    /// Reads a double. A stored integer reads as absent.
    pub async fn read_double(&self, namespace: Namespace, key: &str) -> Option<f64> {
        self.read_as(namespace, key).await
    }

    /// Stores a boolean.
    ///
    /// # Errors
    ///
    /// See [`KeyValueStore::save`].
    pub async fn save_bool(&self, namespace: Namespace, key: &str, value: bool) -> StoreResult<()> {
        self.save(namespace, key, value).await
    }

    /// Reads a boolean.
    pub async fn read_bool(&self, namespace: Namespace, key: &str) -> Option<bool> {
        self.read_as(namespace, key).await
    }

    /// Stores a byte sequence.
    ///
    /// # Errors
    ///
    /// See [`KeyValueStore::save`].
    pub async fn save_bytes(
        &self,
        namespace: Namespace,
        key: &str,
        value: &[u8],
    ) -> StoreResult<()> {
        self.save(namespace, key, value.to_vec()).await
    }

    /// Reads a byte sequence.
    pub async fn read_bytes(&self, namespace: Namespace, key: &str) -> Option<Vec<u8>> {
        self.read_as(namespace, key).await
    }

    /// Stores an ordered list of values.
    ///
    /// # Errors
    ///
    /// See [`KeyValueStore::save`].
    pub async fn save_list(
        &self,
        namespace: Namespace,
        key: &str,
        value: Vec<TypedValue>,
    ) -> StoreResult<()> {
        self.save(namespace, key, value).await
    }

    /// Reads an ordered list of values.
    pub async fn read_list(&self, namespace: Namespace, key: &str) -> Option<Vec<TypedValue>> {
        self.read_as(namespace, key).await
    }

    /// Stores a string-keyed map of values.
    ///
    /// # Errors
    ///
    /// See [`KeyValueStore::save`].
    pub async fn save_map(
        &self,
        namespace: Namespace,
        key: &str,
        value: BTreeMap<String, TypedValue>,
    ) -> StoreResult<()> {
        self.save(namespace, key, value).await
    }

    /// Reads a string-keyed map of values.
    pub async fn read_map(
        &self,
        namespace: Namespace,
        key: &str,
    ) -> Option<BTreeMap<String, TypedValue>> {
        self.read_as(namespace, key).await
    }

    /// Stores any serializable object as a value tree.
    ///
    /// # Errors
    ///
    /// See [`KeyValueStore::save`] and [`TypedValue::from_serialize`].
    pub async fn save_object<T: Serialize + Sync + ?Sized>(
        &self,
        namespace: Namespace,
        key: &str,
        object: &T,
    ) -> StoreResult<()> {
        let value = TypedValue::from_serialize(object)?;
        self.save(namespace, key, value).await
    }

    /// Reads an object saved with [`KeyValueStore::save_object`].
    ///
    /// Data that does not match the shape of `T` reads as absent and is
    /// logged.
    pub async fn read_object<T: DeserializeOwned>(
        &self,
        namespace: Namespace,
        key: &str,
    ) -> Option<T> {
        let value = self.read(namespace, key).await?;
        match value.deserialize_into() {
            Ok(object) => Some(object),
            Err(err) => {
                log::warn!("{namespace}/{key} does not hold the requested object: {err}");
                None
            }
        }
    }
}

fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
