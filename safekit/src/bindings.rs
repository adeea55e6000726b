use std::sync::Arc;

use safekit_core::{
    Namespace, SecureStorage, StorageProvider, StoreConfig, StoreError, StoreResult, TypedValue,
};

/// Secure storage handle for foreign hosts.
///
/// Hosts construct it once, passing their platform provider (for example a
/// Kotlin implementation backed by `SharedPreferences`,
/// `EncryptedSharedPreferences` and `ANDROID_ID`), and keep it for the
/// lifetime of the process.
#[derive(uniffi::Object)]
pub struct SafeKit {
    inner: SecureStorage,
}

fn parse_config(config: Option<String>) -> StoreResult<StoreConfig> {
    config.map_or_else(|| Ok(StoreConfig::default()), |json| StoreConfig::from_json(&json))
}

#[uniffi::export(async_runtime = "tokio")]
impl SafeKit {
    /// Creates the storage over a host-provided platform.
    ///
    /// `config` is an optional JSON document, see [`StoreConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is not a valid configuration document.
    #[uniffi::constructor]
    pub fn new(
        provider: Arc<dyn StorageProvider>,
        config: Option<String>,
    ) -> Result<Arc<Self>, StoreError> {
        let config = parse_config(config)?;
        Ok(Arc::new(Self {
            inner: SecureStorage::new(provider.as_ref(), config),
        }))
    }

    /// Opens the storage with the native Rust backends under `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid or `root` cannot be used.
    #[uniffi::constructor]
    pub fn open(root: String, config: Option<String>) -> Result<Arc<Self>, StoreError> {
        let config = parse_config(config)?;
        Ok(Arc::new(Self {
            inner: SecureStorage::open(root, config)?,
        }))
    }

    /// Stores a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn save_string(
        &self,
        namespace: Namespace,
        key: String,
        value: String,
    ) -> Result<(), StoreError> {
        self.inner.store().save(namespace, &key, value).await
    }

    /// Reads a string; absent for missing keys and other kinds.
    pub async fn read_string(&self, namespace: Namespace, key: String) -> Option<String> {
        self.inner.store().read_string(namespace, &key).await
    }

    /// Stores a 64-bit integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn save_int(
        &self,
        namespace: Namespace,
        key: String,
        value: i64,
    ) -> Result<(), StoreError> {
        self.inner.store().save_int(namespace, &key, value).await
    }

    /// Reads a 64-bit integer.
    pub async fn read_int(&self, namespace: Namespace, key: String) -> Option<i64> {
        self.inner.store().read_int(namespace, &key).await
    }

    /// Stores a double.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not finite or the write fails.
    pub async fn save_double(
        &self,
        namespace: Namespace,
        key: String,
        value: f64,
    ) -> Result<(), StoreError> {
        self.inner.store().save_double(namespace, &key, value).await
    }

    /// Reads a double.
    pub async fn read_double(&self, namespace: Namespace, key: String) -> Option<f64> {
        self.inner.store().read_double(namespace, &key).await
    }

    /// Stores a boolean.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn save_bool(
        &self,
        namespace: Namespace,
        key: String,
        value: bool,
    ) -> Result<(), StoreError> {
        self.inner.store().save_bool(namespace, &key, value).await
    }

    /// Reads a boolean.
    pub async fn read_bool(&self, namespace: Namespace, key: String) -> Option<bool> {
        self.inner.store().read_bool(namespace, &key).await
    }

    /// Stores a byte sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn save_bytes(
        &self,
        namespace: Namespace,
        key: String,
        value: Vec<u8>,
    ) -> Result<(), StoreError> {
        self.inner.store().save(namespace, &key, value).await
    }

    /// Reads a byte sequence.
    pub async fn read_bytes(&self, namespace: Namespace, key: String) -> Option<Vec<u8>> {
        self.inner.store().read_bytes(namespace, &key).await
    }

    /// Stores a JSON document (object, array or scalar) as a typed value.
    ///
    /// This is how hosts persist lists, maps and custom objects.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not valid JSON, contains a `null`
    /// outside an object member, or the write fails.
    pub async fn save_json(
        &self,
        namespace: Namespace,
        key: String,
        json: String,
    ) -> Result<(), StoreError> {
        let document: serde_json::Value =
            serde_json::from_str(&json).map_err(|e| StoreError::serialization(e.to_string()))?;
        let value = TypedValue::try_from(document)?;
        self.inner.store().save(namespace, &key, value).await
    }

    /// Reads any stored value back as a JSON document.
    ///
    /// Byte sequences are rendered as arrays of numbers.
    pub async fn read_json(&self, namespace: Namespace, key: String) -> Option<String> {
        let value = self.inner.store().read(namespace, &key).await?;
        Some(serde_json::Value::from(value).to_string())
    }

    /// Returns the stored representation of `key` without decoding it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    pub async fn read_raw(
        &self,
        namespace: Namespace,
        key: String,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.store().read_raw(namespace, &key).await
    }

    /// Removes `key`; a missing key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub async fn remove(&self, namespace: Namespace, key: String) -> Result<(), StoreError> {
        self.inner.store().remove(namespace, &key).await
    }

    /// Reports whether `key` holds a string value.
    pub async fn contains_key(&self, namespace: Namespace, key: String) -> bool {
        self.inner.store().contains_key(namespace, &key).await
    }

    /// Reports whether `key` holds a value of any kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be queried.
    pub async fn contains(&self, namespace: Namespace, key: String) -> Result<bool, StoreError> {
        self.inner.store().contains(namespace, &key).await
    }

    /// Returns the stable device identifier.
    pub async fn get_device_id(&self) -> String {
        self.inner.get_device_id().await
    }

    /// Clears one namespace, keeping the device identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the clear fails.
    pub async fn clear_namespace(&self, namespace: Namespace) -> Result<(), StoreError> {
        self.inner.clear_namespace(namespace).await
    }

    /// Clears both namespaces, keeping the device identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the clear fails.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        self.inner.clear_all().await
    }
}

#[cfg(test)]
mod tests {
    use safekit_core::backend::MemoryPlatform;
    use safekit_core::Platform;

    use super::*;

    fn safekit() -> Arc<SafeKit> {
        SafeKit::new(
            Arc::new(MemoryPlatform::new(Platform::Ios)),
            Some(r#"{"enable_logging": false}"#.to_string()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_typed_helpers() {
        let kit = safekit();
        kit.save_string(Namespace::Common, "k".into(), "hello".into())
            .await
            .unwrap();
        assert_eq!(
            kit.read_string(Namespace::Common, "k".into()).await.as_deref(),
            Some("hello")
        );
        assert!(kit.contains_key(Namespace::Common, "k".into()).await);

        kit.save_int(Namespace::Common, "k".into(), 42).await.unwrap();
        assert_eq!(kit.read_string(Namespace::Common, "k".into()).await, None);
        assert_eq!(kit.read_int(Namespace::Common, "k".into()).await, Some(42));
        assert!(!kit.contains_key(Namespace::Common, "k".into()).await);
        assert!(kit.contains(Namespace::Common, "k".into()).await.unwrap());
    }

    #[tokio::test]
    async fn test_json_documents() {
        let kit = safekit();
        kit.save_json(
            Namespace::Credentials,
            "profile".into(),
            r#"{"name":"Ada","langs":["en","fr"],"age":36,"ratio":0.5}"#.into(),
        )
        .await
        .unwrap();

        let json = kit
            .read_json(Namespace::Credentials, "profile".into())
            .await
            .unwrap();
        let back: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back,
            serde_json::json!({"age": 36, "langs": ["en", "fr"], "name": "Ada", "ratio": 0.5})
        );

        let err = kit
            .save_json(Namespace::Common, "bad".into(), "{not json".into())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_identity_survives_clear() {
        let kit = safekit();
        let id = kit.get_device_id().await;
        kit.save_bool(Namespace::Credentials, "onboarded".into(), true)
            .await
            .unwrap();

        kit.clear_all().await.unwrap();
        assert_eq!(kit.read_bool(Namespace::Credentials, "onboarded".into()).await, None);
        assert_eq!(kit.get_device_id().await, id);
    }

    #[test]
    fn test_invalid_config() {
        let result = SafeKit::new(
            Arc::new(MemoryPlatform::new(Platform::Ios)),
            Some("[]".to_string()),
        );
        assert!(matches!(result, Err(StoreError::InvalidConfig(_))));
    }
}
