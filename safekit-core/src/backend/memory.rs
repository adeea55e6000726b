//! In-memory implementations of the platform traits.
//!
//! Nothing here is persisted or protected. These are meant for tests and for
//! hosts that want an ephemeral store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use crate::error::{PlatformError, StoreError, StoreResult};
use crate::platform::{NoSystemIdentifier, Platform, PlatformIdentifier};

use super::{KeyValueBackend, StorageProvider};

fn poisoned<T>(_: T) -> StoreError {
    StoreError::backend("lock poisoned")
}

// =============================================================================
// Memory Backend
// =============================================================================

/// In-memory key space backed by a `HashMap`.
///
/// Writes can be made to fail on demand, which lets tests exercise the
/// error paths of the store.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryBackend {
    /// Creates a new empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |entries| entries.len())
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns all stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Makes every subsequent `set_bytes`, `remove` and `clear` fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `get_bytes` and `contains` fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::backend("write rejected"));
        }
        Ok(())
    }

    fn check_readable(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::backend("read rejected"));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    async fn get_bytes(&self, key: String) -> StoreResult<Option<Vec<u8>>> {
        self.check_readable()?;
        Ok(self.entries.read().map_err(poisoned)?.get(&key).cloned())
    }

    async fn set_bytes(&self, key: String, value: Vec<u8>) -> StoreResult<()> {
        self.check_writable()?;
        self.entries.write().map_err(poisoned)?.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: String) -> StoreResult<()> {
        self.check_writable()?;
        self.entries.write().map_err(poisoned)?.remove(&key);
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.check_writable()?;
        self.entries.write().map_err(poisoned)?.clear();
        Ok(())
    }

    async fn contains(&self, key: String) -> StoreResult<bool> {
        self.check_readable()?;
        Ok(self.entries.read().map_err(poisoned)?.contains_key(&key))
    }
}

// =============================================================================
// Fixed Identifier
// =============================================================================

/// Platform identifier source that returns a preconfigured answer.
///
/// Counts how often it was queried so tests can check caching.
#[derive(Debug)]
pub struct FixedIdentifier {
    answer: Mutex<Result<String, String>>,
    calls: AtomicUsize,
}

impl FixedIdentifier {
    /// Always answers with `identifier` (which may be empty).
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            answer: Mutex::new(Ok(identifier.into())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fails with a platform API error carrying `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            answer: Mutex::new(Err(message.into())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Replaces the answer returned by subsequent queries.
    pub fn set_answer(&self, answer: Result<String, String>) {
        if let Ok(mut guard) = self.answer.lock() {
            *guard = answer;
        }
    }

    /// Number of times the identifier was queried.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformIdentifier for FixedIdentifier {
    async fn system_identifier(&self) -> Result<String, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self
            .answer
            .lock()
            .map_err(|_| PlatformError::Api("lock poisoned".to_string()))?
            .clone();
        answer.map_err(PlatformError::Api)
    }
}

// =============================================================================
// Memory Platform Bundle
// =============================================================================

/// Combines in-memory backends and an identifier source into a provider.
///
/// # Example
///
/// ```
/// use safekit_core::backend::MemoryPlatform;
/// use safekit_core::Platform;
///
/// let platform = MemoryPlatform::new(Platform::Ios);
/// assert!(platform.common.is_empty());
/// ```
pub struct MemoryPlatform {
    /// Backend for the `common` namespace.
    pub common: Arc<MemoryBackend>,
    /// Backend for the `credentials` namespace.
    pub credentials: Arc<MemoryBackend>,
    /// System identifier source.
    pub identifier: Arc<dyn PlatformIdentifier>,
    platform: Platform,
}

impl MemoryPlatform {
    /// Creates a provider for `platform` with no system identifier.
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self::with_identifier(platform, Arc::new(NoSystemIdentifier))
    }

    /// Creates a provider for `platform` that queries `identifier`.
    #[must_use]
    pub fn with_identifier(platform: Platform, identifier: Arc<dyn PlatformIdentifier>) -> Self {
        Self {
            common: Arc::new(MemoryBackend::new()),
            credentials: Arc::new(MemoryBackend::new()),
            identifier,
            platform,
        }
    }
}

impl StorageProvider for MemoryPlatform {
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
        self.platform
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_basic() {
        let store = MemoryBackend::new();

        assert!(store.is_empty());
        assert!(store.get_bytes("test".to_string()).await.unwrap().is_none());

        store
            .set_bytes("test".to_string(), b"hello".to_vec())
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.contains("test".to_string()).await.unwrap());
        assert_eq!(
            store.get_bytes("test".to_string()).await.unwrap(),
            Some(b"hello".to_vec())
        );

        store
            .set_bytes("test".to_string(), b"world".to_vec())
            .await
            .unwrap();
        assert_eq!(
            store.get_bytes("test".to_string()).await.unwrap(),
            Some(b"world".to_vec())
        );

        store.remove("test".to_string()).await.unwrap();
        assert!(!store.contains("test".to_string()).await.unwrap());

        // removing twice is fine
        store.remove("test".to_string()).await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_backend_clear() {
        let store = MemoryBackend::new();
        for name in ["c", "a", "b"] {
            store
                .set_bytes(name.to_string(), name.as_bytes().to_vec())
                .await
                .unwrap();
        }
        assert_eq!(store.keys(), vec!["a", "b", "c"]);

        store.clear().await.unwrap();
        assert!(store.is_empty());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_backend_failure_injection() {
        let store = MemoryBackend::new();
        store.set_fail_writes(true);
        assert!(store.set_bytes("k".to_string(), vec![1]).await.is_err());
        assert!(store.clear().await.is_err());
        assert!(store.get_bytes("k".to_string()).await.unwrap().is_none());

        store.set_fail_writes(false);
        store.set_fail_reads(true);
        store.set_bytes("k".to_string(), vec![1]).await.unwrap();
        assert!(store.get_bytes("k".to_string()).await.is_err());
        assert!(store.contains("k".to_string()).await.is_err());
    }

    #[tokio::test]
    async fn test_fixed_identifier() {
        let identifier = FixedIdentifier::new("a1b2");
        assert_eq!(identifier.system_identifier().await.unwrap(), "a1b2");

        identifier.set_answer(Err("SecurityException".to_string()));
        assert!(identifier.system_identifier().await.is_err());
        assert_eq!(identifier.calls(), 2);
    }

    #[test]
    fn test_memory_platform_bundle() {
        let platform = MemoryPlatform::new(Platform::Linux);
        assert_eq!(platform.platform(), Platform::Linux);
        assert!(platform.common.is_empty());
        assert!(platform.credentials.is_empty());
    }

    #[tokio::test]
    async fn test_memory_backend_thread_safety() {
        let store = Arc::new(MemoryBackend::new());
        let mut handles = vec![];

        for i in 0..10 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .set_bytes(format!("key-{i}"), format!("value-{i}").into_bytes())
                    .await
                    .unwrap();
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len(), 10);
    }
}
