//! Stable per-device identifier.
//!
//! Resolution order:
//! 1. With [`IdentityStrategy::SystemId`], the OS identifier, cached for the
//!    lifetime of the process once a non-empty answer was seen.
//! 2. The identity record in the credentials namespace.
//! 3. A freshly generated UUID v4, persisted as the identity record.
//!
//! If step 2 or 3 fails, a random identifier is returned for that call only.
//! It is not persisted, so the next call may return a different value.

use std::sync::{Arc, OnceLock};

use uuid::Uuid;

use crate::namespace::Namespace;
use crate::platform::{IdentityStrategy, PlatformIdentifier};
use crate::store::KeyValueStore;
use crate::value::StoredValue;

/// Reserved key of the device identity record in the credentials namespace.
pub const DEVICE_ID_KEY: &str = "safekit.device_id";

/// Produces the device identifier.
pub struct DeviceIdentity {
    store: Arc<KeyValueStore>,
    identifier: Arc<dyn PlatformIdentifier>,
    strategy: IdentityStrategy,
    /// Non-empty system identifier, written at most once.
    system_id: OnceLock<String>,
}

impl DeviceIdentity {
    /// Creates an identity provider.
    #[must_use]
    pub fn new(
        store: Arc<KeyValueStore>,
        identifier: Arc<dyn PlatformIdentifier>,
        strategy: IdentityStrategy,
    ) -> Self {
        Self {
            store,
            identifier,
            strategy,
            system_id: OnceLock::new(),
        }
    }

    /// The strategy selected for this platform.
    #[must_use]
    pub const fn strategy(&self) -> IdentityStrategy {
        self.strategy
    }

    /// Returns the device identifier. Never fails.
    pub async fn get_device_id(&self) -> String {
        if let Some(id) = self.system_id().await {
            return id;
        }

        match self.persisted_or_generate().await {
            Ok(id) => id,
            Err(err) => {
                log::warn!("device identity unavailable, using a one-off identifier: {err}");
                Uuid::new_v4().to_string()
            }
        }
    }

    /// Whether the identity record is the only copy of the device identity
    /// right now, i.e. whether a clear of the credentials namespace would
    /// lose it.
    pub async fn is_stored_locally(&self) -> bool {
        self.strategy.always_stored_locally() || self.system_id().await.is_none()
    }

    /// Reads the persisted identity record.
    pub async fn stored_id(&self) -> Option<String> {
        self.store
            .read_string(Namespace::Credentials, DEVICE_ID_KEY)
            .await
            .filter(|id| !id.is_empty())
    }

    /// Writes the identity record.
    pub(crate) async fn restore(&self, id: &str) -> crate::StoreResult<()> {
        self.store
            .save_string(Namespace::Credentials, DEVICE_ID_KEY, id)
            .await
    }

    /// Queries the OS identifier when the strategy uses it.
    ///
    /// Concurrent first calls may each query the platform; they all store the
    /// same value, and only the first write lands.
    async fn system_id(&self) -> Option<String> {
        if self.strategy != IdentityStrategy::SystemId {
            return None;
        }
        if let Some(id) = self.system_id.get() {
            return Some(id.clone());
        }

        match self.identifier.system_identifier().await {
            Ok(id) if !id.is_empty() => Some(self.system_id.get_or_init(|| id).clone()),
            Ok(_) => {
                log::debug!("system identifier is empty, falling back to a generated one");
                None
            }
            Err(err) => {
                log::warn!("system identifier unavailable: {err}");
                None
            }
        }
    }

    /// Reads the identity record, propagating backend read failures.
    ///
    /// A record that is not a non-empty string reads as `None`.
    pub(crate) async fn read_record(&self) -> crate::StoreResult<Option<String>> {
        let Some(bytes) = self.store.read_raw(Namespace::Credentials, DEVICE_ID_KEY).await? else {
            return Ok(None);
        };

        let id = crate::value::decode_lenient(&bytes)
            .and_then(String::from_typed)
            .filter(|id| !id.is_empty());
        if id.is_none() {
            log::warn!("identity record is not a usable string");
        }
        Ok(id)
    }

    async fn persisted_or_generate(&self) -> crate::StoreResult<String> {
        // A read failure must not be mistaken for "no record", or a new
        // identity would overwrite the existing one.
        if let Some(id) = self.read_record().await? {
            return Ok(id);
        }

        let id = Uuid::new_v4().to_string();
        self.restore(&id).await?;
        log::info!("generated a new device identifier");
        Ok(id)
    }
}
