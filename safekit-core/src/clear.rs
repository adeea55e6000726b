//! Bulk clears that keep the device identity record.

use std::sync::Arc;

use strum::IntoEnumIterator;

use crate::error::StoreResult;
use crate::identity::DeviceIdentity;
use crate::namespace::Namespace;
use crate::store::KeyValueStore;

/// Namespace holding the device identity record.
const IDENTITY_NAMESPACE: Namespace = Namespace::Credentials;

/// Clears namespaces without losing a locally stored device identity.
///
/// When the cleared namespace holds the identity record and that record is
/// the only copy of the identity (see [`DeviceIdentity::is_stored_locally`]),
/// the record is read before the clear and written back afterwards. A missing
/// record is not recreated.
///
/// The read-clear-restore sequence is not atomic: an identity write from
/// another caller between the read and the restore is overwritten by the
/// restored value.
pub struct ProtectedClear {
    store: Arc<KeyValueStore>,
    identity: Arc<DeviceIdentity>,
}

impl ProtectedClear {
    /// Creates a protected clear over `store` guarding `identity`.
    #[must_use]
    pub fn new(store: Arc<KeyValueStore>, identity: Arc<DeviceIdentity>) -> Self {
        Self { store, identity }
    }

    /// Clears one namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity record could not be read beforehand
    /// (nothing is cleared then), if the clear fails, or if the record could
    /// not be written back.
    pub async fn clear_namespace(&self, namespace: Namespace) -> StoreResult<()> {
        let retained = if namespace == IDENTITY_NAMESPACE {
            self.backup().await?
        } else {
            None
        };

        self.store.clear(namespace).await?;

        if let Some(id) = retained {
            self.identity.restore(&id).await?;
            log::debug!("restored device identity after clearing {namespace}");
        }
        Ok(())
    }

    /// Clears every namespace.
    ///
    /// # Errors
    ///
    /// Stops at the first namespace that fails to clear.
    pub async fn clear_all(&self) -> StoreResult<()> {
        for namespace in Namespace::iter() {
            self.clear_namespace(namespace).await?;
        }
        Ok(())
    }

    /// Reads the record to retain. A failed read aborts the clear, since
    /// clearing would then lose the identity.
    async fn backup(&self) -> StoreResult<Option<String>> {
        if !self.identity.is_stored_locally().await {
            return Ok(None);
        }
        self.identity.read_record().await
    }
}
