#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
//! Secure local key-value storage with typed values and a stable device
//! identity.
//!
//! Entries live in one of two namespaces: `common` (plaintext, OS default
//! storage) and `credentials` (OS secure storage). Persistence is delegated to
//! platform backends; this crate owns the typed encoding, namespace routing,
//! the device identity algorithm and clears that never lose the identity.
//!
//! ```rust
//! # async fn example() -> safekit_core::StoreResult<()> {
//! use safekit_core::{backend::MemoryPlatform, Namespace, Platform, SecureStorage, StoreConfig};
//!
//! let storage = SecureStorage::new(&MemoryPlatform::new(Platform::Ios), StoreConfig::default());
//! let store = storage.store();
//!
//! store.save_string(Namespace::Common, "k", "hello").await?;
//! store.save_int(Namespace::Common, "k", 42).await?;
//! assert_eq!(store.read_string(Namespace::Common, "k").await, None);
//! assert_eq!(store.read_int(Namespace::Common, "k").await, Some(42));
//!
//! let id = storage.get_device_id().await;
//! storage.clear_all().await?;
//! assert_eq!(storage.get_device_id().await, id);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub use backend::{KeyValueBackend, StorageProvider};

mod clear;
pub use clear::ProtectedClear;

mod config;
pub use config::{StoreConfig, DEFAULT_KEYCHAIN_SERVICE};

mod error;
pub use error::*;

mod identity;
pub use identity::{DeviceIdentity, DEVICE_ID_KEY};

pub mod logger;

mod namespace;
pub use namespace::Namespace;

mod platform;
pub use platform::*;

mod secure_storage;
pub use secure_storage::SecureStorage;

mod store;
pub use store::KeyValueStore;

pub mod value;
pub use value::{StoredValue, TypedValue, ValueKind};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!("safekit_core");
