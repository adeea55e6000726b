use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// An isolated key space.
///
/// The namespace is always chosen explicitly by the caller; the same key
/// string in two namespaces names two unrelated entries.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Namespace {
    /// Plaintext tier backed by the OS default preferences storage. Removed
    /// together with the application.
    Common,
    /// Secure tier backed by the OS credential store (Keychain, Android
    /// Keystore). May outlive an uninstall depending on the platform.
    Credentials,
}

impl Namespace {
    /// Whether entries in this namespace live in OS secure storage.
    #[must_use]
    pub const fn is_secure(self) -> bool {
        matches!(self, Self::Credentials)
    }
}
