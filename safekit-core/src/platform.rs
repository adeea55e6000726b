//! Platform detection and the system device identifier source.

use async_trait::async_trait;
use strum::{Display, EnumString};

use crate::error::PlatformError;

/// Operating systems the store knows how to obtain a device identity on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    /// Android, which exposes a stable `ANDROID_ID`.
    Android,
    /// iOS, where identity lives in the Keychain.
    Ios,
    /// macOS.
    MacOs,
    /// Linux desktops and servers.
    Linux,
    /// Windows.
    Windows,
    /// Anything else.
    Other,
}

/// How a platform obtains its stable device identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum IdentityStrategy {
    /// The OS provides an immutable identifier. A generated identifier is
    /// only used when the OS answer is empty or the call fails.
    SystemId,
    /// The identifier is generated once and persisted in the credentials
    /// namespace, which is then its only backing store.
    GeneratedPersisted,
}

impl IdentityStrategy {
    /// Whether the identity record in the credentials namespace is always
    /// the sole copy of the device identity.
    #[must_use]
    pub const fn always_stored_locally(self) -> bool {
        matches!(self, Self::GeneratedPersisted)
    }
}

impl Platform {
    /// Detects the platform this binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "android") {
            Self::Android
        } else if cfg!(target_os = "ios") {
            Self::Ios
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Other
        }
    }

    /// The identity strategy used on this platform.
    #[must_use]
    pub const fn identity_strategy(self) -> IdentityStrategy {
        match self {
            Self::Android => IdentityStrategy::SystemId,
            Self::Ios | Self::MacOs | Self::Linux | Self::Windows | Self::Other => {
                IdentityStrategy::GeneratedPersisted
            }
        }
    }
}

/// Source of the OS-provided device identifier (e.g. `ANDROID_ID`).
///
/// The answer is best effort: an empty string means "not available".
/// Errors are never surfaced to store callers; the identity provider treats
/// them as an empty answer.
#[cfg_attr(feature = "ffi", uniffi::export(with_foreign))]
#[async_trait]
pub trait PlatformIdentifier: Send + Sync {
    /// Returns the system identifier, possibly empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform API raised one.
    async fn system_identifier(&self) -> Result<String, PlatformError>;
}

/// Identifier source for platforms without a stable system identifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSystemIdentifier;

#[async_trait]
impl PlatformIdentifier for NoSystemIdentifier {
    async fn system_identifier(&self) -> Result<String, PlatformError> {
        Err(PlatformError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(Platform::Android, IdentityStrategy::SystemId)]
    #[test_case(Platform::Ios, IdentityStrategy::GeneratedPersisted)]
    #[test_case(Platform::MacOs, IdentityStrategy::GeneratedPersisted)]
    #[test_case(Platform::Linux, IdentityStrategy::GeneratedPersisted)]
    #[test_case(Platform::Other, IdentityStrategy::GeneratedPersisted)]
    fn test_identity_strategy(platform: Platform, expected: IdentityStrategy) {
        assert_eq!(platform.identity_strategy(), expected);
    }

    #[test]
    fn test_local_storage_capability() {
        assert!(IdentityStrategy::GeneratedPersisted.always_stored_locally());
        assert!(!IdentityStrategy::SystemId.always_stored_locally());
    }

    #[test]
    fn test_current_platform() {
        #[cfg(target_os = "linux")]
        assert_eq!(Platform::current(), Platform::Linux);
        #[cfg(target_os = "macos")]
        assert_eq!(Platform::current(), Platform::MacOs);
        assert_eq!(Platform::MacOs.to_string(), "macos");
    }

    #[tokio::test]
    async fn test_no_system_identifier() {
        let err = NoSystemIdentifier.system_identifier().await.unwrap_err();
        assert!(matches!(err, PlatformError::Unsupported));
    }
}
