//! Store configuration.

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Default Keychain service prefix for secure namespaces.
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "io.safekit";

/// Configuration for a [`SecureStorage`](crate::SecureStorage) instance.
///
/// Hosts usually pass this across the FFI boundary as a JSON document:
///
/// ```rust
/// use safekit_core::StoreConfig;
///
/// let config = StoreConfig::from_json(r#"{"enable_logging": false}"#).unwrap();
/// assert!(!config.enable_logging);
/// assert_eq!(config.keychain_service, "io.safekit");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Forward diagnostics to the installed logger. Defaults to `true` in
    /// debug builds and `false` in release builds.
    pub enable_logging: bool,
    /// Service prefix used by Keychain-backed namespaces.
    pub keychain_service: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enable_logging: cfg!(debug_assertions),
            keychain_service: DEFAULT_KEYCHAIN_SERVICE.to_string(),
        }
    }
}

impl StoreConfig {
    /// Parses a configuration document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if the document is not a JSON
    /// object or a field has the wrong type.
    pub fn from_json(config: &str) -> StoreResult<Self> {
        let document: serde_json::Value =
            serde_json::from_str(config).map_err(|e| StoreError::InvalidConfig(e.to_string()))?;
        if !document.is_object() {
            return Err(StoreError::InvalidConfig(
                "configuration must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(document).map_err(|e| StoreError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_build_profile() {
        let config = StoreConfig::default();
        assert_eq!(config.enable_logging, cfg!(debug_assertions));
        assert_eq!(config.keychain_service, DEFAULT_KEYCHAIN_SERVICE);
    }

    #[test]
    fn test_from_json_partial() {
        let config = StoreConfig::from_json(r#"{"keychain_service": "com.example.app"}"#)
            .unwrap();
        assert_eq!(config.keychain_service, "com.example.app");
        assert_eq!(config.enable_logging, cfg!(debug_assertions));

        let config = StoreConfig::from_json("{}").unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn test_from_json_invalid() {
        let err = StoreConfig::from_json(r#"{"enable_logging": "yes"}"#).unwrap_err();
        assert!(matches!(err, StoreError::InvalidConfig(_)));

        assert!(StoreConfig::from_json("not json").is_err());

        // sequences would otherwise fill the fields positionally
        for document in ["[]", "[true]", "null", "42"] {
            let err = StoreConfig::from_json(document).unwrap_err();
            assert!(matches!(err, StoreError::InvalidConfig(_)), "{document}");
        }
    }
}
