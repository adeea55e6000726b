//! Error types for the secure storage engine.

use thiserror::Error;

/// Result type alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced to callers of the storage engine.
///
/// Only write-path and clear-path failures are ever returned. Read-path
/// failures (missing keys, undecodable data, backend read errors) degrade to
/// an absent value instead.
#[derive(Debug, Error)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error))]
#[cfg_attr(feature = "ffi", uniffi(flat_error))]
pub enum StoreError {
    /// The backend refused or failed the operation.
    #[error("backend error: {0}")]
    Backend(String),

    /// A filesystem operation failed.
    #[error("I/O error during {context}: {source}")]
    Io {
        /// Context describing the operation.
        context: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The OS keychain refused the operation.
    #[error("keychain error: {0}")]
    Keychain(String),

    /// The value cannot be represented in the storage encoding.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Keys must be non-empty.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    /// The configuration document could not be parsed.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Unexpected `UniFFI` callback error.
    #[error("unexpected uniffi callback error: {0}")]
    UnexpectedUniFFICallbackError(String),
}

impl StoreError {
    /// Creates a backend error.
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::Backend(message.into())
    }

    /// Creates an I/O error with context.
    pub fn io<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates a serialization error.
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization(message.into())
    }
}

#[cfg(feature = "ffi")]
impl From<uniffi::UnexpectedUniFFICallbackError> for StoreError {
    fn from(error: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError(error.reason)
    }
}

/// Reasons a stored payload could not be turned back into a typed value.
///
/// These never reach callers of the store; they are logged and collapsed into
/// an absent value.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not a valid value document.
    #[error("malformed value: {0}")]
    Malformed(String),

    /// The stored object does not match the requested type.
    #[error("object mismatch: {0}")]
    ObjectMismatch(String),
}

/// Failure reported by a platform identifier source.
///
/// The identity provider treats any of these as "no system identifier".
#[derive(Debug, Error)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error))]
#[cfg_attr(feature = "ffi", uniffi(flat_error))]
pub enum PlatformError {
    /// The platform has no stable system identifier.
    #[error("system identifier unsupported on this platform")]
    Unsupported,

    /// The platform API raised an error.
    #[error("platform api error: {0}")]
    Api(String),

    /// Unexpected `UniFFI` callback error.
    #[error("unexpected uniffi callback error: {0}")]
    UnexpectedUniFFICallbackError(String),
}

#[cfg(feature = "ffi")]
impl From<uniffi::UnexpectedUniFFICallbackError> for PlatformError {
    fn from(error: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError(error.reason)
    }
}
