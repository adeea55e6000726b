//! Mobile bindings for `SafeKit`.
//!
//! Re-exports the core crate and adds [`SafeKit`], the object exported to
//! Swift and Kotlin through `UniFFI`.

pub use safekit_core::*;

mod bindings;
pub use bindings::SafeKit;

uniffi::setup_scaffolding!("safekit");
