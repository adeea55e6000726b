//! Generates the Swift and Kotlin bindings for `safekit`.

fn main() {
    uniffi::uniffi_bindgen_main();
}
