//! UniFFI bindgen CLI tool for generating language bindings.
//!
//! This binary generates the Swift and Kotlin bindings the mobile shells
//! build against from the recipe-app-core library.
//!
//! ## Usage
//!
//! Generate Swift bindings:
//! ```bash
//! cargo run --features cli --bin uniffi-bindgen generate --library target/release/librecipe_app_core.so --language swift --out-dir ./bindings
//! ```
//!
//! Generate Kotlin bindings:
//! ```bash
//! cargo run --features cli --bin uniffi-bindgen generate --library target/release/librecipe_app_core.so --language kotlin --out-dir ./bindings
//! ```

fn main() {
    uniffi::uniffi_bindgen_main()
}
