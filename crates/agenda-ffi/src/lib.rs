//! UniFFI bindings crate for the agenda library
//!
//! This crate wraps the agenda crate for UniFFI library mode binding
//! generation. It re-exports the FFI module and the UniFFI scaffolding.
//!
//! ## Building for Android
//!
//! 1. Build the library for the device ABIs:
//!    ```bash
//!    cargo build --release -p agenda-ffi --target aarch64-linux-android
//!    cargo build --release -p agenda-ffi --target x86_64-linux-android
//!    ```
//!
//! 2. Generate Kotlin bindings:
//!    ```bash
//!    cargo run -p agenda-ffi --features bindgen --bin uniffi-bindgen generate \
//!        --library target/aarch64-linux-android/release/libagenda_ffi.so \
//!        --language kotlin \
//!        --out-dir generated/kotlin
//!    ```
//!
//! Swift bindings are generated the same way from the Apple targets with
//! `--language swift`.

pub use agenda::ffi::*;

// Library mode needs the scaffolding re-exported from this cdylib
agenda::uniffi_reexport_scaffolding!();
