//! UniFFI bindgen binary for generating Swift/Kotlin bindings
//!
//! Usage:
//!   cargo run -p agenda-ffi --features bindgen --bin uniffi-bindgen generate \
//!       --library target/aarch64-linux-android/release/libagenda_ffi.so \
//!       --language kotlin \
//!       --out-dir generated/kotlin

fn main() {
    uniffi::uniffi_bindgen_main()
}
