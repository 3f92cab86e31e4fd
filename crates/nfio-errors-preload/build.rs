//! Build script for nfio-errors-preload
//!
//! Compiles the C variadic bridge for error(3)/error_at_line(3).
//! Only the C compiler can consume a caller's `...` with va_start.

fn main() {
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os == "linux" {
        println!("cargo:rerun-if-changed=src/c/error_bridge.c");

        cc::Build::new()
            .file("src/c/error_bridge.c")
            .opt_level(2)
            .compile("error_bridge");
    }
}
