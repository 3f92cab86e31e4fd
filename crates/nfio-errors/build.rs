//! Build script for nfio-errors
//!
//! Compiles the variadic `error`/`error_at_line` stand-ins used by the
//! integration tests. They are linked into test targets only.

fn main() {
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os == "linux" {
        println!("cargo:rerun-if-changed=tests/c/fake_libc.c");

        let objects = cc::Build::new()
            .file("tests/c/fake_libc.c")
            .cargo_metadata(false)
            .compile_intermediates();
        for object in objects {
            println!("cargo:rustc-link-arg-tests={}", object.display());
        }
    }
}
