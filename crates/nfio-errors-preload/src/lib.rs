//! # nfio-errors-preload
//!
//! LD_PRELOAD library that teaches a process's `error`, `error_at_line`,
//! `strerror` and `strerror_r` about nf.io's reserved error codes (701 and
//! up by default). Every other code is forwarded to the next definition in
//! the symbol resolution chain, normally glibc's.
//!
//! ```bash
//! LD_PRELOAD=target/release/libnfio_errors.so vnfctl deploy web-01
//! ```
//!
//! Configuration is read once, at load time (see `nfio-config`). Until then,
//! and if it fails, the builtin table and default policy are used.
//!
//! Linux/glibc only: `error(3)` and friends are GNU extensions. The variadic
//! trampolines cover x86_64 and aarch64.

// Allow unsafe FFI functions without safety docs - these are inherently unsafe C ABI
#![allow(clippy::missing_safety_doc)]
// Unit tests build without the exported symbols and the constructor
#![cfg_attr(test, allow(dead_code))]

#[cfg(all(target_os = "linux", target_env = "gnu", not(test)))]
pub mod interpose;
pub mod reals;
#[cfg(all(target_os = "linux", target_env = "gnu"))]
mod sink;
#[cfg(all(target_os = "linux", target_env = "gnu"))]
mod state;

/// Static constructor: configure the interposer when the library is loaded
/// via LD_PRELOAD. Uses the .init_array section.
#[cfg(all(target_os = "linux", target_env = "gnu", not(test)))]
#[link_section = ".init_array"]
#[used]
pub static NFIO_INIT: unsafe extern "C" fn() = {
    unsafe extern "C" fn init() {
        crate::state::init();
    }
    init
};
