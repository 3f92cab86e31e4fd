//! Exported C ABI: the symbols that shadow glibc's.
//! Safety: All extern "C" functions here are dangerous FFI and must be used correctly.
#![allow(clippy::missing_safety_doc)]

use libc::{c_char, c_int, c_uint, size_t};
use std::ffi::CStr;

use crate::sink::StderrSink;
use crate::state::with_entry;

// ============================================================================
// strerror family
// ============================================================================

#[no_mangle]
pub unsafe extern "C" fn strerror(errnum: c_int) -> *mut c_char {
    with_entry(|i| i.strerror(errnum))
}

/// GNU `strerror_r` (what `<string.h>` declares under `_GNU_SOURCE`).
#[no_mangle]
pub unsafe extern "C" fn strerror_r(
    errnum: c_int,
    buf: *mut c_char,
    buflen: size_t,
) -> *mut c_char {
    with_entry(|i| i.strerror_r_gnu(errnum, buf, buflen))
}

/// XSI `strerror_r`; POSIX-mode C code and Rust's std link here.
#[no_mangle]
pub unsafe extern "C" fn __xpg_strerror_r(
    errnum: c_int,
    buf: *mut c_char,
    buflen: size_t,
) -> c_int {
    with_entry(|i| i.strerror_r_xsi(errnum, buf, buflen))
}

// ============================================================================
// error family: C bridge callbacks
// ============================================================================

/// Called by `nfio_error_bridge` with the already-rendered message.
#[no_mangle]
pub unsafe extern "C" fn nfio_report_error(status: c_int, errnum: c_int, rendered: *const c_char) {
    let rendered = if rendered.is_null() {
        c""
    } else {
        CStr::from_ptr(rendered)
    };
    with_entry(|i| i.error(&StderrSink, status, errnum, rendered))
}

/// Called by `nfio_error_at_line_bridge` with the already-rendered message.
#[no_mangle]
pub unsafe extern "C" fn nfio_report_error_at_line(
    status: c_int,
    errnum: c_int,
    file: *const c_char,
    line: c_uint,
    rendered: *const c_char,
) {
    let rendered = if rendered.is_null() {
        c""
    } else {
        CStr::from_ptr(rendered)
    };
    let file = (!file.is_null()).then(|| CStr::from_ptr(file));
    with_entry(|i| {
        let sink = &StderrSink;
        i.error_at_line(sink, status, errnum, file, line, rendered)
    })
}

// ============================================================================
// error family: variadic trampolines
// ============================================================================
//
// Stable Rust cannot define a C-variadic function, so `error` and
// `error_at_line` are naked tail jumps into the C bridge. Nothing touches the
// argument registers, the stack or (on x86_64) %al, so the bridge's va_start
// sees the caller's frame exactly.

extern "C" {
    fn nfio_error_bridge(status: c_int, errnum: c_int, format: *const c_char, ...);
    fn nfio_error_at_line_bridge(
        status: c_int,
        errnum: c_int,
        file: *const c_char,
        line: c_uint,
        format: *const c_char,
        ...
    );
}

#[cfg(target_arch = "x86_64")]
#[unsafe(naked)]
#[no_mangle]
pub unsafe extern "C" fn error() {
    core::arch::naked_asm!("jmp {}", sym nfio_error_bridge);
}

#[cfg(target_arch = "x86_64")]
#[unsafe(naked)]
#[no_mangle]
pub unsafe extern "C" fn error_at_line() {
    core::arch::naked_asm!("jmp {}", sym nfio_error_at_line_bridge);
}

#[cfg(target_arch = "aarch64")]
#[unsafe(naked)]
#[no_mangle]
pub unsafe extern "C" fn error() {
    core::arch::naked_asm!("b {}", sym nfio_error_bridge);
}

#[cfg(target_arch = "aarch64")]
#[unsafe(naked)]
#[no_mangle]
pub unsafe extern "C" fn error_at_line() {
    core::arch::naked_asm!("b {}", sym nfio_error_at_line_bridge);
}
