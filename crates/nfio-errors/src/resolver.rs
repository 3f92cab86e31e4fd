//! Delegation handles for the shadowed functions.
//!
//! A [`Resolver`] hands back the *next* definition of a symbol, i.e. the one
//! the host would have called had this library not been loaded first. The
//! production resolver wraps `dlsym(RTLD_NEXT, ..)`; tests inject their own
//! C-ABI functions.

use libc::{c_char, c_int, c_uint, c_void, size_t};
use std::ffi::CStr;
use std::ptr::NonNull;

pub type StrerrorFn = unsafe extern "C" fn(c_int) -> *mut c_char;
/// GNU `strerror_r`: returns a message pointer that may or may not be `buf`.
pub type StrerrorRFn = unsafe extern "C" fn(c_int, *mut c_char, size_t) -> *mut c_char;
/// XSI `strerror_r` (`__xpg_strerror_r`): returns 0 or an errno value.
pub type XpgStrerrorRFn = unsafe extern "C" fn(c_int, *mut c_char, size_t) -> c_int;
pub type ErrorFn = unsafe extern "C" fn(c_int, c_int, *const c_char, ...);
pub type ErrorAtLineFn =
    unsafe extern "C" fn(c_int, c_int, *const c_char, c_uint, *const c_char, ...);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Error,
    ErrorAtLine,
    Strerror,
    StrerrorR,
    XpgStrerrorR,
}

impl Symbol {
    pub const ALL: [Symbol; 5] = [
        Symbol::Error,
        Symbol::ErrorAtLine,
        Symbol::Strerror,
        Symbol::StrerrorR,
        Symbol::XpgStrerrorR,
    ];

    /// C symbol name as passed to the dynamic resolver.
    pub const fn c_name(self) -> &'static CStr {
        match self {
            Symbol::Error => c"error",
            Symbol::ErrorAtLine => c"error_at_line",
            Symbol::Strerror => c"strerror",
            Symbol::StrerrorR => c"strerror_r",
            Symbol::XpgStrerrorR => c"__xpg_strerror_r",
        }
    }

    pub fn name(self) -> &'static str {
        // c_name() literals are ASCII
        self.c_name().to_str().unwrap_or("?")
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Locates the next definition of a shadowed symbol, excluding
/// this library.
///
/// Implementations must be thread-safe; `resolve` may be called from any
/// host thread, concurrently.
pub trait Resolver: Send + Sync {
    /// `None` means the next definition could not be found. Callers must
    /// treat that as fatal and never invoke a null handle.
    fn resolve(&self, symbol: Symbol) -> Option<NonNull<c_void>>;
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn resolve(&self, symbol: Symbol) -> Option<NonNull<c_void>> {
        (**self).resolve(symbol)
    }
}
