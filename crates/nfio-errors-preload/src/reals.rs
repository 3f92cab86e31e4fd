//! Real Symbol Storage
//!
//! Next definitions of the shadowed functions, resolved with
//! `dlsym(RTLD_NEXT)` and cached so each name is looked up once.

use libc::c_void;
use nfio_errors::{Resolver, Symbol};
use std::ffi::CStr;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicPtr, Ordering};

/// Cached next definition of one symbol
pub struct RealSymbol {
    ptr: AtomicPtr<c_void>,
    name: &'static CStr,
}

impl RealSymbol {
    pub const fn new(name: &'static CStr) -> Self {
        Self {
            ptr: AtomicPtr::new(std::ptr::null_mut()),
            name,
        }
    }

    pub const fn of(symbol: Symbol) -> Self {
        Self::new(symbol.c_name())
    }

    /// Racing first calls may both hit dlsym; they store the same address.
    /// A failed lookup is not cached, so a later call retries.
    pub fn get(&self) -> Option<NonNull<c_void>> {
        let p = self.ptr.load(Ordering::Acquire);
        if !p.is_null() {
            return NonNull::new(p);
        }
        let f = unsafe { libc::dlsym(libc::RTLD_NEXT, self.name.as_ptr()) };
        if !f.is_null() {
            self.ptr.store(f, Ordering::Release);
        }
        NonNull::new(f)
    }
}

pub static REAL_ERROR: RealSymbol = RealSymbol::of(Symbol::Error);
pub static REAL_ERROR_AT_LINE: RealSymbol = RealSymbol::of(Symbol::ErrorAtLine);
pub static REAL_STRERROR: RealSymbol = RealSymbol::of(Symbol::Strerror);
pub static REAL_STRERROR_R: RealSymbol = RealSymbol::of(Symbol::StrerrorR);
pub static REAL_XPG_STRERROR_R: RealSymbol = RealSymbol::of(Symbol::XpgStrerrorR);

/// Production resolver over the global [`RealSymbol`] cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct DlsymResolver;

impl DlsymResolver {
    fn storage(symbol: Symbol) -> &'static RealSymbol {
        match symbol {
            Symbol::Error => &REAL_ERROR,
            Symbol::ErrorAtLine => &REAL_ERROR_AT_LINE,
            Symbol::Strerror => &REAL_STRERROR,
            Symbol::StrerrorR => &REAL_STRERROR_R,
            Symbol::XpgStrerrorR => &REAL_XPG_STRERROR_R,
        }
    }

    /// Resolve every symbol up front; returns those that are missing.
    pub fn warm(&self) -> impl Iterator<Item = Symbol> + '_ {
        Symbol::ALL
            .into_iter()
            .filter(move |&s| self.resolve(s).is_none())
    }
}

impl Resolver for DlsymResolver {
    fn resolve(&self, symbol: Symbol) -> Option<NonNull<c_void>> {
        Self::storage(symbol).get()
    }
}
