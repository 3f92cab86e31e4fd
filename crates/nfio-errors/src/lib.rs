//! # nfio-errors
//!
//! Reserved error codes for nf.io and the policy used to interpose them on
//! the C library's `error`, `error_at_line`, `strerror` and `strerror_r`.
//!
//! Codes above the threshold (700 by default) are VNF lifecycle failures and
//! are answered from a private [`ErrorTable`]. Every other code is delegated
//! to the next definition of the same symbol, obtained through an injected
//! [`Resolver`], so the host sees exactly the original behavior.
//!
//! This crate holds no global state and exports no C symbols; the
//! preloadable library lives in `nfio-errors-preload`.
//!
//! ```
//! use nfio_errors::{Interposer, NfioError, Resolver, Symbol};
//! use std::ffi::{c_void, CStr};
//! use std::ptr::NonNull;
//!
//! struct Nothing;
//! impl Resolver for Nothing {
//!     fn resolve(&self, _: Symbol) -> Option<NonNull<c_void>> { None }
//! }
//!
//! let interposer = Interposer::builtin(Nothing);
//! let msg = unsafe { interposer.strerror(NfioError::VnfStart.code()).unwrap() };
//! let msg = unsafe { CStr::from_ptr(msg) };
//! assert_eq!(msg.to_str().unwrap(), "Failed to start VNF");
//! ```

/// `component` field attached to every event this workspace emits.
pub const LOG_COMPONENT: &str = "NFIO";

pub mod codes;
pub mod interposer;
pub mod policy;
pub mod render;
pub mod resolver;
pub mod table;

pub use codes::{NfioError, RESERVED_BASE};
pub use interposer::{InterposeError, Interposer, LineFilter, ReportSink, REPORT_CAPACITY};
pub use policy::{Classification, RangeMode, RangePolicy};
pub use render::{copy_truncated, StackWriter, RENDER_CAPACITY};
pub use resolver::{
    ErrorAtLineFn, ErrorFn, Resolver, StrerrorFn, StrerrorRFn, Symbol, XpgStrerrorRFn,
};
pub use table::{ErrorTable, TableError, BUILTIN_MESSAGES};
