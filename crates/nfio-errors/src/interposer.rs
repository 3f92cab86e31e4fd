//! Entry-point semantics for the shadowed error-reporting functions.
//!
//! Each operation classifies the code first. Reserved codes are answered
//! from the [`ErrorTable`]; everything else is delegated to the next
//! definition supplied by the [`Resolver`], with the original arguments and
//! the original return value passed through untouched.

use libc::{c_char, c_int, c_uint, c_void, size_t};
use std::ffi::{CStr, CString};
use std::fmt::Write;
use std::ptr::NonNull;
use std::sync::{Mutex, PoisonError};

use crate::codes::RESERVED_BASE;
use crate::policy::{Classification, RangeMode, RangePolicy};
use crate::render::{copy_truncated, StackWriter, RENDER_CAPACITY};
use crate::resolver::{
    ErrorAtLineFn, ErrorFn, Resolver, StrerrorFn, StrerrorRFn, Symbol, XpgStrerrorRFn,
};
use crate::table::ErrorTable;
use crate::LOG_COMPONENT;

/// Rendered message plus room for the program name, location and custom text.
pub const REPORT_CAPACITY: usize = RENDER_CAPACITY + 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InterposeError {
    #[error("cannot resolve next definition of {symbol}")]
    Unresolved { symbol: Symbol },
}

/// Where absorbed `error`/`error_at_line` reports go.
pub trait ReportSink {
    /// Program name printed before each report, as glibc's `error` does.
    ///
    /// `None` means the sink prints its own prefix inside [`emit`](Self::emit)
    /// (glibc's `error_print_progname` hook), so no name is formatted.
    fn program_name(&self) -> Option<&[u8]>;

    /// Write one complete, newline-terminated report line.
    fn emit(&self, line: &[u8]);

    /// Write one echoed call line (`echo_calls`); defaults to [`emit`](Self::emit).
    fn echo(&self, line: &[u8]) {
        self.emit(line);
    }

    /// Whether an `error_at_line` report for `file:line` is dropped, as
    /// glibc does under `error_one_per_line` for back-to-back repeats.
    fn skip_location(&self, _file: Option<&CStr>, _line: c_uint) -> bool {
        false
    }
}

/// The last location reported by `error_at_line`.
///
/// Backs [`ReportSink::skip_location`] for sinks that honor
/// `error_one_per_line`.
#[derive(Debug, Default)]
pub struct LineFilter {
    last: Mutex<Option<(Option<CString>, c_uint)>>,
}

impl LineFilter {
    pub const fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }

    /// Record `file:line`; returns `true` when it equals the previous one.
    pub fn repeats(&self, file: Option<&CStr>, line: c_uint) -> bool {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((last_file, last_line)) = last.as_ref() {
            if *last_line == line && last_file.as_deref() == file {
                return true;
            }
        }
        *last = Some((file.map(CStr::to_owned), line));
        false
    }
}

pub struct Interposer<R> {
    table: ErrorTable,
    policy: RangePolicy,
    echo_calls: bool,
    resolver: R,
}

impl<R: Resolver> Interposer<R> {
    /// Builtin table, default policy, no echo. Usable in `static` items.
    pub const fn builtin(resolver: R) -> Self {
        Self {
            table: ErrorTable::builtin(),
            policy: RangePolicy::new(RESERVED_BASE, RangeMode::Signed),
            echo_calls: false,
            resolver,
        }
    }

    pub fn new(table: ErrorTable, policy: RangePolicy, resolver: R) -> Self {
        Self {
            table,
            policy,
            echo_calls: false,
            resolver,
        }
    }

    /// Echo every `error`/`error_at_line` call to the sink before handling it.
    pub fn with_echo_calls(mut self, echo_calls: bool) -> Self {
        self.echo_calls = echo_calls;
        self
    }

    pub fn table(&self) -> &ErrorTable {
        &self.table
    }

    pub fn policy(&self) -> RangePolicy {
        self.policy
    }

    pub fn echo_calls(&self) -> bool {
        self.echo_calls
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// The custom message for `code`, or `None` if it must be delegated.
    ///
    /// Reserved codes past the end of the table get the index 0 fallback.
    pub fn reserved_message(&self, code: c_int) -> Option<&CStr> {
        match self.policy.classify(code) {
            Classification::PassThrough => None,
            Classification::Reserved { index } => {
                let (msg, in_bounds) = self.table.lookup(index);
                if !in_bounds {
                    tracing::warn!(
                        component = LOG_COMPONENT,
                        code,
                        index,
                        table_len = self.table.len(),
                        "reserved code outside message table"
                    );
                }
                Some(msg)
            }
        }
    }

    /// The next definition of `symbol` as a typed function pointer.
    ///
    /// # Safety
    ///
    /// `F` must be the function pointer type matching `symbol`.
    unsafe fn next<F: Copy>(&self, symbol: Symbol) -> Result<F, InterposeError> {
        debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<usize>());
        let ptr: NonNull<c_void> = self
            .resolver
            .resolve(symbol)
            .ok_or(InterposeError::Unresolved { symbol })?;
        Ok(std::mem::transmute_copy::<*mut c_void, F>(&ptr.as_ptr()))
    }

    /// `char *strerror(int)`.
    ///
    /// # Safety
    ///
    /// The resolver must return a function with the `strerror` signature.
    pub unsafe fn strerror(&self, code: c_int) -> Result<*mut c_char, InterposeError> {
        if let Some(msg) = self.reserved_message(code) {
            return Ok(msg.as_ptr() as *mut c_char);
        }
        let real: StrerrorFn = self.next(Symbol::Strerror)?;
        Ok(real(code))
    }

    /// GNU `char *strerror_r(int, char *, size_t)`.
    ///
    /// Reserved codes are copied (truncated, NUL-terminated) into `buf` and
    /// `buf` is returned. Without a usable buffer the table entry itself is
    /// returned, as glibc does for its own static messages.
    ///
    /// # Safety
    ///
    /// `buf` must be valid for `len` bytes; the resolver must return a
    /// function with the GNU `strerror_r` signature.
    pub unsafe fn strerror_r_gnu(
        &self,
        code: c_int,
        buf: *mut c_char,
        len: size_t,
    ) -> Result<*mut c_char, InterposeError> {
        if let Some(msg) = self.reserved_message(code) {
            if buf.is_null() || len == 0 {
                return Ok(msg.as_ptr() as *mut c_char);
            }
            copy_truncated(msg, buf, len);
            return Ok(buf);
        }
        let real: StrerrorRFn = self.next(Symbol::StrerrorR)?;
        Ok(real(code, buf, len))
    }

    /// XSI `int strerror_r(int, char *, size_t)`, exported by glibc as
    /// `__xpg_strerror_r`.
    ///
    /// Reserved codes return `ERANGE` when `len` is 0 or the message was
    /// truncated, `EINVAL` for a null buffer, 0 otherwise.
    ///
    /// # Safety
    ///
    /// `buf` must be valid for `len` bytes; the resolver must return a
    /// function with the XSI `strerror_r` signature.
    pub unsafe fn strerror_r_xsi(
        &self,
        code: c_int,
        buf: *mut c_char,
        len: size_t,
    ) -> Result<c_int, InterposeError> {
        if let Some(msg) = self.reserved_message(code) {
            if len == 0 {
                return Ok(libc::ERANGE);
            }
            if buf.is_null() {
                return Ok(libc::EINVAL);
            }
            return Ok(if copy_truncated(msg, buf, len) {
                libc::ERANGE
            } else {
                0
            });
        }
        let real: XpgStrerrorRFn = self.next(Symbol::XpgStrerrorR)?;
        Ok(real(code, buf, len))
    }

    /// `void error(int status, int errnum, const char *fmt, ...)` after the
    /// variadic arguments have been rendered into `rendered`.
    ///
    /// Reserved codes are reported to `sink` and never terminate the process,
    /// whatever `status` says. Other codes go to the real `error`, which keeps
    /// its own exit-on-nonzero-status contract.
    ///
    /// # Safety
    ///
    /// The resolver must return a function with the `error` signature.
    pub unsafe fn error<S: ReportSink + ?Sized>(
        &self,
        sink: &S,
        status: c_int,
        errnum: c_int,
        rendered: &CStr,
    ) -> Result<(), InterposeError> {
        if self.echo_calls {
            echo(sink, status, errnum, rendered);
        }
        if let Some(msg) = self.reserved_message(errnum) {
            tracing::debug!(
                component = LOG_COMPONENT,
                status,
                errnum,
                "absorbed reserved error"
            );
            report(sink, None, rendered, msg);
            return Ok(());
        }
        let real: ErrorFn = self.next(Symbol::Error)?;
        // "%s" keeps '%' in the rendered text from being read as a directive
        real(status, errnum, c"%s".as_ptr(), rendered.as_ptr());
        Ok(())
    }

    /// `void error_at_line(int status, int errnum, const char *file,
    /// unsigned line, const char *fmt, ...)`, same policy as [`error`](Self::error).
    ///
    /// # Safety
    ///
    /// The resolver must return a function with the `error_at_line` signature.
    pub unsafe fn error_at_line<S: ReportSink + ?Sized>(
        &self,
        sink: &S,
        status: c_int,
        errnum: c_int,
        file: Option<&CStr>,
        line: c_uint,
        rendered: &CStr,
    ) -> Result<(), InterposeError> {
        if self.echo_calls {
            echo(sink, status, errnum, rendered);
        }
        if let Some(msg) = self.reserved_message(errnum) {
            if sink.skip_location(file, line) {
                return Ok(());
            }
            tracing::debug!(
                component = LOG_COMPONENT,
                status,
                errnum,
                line,
                "absorbed reserved error"
            );
            report(sink, file.map(|f| (f, line)), rendered, msg);
            return Ok(());
        }
        let real: ErrorAtLineFn = self.next(Symbol::ErrorAtLine)?;
        real(
            status,
            errnum,
            file.map_or(std::ptr::null(), CStr::as_ptr),
            line,
            c"%s".as_ptr(),
            rendered.as_ptr(),
        );
        Ok(())
    }
}

fn echo<S: ReportSink + ?Sized>(sink: &S, status: c_int, errnum: c_int, rendered: &CStr) {
    let mut buf = [0u8; REPORT_CAPACITY];
    let n = {
        let mut w = StackWriter::new(&mut buf[..REPORT_CAPACITY - 1]);
        let _ = write!(w, "error: {} {} ", status, errnum);
        w.write_bytes(rendered.to_bytes());
        w.len()
    };
    buf[n] = b'\n';
    sink.echo(&buf[..=n]);
}

/// `prog: [rendered: ]message\n`, or `prog:file:line: ...` with a location.
fn report<S: ReportSink + ?Sized>(
    sink: &S,
    location: Option<(&CStr, c_uint)>,
    rendered: &CStr,
    msg: &CStr,
) {
    let mut buf = [0u8; REPORT_CAPACITY];
    let n = {
        // Last byte reserved for the newline
        let mut w = StackWriter::new(&mut buf[..REPORT_CAPACITY - 1]);
        let prog = sink.program_name();
        if let Some(prog) = prog {
            w.write_bytes(prog);
        }
        match location {
            Some((file, line)) => {
                if prog.is_some() {
                    w.write_bytes(b":");
                }
                w.write_bytes(file.to_bytes());
                let _ = write!(w, ":{}: ", line);
            }
            None if prog.is_some() => w.write_bytes(b": "),
            None => {}
        }
        if !rendered.to_bytes().is_empty() {
            w.write_bytes(rendered.to_bytes());
            w.write_bytes(b": ");
        }
        w.write_bytes(msg.to_bytes());
        w.len()
    };
    buf[n] = b'\n';
    sink.emit(&buf[..=n]);
}
