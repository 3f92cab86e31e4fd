//! glibc-compatible report sink for absorbed `error` calls.
//!
//! Mirrors what glibc's own `error` does around the message: flush stdio,
//! print the program name (or call `error_print_progname`), write to
//! stderr, bump `error_message_count`. `error_at_line` repeats are dropped
//! while the host sets `error_one_per_line`.

use libc::{c_char, c_int, c_uint, c_void};
use nfio_errors::{LineFilter, ReportSink};
use std::ffi::CStr;
use std::ptr::{addr_of, addr_of_mut};

extern "C" {
    static program_invocation_name: *mut c_char;
    static mut error_print_progname: Option<unsafe extern "C" fn()>;
    static mut error_message_count: c_uint;
    static mut error_one_per_line: c_int;
}

/// Last location reported through `error_at_line`, shared by all threads.
static LAST_LOCATION: LineFilter = LineFilter::new();

pub(crate) struct StderrSink;

impl StderrSink {
    fn progname_hook() -> Option<unsafe extern "C" fn()> {
        unsafe { error_print_progname }
    }
}

impl ReportSink for StderrSink {
    fn program_name(&self) -> Option<&[u8]> {
        if Self::progname_hook().is_some() {
            return None;
        }
        let name = unsafe { program_invocation_name };
        if name.is_null() {
            return Some(&b""[..]);
        }
        Some(unsafe { CStr::from_ptr(name) }.to_bytes())
    }

    fn emit(&self, line: &[u8]) {
        unsafe {
            libc::fflush(std::ptr::null_mut());
            if let Some(hook) = Self::progname_hook() {
                hook();
            }
            write_all(libc::STDERR_FILENO, line);
            let count = addr_of_mut!(error_message_count);
            *count = (*count).wrapping_add(1);
        }
    }

    fn skip_location(&self, file: Option<&CStr>, line: c_uint) -> bool {
        let one_per_line = unsafe { addr_of!(error_one_per_line).read() };
        one_per_line != 0 && LAST_LOCATION.repeats(file, line)
    }

    /// Echoed calls go to stdout, after anything already buffered there.
    fn echo(&self, line: &[u8]) {
        unsafe {
            libc::fflush(std::ptr::null_mut());
        }
        write_all(libc::STDOUT_FILENO, line);
    }
}

/// Raw `write(2)` loop; retries on EINTR and short writes, gives up on
/// any other error.
pub(crate) fn write_all(fd: libc::c_int, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        let n = unsafe { libc::write(fd, bytes.as_ptr() as *const c_void, bytes.len()) };
        if n < 0 {
            if std::io::Error::last_os_error().raw_os_error() == Some(libc::EINTR) {
                continue;
            }
            return;
        }
        if n == 0 {
            return;
        }
        bytes = &bytes[n as usize..];
    }
}
