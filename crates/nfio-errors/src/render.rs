//! Zero-allocation rendering into fixed buffers.

use libc::c_char;
use std::ffi::CStr;

/// Capacity of the C bridge's render buffer for `error`/`error_at_line`.
pub const RENDER_CAPACITY: usize = 1024;

/// `fmt::Write` over a fixed byte buffer. Output beyond the buffer is dropped.
pub struct StackWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
    truncated: bool,
}

impl<'a> StackWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            truncated: false,
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let remaining = self.buf.len() - self.pos;
        let to_copy = std::cmp::min(bytes.len(), remaining);
        self.buf[self.pos..self.pos + to_copy].copy_from_slice(&bytes[..to_copy]);
        self.pos += to_copy;
        if to_copy < bytes.len() {
            self.truncated = true;
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    /// Valid UTF-8 prefix of the written bytes.
    pub fn as_str(&self) -> &str {
        match std::str::from_utf8(self.as_bytes()) {
            Ok(s) => s,
            Err(e) => std::str::from_utf8(&self.buf[..e.valid_up_to()]).unwrap_or(""),
        }
    }

    pub fn len(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

impl std::fmt::Write for StackWriter<'_> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}

/// Copy `msg` into `buf[..capacity]`, always NUL-terminating when
/// `capacity > 0`. Returns `true` if the message did not fit.
///
/// # Safety
///
/// `buf` must be valid for writes of `capacity` bytes.
pub unsafe fn copy_truncated(msg: &CStr, buf: *mut c_char, capacity: usize) -> bool {
    if buf.is_null() || capacity == 0 {
        return true;
    }
    let bytes = msg.to_bytes();
    let len = bytes.len().min(capacity - 1);
    std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf.cast::<u8>(), len);
    *buf.add(len) = 0;
    len < bytes.len()
}
