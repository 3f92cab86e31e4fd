//! Custom message table for reserved error codes.
//!
//! Index 0 is the "Unknown error" fallback. Indices `1..len` map to the
//! VNF lifecycle failures reported by nf.io. The table is immutable once
//! built; pointers handed out from it stay valid for as long as the table
//! lives (process lifetime for the preloaded instance).

use std::ffi::{CStr, CString};

/// Build-time message table.
pub const BUILTIN_MESSAGES: &[&CStr] = &[
    c"Unknown error",
    c"Cannot connect to hypervisor",
    c"VNF does not exist",
    c"Failed to execute command in VNF",
    c"Failed to create VNF",
    c"Failed to deploy VNF",
    c"Failed to destroy VNF",
    c"Failed to start VNF",
    c"Failed to restart VNF",
    c"Failed to stop VNF",
    c"Failed to pause VNF",
    c"Failed to resume VNF",
    c"Operation failed abruptly, may cause inconsistent state",
    c"VNF image name is missing",
    c"VNF hostname is missing",
    c"VNF instance name is missing",
    c"Operation failed. VNF is not running",
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TableError {
    #[error("message table is empty; index 0 must hold the unknown-error fallback")]
    Empty,
    #[error("message {index} contains an interior NUL byte")]
    InteriorNul { index: usize },
}

#[derive(Debug, Clone)]
enum Messages {
    Static(&'static [&'static CStr]),
    Owned(Box<[CString]>),
}

/// Immutable, ordered table of reserved-code messages.
#[derive(Debug, Clone)]
pub struct ErrorTable {
    messages: Messages,
}

impl ErrorTable {
    /// The table compiled into the library.
    pub const fn builtin() -> Self {
        Self {
            messages: Messages::Static(BUILTIN_MESSAGES),
        }
    }

    /// Build an owned table, e.g. from a configuration override.
    pub fn from_messages<I, S>(messages: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Vec<u8>>,
    {
        let mut owned = Vec::new();
        for (index, msg) in messages.into_iter().enumerate() {
            match CString::new(msg) {
                Ok(msg) => owned.push(msg),
                Err(_) => return Err(TableError::InteriorNul { index }),
            }
        }
        if owned.is_empty() {
            return Err(TableError::Empty);
        }
        Ok(Self {
            messages: Messages::Owned(owned.into_boxed_slice()),
        })
    }

    pub fn len(&self) -> usize {
        match &self.messages {
            Messages::Static(m) => m.len(),
            Messages::Owned(m) => m.len(),
        }
    }

    /// Never true for a constructed table; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Option<&CStr> {
        match &self.messages {
            Messages::Static(m) => m.get(index).copied(),
            Messages::Owned(m) => m.get(index).map(CString::as_c_str),
        }
    }

    /// The fallback message at index 0.
    pub fn unknown(&self) -> &CStr {
        self.get(0).unwrap_or(c"Unknown error")
    }

    /// Look up `index`, falling back to index 0 when out of bounds.
    ///
    /// The boolean is `false` when the fallback was used.
    pub fn lookup(&self, index: usize) -> (&CStr, bool) {
        match self.get(index) {
            Some(msg) => (msg, true),
            None => (self.unknown(), false),
        }
    }

    /// Like [`lookup`](Self::lookup) without the bounds flag.
    pub fn message(&self, index: usize) -> &CStr {
        self.lookup(index).0
    }

    pub fn iter(&self) -> impl Iterator<Item = &CStr> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }
}

impl Default for ErrorTable {
    fn default() -> Self {
        Self::builtin()
    }
}
