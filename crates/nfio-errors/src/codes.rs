//! Typed nf.io domain error codes.
//!
//! The hypervisor drivers raise these with errno values above the reserved
//! threshold so that `strerror`/`error` can render them through the table.

use crate::table::BUILTIN_MESSAGES;

/// Base of the reserved range; `code - RESERVED_BASE` indexes the table.
pub const RESERVED_BASE: i32 = 700;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[repr(i32)]
pub enum NfioError {
    #[error("Cannot connect to hypervisor")]
    HypervisorConnection = 701,
    #[error("VNF does not exist")]
    VnfNotFound = 702,
    #[error("Failed to execute command in VNF")]
    VnfCommandExecution = 703,
    #[error("Failed to create VNF")]
    VnfCreate = 704,
    #[error("Failed to deploy VNF")]
    VnfDeploy = 705,
    #[error("Failed to destroy VNF")]
    VnfDestroy = 706,
    #[error("Failed to start VNF")]
    VnfStart = 707,
    #[error("Failed to restart VNF")]
    VnfRestart = 708,
    #[error("Failed to stop VNF")]
    VnfStop = 709,
    #[error("Failed to pause VNF")]
    VnfPause = 710,
    #[error("Failed to resume VNF")]
    VnfUnpause = 711,
    #[error("Operation failed abruptly, may cause inconsistent state")]
    InconsistentState = 712,
    #[error("VNF image name is missing")]
    MissingImageName = 713,
    #[error("VNF hostname is missing")]
    MissingHostname = 714,
    #[error("VNF instance name is missing")]
    MissingInstanceName = 715,
    #[error("Operation failed. VNF is not running")]
    VnfNotRunning = 716,
}

impl NfioError {
    pub const ALL: [NfioError; 16] = [
        NfioError::HypervisorConnection,
        NfioError::VnfNotFound,
        NfioError::VnfCommandExecution,
        NfioError::VnfCreate,
        NfioError::VnfDeploy,
        NfioError::VnfDestroy,
        NfioError::VnfStart,
        NfioError::VnfRestart,
        NfioError::VnfStop,
        NfioError::VnfPause,
        NfioError::VnfUnpause,
        NfioError::InconsistentState,
        NfioError::MissingImageName,
        NfioError::MissingHostname,
        NfioError::MissingInstanceName,
        NfioError::VnfNotRunning,
    ];

    /// The errno value carried by this error.
    pub const fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.code() == code)
    }

    /// Index of this error in the builtin message table.
    pub const fn table_index(self) -> usize {
        (self.code() - RESERVED_BASE) as usize
    }

    /// Message bytes from the builtin table, NUL excluded.
    pub fn builtin_message(self) -> &'static [u8] {
        BUILTIN_MESSAGES[self.table_index()].to_bytes()
    }
}

impl From<NfioError> for i32 {
    fn from(err: NfioError) -> Self {
        err.code()
    }
}
