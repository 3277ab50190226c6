use std::collections::TryReserveError;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DmmpError>;

/// Numeric code of a successful call.
pub const DMMP_OK: i32 = 0;

/// Errors returned by every public operation.
///
/// The discriminants are the stable numeric codes; `Display` gives the
/// fixed message also returned by [`strerror()`]. Detail (errno values,
/// offending lines) goes to the context log before the error is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[repr(i32)]
pub enum DmmpError {
    #[error("Out of memory")]
    NoMemory = 1,
    #[error("BUG of libdmmp library")]
    Bug = 2,
    #[error("Timeout when communicate with multipathd, try to increase 'uxsock_timeout' in config file")]
    IpcTimeout = 3,
    #[error("Error when communicate with multipathd daemon")]
    IpcError = 4,
    #[error("The multipathd daemon not started")]
    NoDaemon = 5,
    #[error("Inconsistent data, try again")]
    InconsistentData = 6,
}

impl DmmpError {
    pub const ALL: [DmmpError; 6] = [
        DmmpError::NoMemory,
        DmmpError::Bug,
        DmmpError::IpcTimeout,
        DmmpError::IpcError,
        DmmpError::NoDaemon,
        DmmpError::InconsistentData,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.code() == code)
    }
}

impl From<TryReserveError> for DmmpError {
    fn from(_: TryReserveError) -> Self {
        DmmpError::NoMemory
    }
}

/// Message for a raw return code, `"Invalid argument"` for unknown codes.
pub fn strerror(code: i32) -> &'static str {
    if code == DMMP_OK {
        return "OK";
    }
    match DmmpError::from_code(code) {
        Some(DmmpError::NoMemory) => "Out of memory",
        Some(DmmpError::Bug) => "BUG of libdmmp library",
        Some(DmmpError::IpcTimeout) => {
            "Timeout when communicate with multipathd, try to increase \
             'uxsock_timeout' in config file"
        }
        Some(DmmpError::IpcError) => "Error when communicate with multipathd daemon",
        Some(DmmpError::NoDaemon) => "The multipathd daemon not started",
        Some(DmmpError::InconsistentData) => "Inconsistent data, try again",
        None => "Invalid argument",
    }
}

/// Collapse a result into the numeric return code.
pub fn rc<T>(r: &Result<T>) -> i32 {
    match r {
        Ok(_) => DMMP_OK,
        Err(e) => e.code(),
    }
}
