//! Error types for the X16 virtual disk.

use thiserror::Error;

/// KERNAL error code for "file not found".
pub const KERNAL_FILE_NOT_FOUND: u8 = 4;

/// Errors that can occur while servicing a KERNAL trap.
#[derive(Error, Debug)]
pub enum DosError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid range: end ${end:04X} is below start ${start:04X}")]
    InvalidRange { start: u16, end: u16 },

    #[error("Buffer overflow: listing does not fit in {capacity} bytes")]
    BufferOverflow { capacity: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DosError {
    /// Value placed in `a` and `STATUS` when this error is reported to the guest.
    ///
    /// `None` means the guest only sees the carry flag (with `a` zeroed).
    pub fn kernal_code(&self) -> Option<u8> {
        match self {
            DosError::FileNotFound(_) | DosError::Io(_) => Some(KERNAL_FILE_NOT_FOUND),
            DosError::InvalidRange { .. } | DosError::BufferOverflow { .. } => None,
            DosError::InvalidConfig(_) | DosError::Json(_) => None,
        }
    }
}

/// Result type for virtual disk operations.
pub type DosResult<T> = Result<T, DosError>;
