//! DOS command channel.

use std::fmt;

/// Disk status reported on the command channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DosStatus {
    pub code: u8,
    pub message: &'static str,
}

impl DosStatus {
    pub fn ok() -> Self {
        Self {
            code: 0,
            message: "OK",
        }
    }

    pub fn file_not_found() -> Self {
        Self {
            code: 62,
            message: "FILE NOT FOUND",
        }
    }
}

impl Default for DosStatus {
    fn default() -> Self {
        Self::ok()
    }
}

impl fmt::Display for DosStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02},{},00,00", self.code, self.message)
    }
}

/// A decoded `DOS` command string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DosCommand {
    /// Empty command: print the disk status
    Status,
    /// Single digit: switch the default device
    ChangeDevice(u8),
    /// Anything else, passed through untouched
    Other(String),
}

impl DosCommand {
    /// Decode the raw bytes of a command string.
    pub fn parse(raw: &[u8]) -> Self {
        match raw {
            [] => DosCommand::Status,
            [d] if d.is_ascii_digit() => DosCommand::ChangeDevice(d - b'0'),
            _ => DosCommand::Other(raw.iter().map(|&b| b as char).collect()),
        }
    }
}
