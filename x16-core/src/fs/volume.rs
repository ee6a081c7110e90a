//! VolumeFS trait - the storage behind the virtual disk.

use std::io::{Read, Write};
use std::path::PathBuf;

use crate::error::DosResult;

/// One directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Raw name bytes as stored on the volume
    pub name: Vec<u8>,
    /// Size in bytes
    pub size: u64,
}

impl DirEntry {
    pub fn new(name: impl Into<Vec<u8>>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Storage backing the virtual disk.
///
/// Filenames are the guest's raw bytes, passed through unchanged
/// (case-sensitive, no character set conversion); wildcard names resolve to
/// the first matching entry in enumeration order.
pub trait VolumeFS {
    /// Disk name shown in the directory header, as raw bytes.
    fn volume_name(&self) -> Vec<u8>;

    /// Entries in enumeration order, excluding `.` and `..`.
    fn entries(&self) -> DosResult<Vec<DirEntry>>;

    /// Path a guest filename refers to. No existence check.
    fn resolve(&self, filename: &[u8]) -> PathBuf;

    /// Open a file for reading. Fails with `FileNotFound` if it cannot be opened.
    fn open_read(&self, filename: &[u8]) -> DosResult<Box<dyn Read + '_>>;

    /// Create or truncate a file for writing. Fails with `FileNotFound` if it
    /// cannot be created.
    fn create(&mut self, filename: &[u8]) -> DosResult<Box<dyn Write + '_>>;
}

impl<V: VolumeFS + ?Sized> VolumeFS for Box<V> {
    fn volume_name(&self) -> Vec<u8> {
        (**self).volume_name()
    }

    fn entries(&self) -> DosResult<Vec<DirEntry>> {
        (**self).entries()
    }

    fn resolve(&self, filename: &[u8]) -> PathBuf {
        (**self).resolve(filename)
    }

    fn open_read(&self, filename: &[u8]) -> DosResult<Box<dyn Read + '_>> {
        (**self).open_read(filename)
    }

    fn create(&mut self, filename: &[u8]) -> DosResult<Box<dyn Write + '_>> {
        (**self).create(filename)
    }
}
