//! Host directory volume.

use std::ffi::{OsStr, OsString};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use super::pattern::{has_wildcards, resolve_name};
use super::volume::{DirEntry, VolumeFS};
use crate::error::{DosError, DosResult};

/// Host name for raw guest bytes, byte-for-byte.
#[cfg(unix)]
fn host_name(bytes: &[u8]) -> OsString {
    use std::os::unix::ffi::OsStrExt;
    OsStr::from_bytes(bytes).to_os_string()
}

#[cfg(not(unix))]
fn host_name(bytes: &[u8]) -> OsString {
    OsString::from(String::from_utf8_lossy(bytes).into_owned())
}

/// Raw bytes of a host name.
#[cfg(unix)]
fn guest_name(name: &OsStr) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    name.as_bytes().to_vec()
}

#[cfg(not(unix))]
fn guest_name(name: &OsStr) -> Vec<u8> {
    name.to_string_lossy().into_owned().into_bytes()
}

/// Virtual disk backed by a directory on the host ("SD card directory").
#[derive(Debug, Clone)]
pub struct HostDirFS {
    dir: PathBuf,
}

impl HostDirFS {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<name>` as plain concatenation, so a leading `/` in the guest
    /// name stays inside the directory.
    fn join(&self, name: &[u8]) -> PathBuf {
        let mut full = OsString::from(self.dir.as_os_str());
        full.push("/");
        full.push(host_name(name));
        PathBuf::from(full)
    }

    fn entry_names(&self) -> Vec<Vec<u8>> {
        match fs::read_dir(&self.dir) {
            Ok(iter) => iter
                .filter_map(Result::ok)
                .map(|e| guest_name(&e.file_name()))
                .collect(),
            Err(e) => {
                log::debug!("cannot scan {}: {}", self.dir.display(), e);
                Vec::new()
            }
        }
    }
}

impl VolumeFS for HostDirFS {
    fn volume_name(&self) -> Vec<u8> {
        let name = if self.dir == Path::new(".") {
            std::env::current_dir()
                .ok()
                .and_then(|cwd| cwd.file_name().map(guest_name))
        } else {
            self.dir.file_name().map(guest_name)
        };
        name.unwrap_or_default()
    }

    fn entries(&self) -> DosResult<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = guest_name(&entry.file_name());
            if name == b"." || name == b".." {
                continue;
            }
            // Follow symlinks like stat(2); unreadable entries count as empty
            let size = fs::metadata(entry.path()).map(|m| m.len()).unwrap_or(0);
            entries.push(DirEntry { name, size });
        }
        Ok(entries)
    }

    fn resolve(&self, filename: &[u8]) -> PathBuf {
        if has_wildcards(filename) {
            self.join(&resolve_name(filename, self.entry_names()))
        } else {
            self.join(filename)
        }
    }

    fn open_read(&self, filename: &[u8]) -> DosResult<Box<dyn Read + '_>> {
        let path = self.resolve(filename);
        log::debug!("open {} for reading", path.display());
        match File::open(&path) {
            Ok(f) => Ok(Box::new(f)),
            Err(e) => {
                log::debug!("open {} failed: {}", path.display(), e);
                Err(DosError::FileNotFound(path.display().to_string()))
            }
        }
    }

    fn create(&mut self, filename: &[u8]) -> DosResult<Box<dyn Write + '_>> {
        let path = self.resolve(filename);
        log::debug!("open {} for writing", path.display());
        match File::create(&path) {
            Ok(f) => Ok(Box::new(BufWriter::new(f))),
            Err(e) => {
                log::debug!("create {} failed: {}", path.display(), e);
                Err(DosError::FileNotFound(path.display().to_string()))
            }
        }
    }
}
