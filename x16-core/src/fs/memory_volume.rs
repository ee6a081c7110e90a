//! In-memory volume implementation.

use std::cell::Cell;
use std::io::{Read, Write};
use std::path::PathBuf;

use super::pattern::resolve_name;
use super::volume::{DirEntry, VolumeFS};
use crate::error::{DosError, DosResult};

/// Simple in-memory volume. Entries enumerate in insertion order.
#[derive(Default, Clone)]
pub struct MemoryVolumeFS {
    name: Vec<u8>,
    files: Vec<(Vec<u8>, Vec<u8>)>,
    read_only: bool,
    opens: Cell<usize>,
}

impl MemoryVolumeFS {
    pub fn new(name: impl AsRef<[u8]>) -> Self {
        Self {
            name: name.as_ref().to_vec(),
            ..Self::default()
        }
    }

    /// Create with initial files.
    pub fn with_files<N, I, S>(name: N, files: I) -> Self
    where
        N: AsRef<[u8]>,
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<[u8]>,
    {
        let mut fs = Self::new(name);
        for (file, data) in files {
            fs.add_file(file, data);
        }
        fs
    }

    /// Add or replace a file.
    pub fn add_file(&mut self, name: impl AsRef<[u8]>, data: impl Into<Vec<u8>>) {
        let name = name.as_ref();
        let data = data.into();
        match self.files.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data,
            None => self.files.push((name.to_vec(), data)),
        }
    }

    pub fn file(&self, name: impl AsRef<[u8]>) -> Option<&[u8]> {
        let name = name.as_ref();
        self.files
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d.as_slice())
    }

    pub fn exists(&self, name: impl AsRef<[u8]>) -> bool {
        self.file(name).is_some()
    }

    /// Refuse `create`, like a write-protected card.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Number of `open_read`/`create` calls so far.
    pub fn open_count(&self) -> usize {
        self.opens.get()
    }

    fn resolve_key(&self, filename: &[u8]) -> Vec<u8> {
        resolve_name(filename, self.files.iter().map(|(n, _)| n.as_slice()))
    }
}

fn not_found(key: &[u8]) -> DosError {
    DosError::FileNotFound(String::from_utf8_lossy(key).into_owned())
}

impl VolumeFS for MemoryVolumeFS {
    fn volume_name(&self) -> Vec<u8> {
        self.name.clone()
    }

    fn entries(&self) -> DosResult<Vec<DirEntry>> {
        Ok(self
            .files
            .iter()
            .map(|(n, d)| DirEntry::new(n.as_slice(), d.len() as u64))
            .collect())
    }

    fn resolve(&self, filename: &[u8]) -> PathBuf {
        PathBuf::from(String::from_utf8_lossy(&self.resolve_key(filename)).into_owned())
    }

    fn open_read(&self, filename: &[u8]) -> DosResult<Box<dyn Read + '_>> {
        self.opens.set(self.opens.get() + 1);
        let key = self.resolve_key(filename);
        match self.file(&key) {
            Some(data) => Ok(Box::new(data)),
            None => Err(not_found(&key)),
        }
    }

    fn create(&mut self, filename: &[u8]) -> DosResult<Box<dyn Write + '_>> {
        self.opens.set(self.opens.get() + 1);
        let key = self.resolve_key(filename);
        if self.read_only {
            return Err(not_found(&key));
        }
        let idx = match self.files.iter().position(|(n, _)| *n == key) {
            Some(idx) => idx,
            None => {
                self.files.push((key, Vec::new()));
                self.files.len() - 1
            }
        };
        let data = &mut self.files[idx].1;
        data.clear();
        Ok(Box::new(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_file() {
        let mut fs = MemoryVolumeFS::new("DEMO");
        fs.create(b"TEST.PRG").unwrap().write_all(&[1, 8, 0xEA]).unwrap();

        assert!(fs.exists("TEST.PRG"));
        assert!(!fs.exists("test.prg")); // Case sensitive
        let mut data = Vec::new();
        fs.open_read(b"TEST.PRG").unwrap().read_to_end(&mut data).unwrap();
        assert_eq!(data, vec![1, 8, 0xEA]);
        assert_eq!(fs.open_count(), 2);
    }

    #[test]
    fn test_create_truncates() {
        let mut fs = MemoryVolumeFS::with_files("DEMO", [("A", vec![1, 2, 3])]);
        fs.create(b"A").unwrap().write_all(&[9]).unwrap();
        assert_eq!(fs.file("A"), Some(&[9u8][..]));
    }

    #[test]
    fn test_insertion_order() {
        let fs = MemoryVolumeFS::with_files("DEMO", [("B", vec![]), ("A", vec![0; 300])]);
        let names: Vec<_> = fs.entries().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec![b"B".to_vec(), b"A".to_vec()]);
        assert_eq!(fs.resolve(b"?"), PathBuf::from("B"));
    }

    #[test]
    fn test_read_only() {
        let mut fs = MemoryVolumeFS::new("RO");
        fs.set_read_only(true);
        assert!(matches!(fs.create(b"X"), Err(DosError::FileNotFound(_))));
        assert!(!fs.exists("X"));
    }

    #[test]
    fn test_high_byte_names_kept() {
        let mut fs = MemoryVolumeFS::new("DEMO");
        fs.create(b"A\xC1").unwrap().write_all(&[1]).unwrap();
        assert!(fs.exists(b"A\xC1"));
        assert_eq!(fs.entries().unwrap()[0].name, vec![b'A', 0xC1]);
        assert!(fs.open_read(b"A*").is_ok());
    }

    #[test]
    fn test_missing_file() {
        let fs = MemoryVolumeFS::new("DEMO");
        assert!(matches!(fs.open_read(b"NONE"), Err(DosError::FileNotFound(_))));
    }
}
