//! Logical file table.
//!
//! Sixteen channel slots indexed by logical file number (`LA & 0x0F`). Every
//! slot that is not closed owns exactly one data buffer; closing releases it.

use crate::kernal::IO_MAX_FILES;

/// Lifecycle state of a channel slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Command channel (secondary address 15)
    Command,
    Closed,
    Write,
    Read,
}

/// One logical file.
#[derive(Debug, Clone)]
pub struct IoFile {
    mode: FileMode,
    data: Option<Vec<u8>>,
}

impl Default for IoFile {
    fn default() -> Self {
        Self {
            mode: FileMode::Closed,
            data: None,
        }
    }
}

impl IoFile {
    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Bytes held in the buffer.
    pub fn data_length(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    /// Bytes the buffer can hold without reallocating.
    pub fn data_capacity(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::capacity)
    }

    pub fn is_open(&self) -> bool {
        self.mode != FileMode::Closed
    }
}

/// Fixed table of logical files.
#[derive(Debug, Clone, Default)]
pub struct FileTable {
    files: [IoFile; IO_MAX_FILES],
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(index: u8) -> usize {
        index as usize % IO_MAX_FILES
    }

    pub fn get(&self, index: u8) -> &IoFile {
        &self.files[Self::slot(index)]
    }

    /// Open a slot as the command channel, with an empty buffer.
    pub fn open_command(&mut self, index: u8) {
        self.files[Self::slot(index)] = IoFile {
            mode: FileMode::Command,
            data: Some(Vec::new()),
        };
    }

    /// Open a slot for reading with the file's contents.
    pub fn open_read(&mut self, index: u8, data: Vec<u8>) {
        self.files[Self::slot(index)] = IoFile {
            mode: FileMode::Read,
            data: Some(data),
        };
    }

    /// Open a slot for writing with an empty buffer.
    pub fn open_write(&mut self, index: u8) {
        self.files[Self::slot(index)] = IoFile {
            mode: FileMode::Write,
            data: Some(Vec::new()),
        };
    }

    /// Close a slot, releasing its buffer. Returns whether it was open.
    pub fn close(&mut self, index: u8) -> bool {
        let file = std::mem::take(&mut self.files[Self::slot(index)]);
        file.is_open()
    }

    /// Close every slot.
    pub fn close_all(&mut self) {
        self.files = Default::default();
    }

    pub fn open_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_open()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initially_closed() {
        let table = FileTable::new();
        assert_eq!(table.open_count(), 0);
        assert_eq!(table.get(3).mode(), FileMode::Closed);
        assert!(table.get(3).data().is_none());
    }

    #[test]
    fn test_read_slot_owns_buffer() {
        let mut table = FileTable::new();
        table.open_read(2, vec![1, 2, 3]);
        let file = table.get(2);
        assert_eq!(file.mode(), FileMode::Read);
        assert_eq!(file.data(), Some(&[1u8, 2, 3][..]));
        assert!(file.data_length() <= file.data_capacity());

        assert!(table.close(2));
        assert!(table.get(2).data().is_none());
        assert!(!table.close(2));
    }

    #[test]
    fn test_command_slot_owns_buffer() {
        let mut table = FileTable::new();
        table.open_command(15);
        assert_eq!(table.get(15).mode(), FileMode::Command);
        assert_eq!(table.get(15).data(), Some(&[][..]));
        assert!(table.get(15).is_open());

        assert!(table.close(15));
        assert!(table.get(15).data().is_none());
    }

    #[test]
    fn test_open_slots_always_own_buffers() {
        let mut table = FileTable::new();
        table.open_command(0);
        table.open_write(1);
        table.open_read(2, vec![7]);
        for index in 0..16u8 {
            let file = table.get(index);
            assert_eq!(file.is_open(), file.data().is_some());
        }
    }

    #[test]
    fn test_index_wraps() {
        let mut table = FileTable::new();
        table.open_write(17);
        assert_eq!(table.get(1).mode(), FileMode::Write);
        table.close_all();
        assert_eq!(table.open_count(), 0);
    }
}
