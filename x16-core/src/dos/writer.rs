//! Bounded byte writer.

use crate::error::{DosError, DosResult};

/// Cursor over a fixed buffer that fails instead of writing past the end.
pub struct BoundedWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> BoundedWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    pub fn put(&mut self, byte: u8) -> DosResult<()> {
        self.put_slice(&[byte])
    }

    pub fn put_slice(&mut self, data: &[u8]) -> DosResult<()> {
        let end = self.pos + data.len();
        if end > self.buf.len() {
            return Err(DosError::BufferOverflow {
                capacity: self.buf.len(),
            });
        }
        self.buf[self.pos..end].copy_from_slice(data);
        self.pos = end;
        Ok(())
    }

    pub fn put_u16(&mut self, value: u16) -> DosResult<()> {
        self.put_slice(&value.to_le_bytes())
    }

    /// Write `count` copies of `byte`.
    pub fn fill(&mut self, byte: u8, count: usize) -> DosResult<()> {
        for _ in 0..count {
            self.put(byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_within_capacity() {
        let mut buf = [0u8; 4];
        let mut w = BoundedWriter::new(&mut buf);
        w.put(1).unwrap();
        w.put_u16(0x0302).unwrap();
        assert_eq!(w.written(), &[1, 2, 3]);
        assert_eq!(w.position(), 3);
    }

    #[test]
    fn test_overflow_leaves_cursor() {
        let mut buf = [0u8; 2];
        let mut w = BoundedWriter::new(&mut buf);
        w.put(7).unwrap();
        assert!(matches!(
            w.put_slice(&[1, 2]),
            Err(DosError::BufferOverflow { capacity: 2 })
        ));
        assert_eq!(w.written(), &[7]);
    }

    #[test]
    fn test_zero_capacity() {
        let mut w = BoundedWriter::new(&mut []);
        assert_eq!(w.capacity(), 0);
        assert!(w.put(0).is_err());
        assert!(w.fill(b' ', 0).is_ok());
    }
}
