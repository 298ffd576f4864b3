//! Bounds-checked big-endian reading for class-file parsing.

use crate::{Error, Result};

/// A cursor over class-file bytes.
///
/// Every read checks the remaining length first, so truncated or
/// inconsistent input surfaces as [`Error::MalformedClassFile`] carrying the
/// absolute offset at which the read failed.
#[derive(Debug, Clone)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Absolute offset of `data[0]` within the class file.
    base: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Returns the absolute offset of the next byte.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Builds an error positioned at the current offset.
    pub fn error(&self, reason: impl Into<String>) -> Error {
        Error::malformed_class(self.offset(), reason)
    }

    pub fn bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(self.error(format!(
                "truncated {}: need {} bytes, {} remain",
                what,
                len,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.bytes(1, what)?[0])
    }

    pub fn u16(&mut self, what: &str) -> Result<u16> {
        let b = self.bytes(2, what)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self, what: &str) -> Result<u32> {
        let b = self.bytes(4, what)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn u64(&mut self, what: &str) -> Result<u64> {
        let b = self.bytes(8, what)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(b);
        Ok(u64::from_be_bytes(buf))
    }

    /// Splits off the next `len` bytes as an independent reader.
    ///
    /// Offsets reported by the sub-reader stay absolute.
    pub fn sub_reader(&mut self, len: usize, what: &str) -> Result<ByteReader<'a>> {
        let base = self.offset();
        let data = self.bytes(len, what)?;
        Ok(ByteReader { data, pos: 0, base })
    }

    /// Fails unless every byte has been consumed.
    pub fn expect_end(&self, what: &str) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.error(format!(
                "{} has {} unexpected trailing bytes",
                what,
                self.remaining()
            )))
        }
    }
}
