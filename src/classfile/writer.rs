//! Big-endian output buffer for class-file serialization.

use crate::{Error, Result};

/// Accumulates serialized class-file bytes.
#[derive(Debug, Default)]
pub(crate) struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Writes a `u2` count, failing if `count` does not fit.
    pub fn count(&mut self, count: usize, what: &str) -> Result<()> {
        let value = u16::try_from(count).map_err(|_| {
            Error::malformed_class(self.len(), format!("{} count {} exceeds 65535", what, count))
        })?;
        self.u16(value);
        Ok(())
    }

    /// Writes a `u4` length prefix followed by the body produced by `body`.
    ///
    /// The length is derived from what `body` actually wrote, never from a
    /// previously stored value.
    pub fn length_prefixed<F>(&mut self, what: &str, body: F) -> Result<()>
    where
        F: FnOnce(&mut ByteWriter) -> Result<()>,
    {
        let mut inner = ByteWriter::new();
        body(&mut inner)?;
        let length = u32::try_from(inner.len()).map_err(|_| {
            Error::malformed_class(self.len(), format!("{} is longer than 4 GiB", what))
        })?;
        self.u32(length);
        self.bytes(&inner.buf);
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
