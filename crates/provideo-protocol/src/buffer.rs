//! Bounded response buffer.

use bytes::{Buf, BytesMut};

use provideo_core::error::{Error, Result};

/// Bytes received for the current exchange and not yet consumed.
///
/// The buffer never grows past its capacity. An append that would exceed
/// it is rejected with [`Error::Overflow`] and leaves the contents
/// untouched; nothing is silently truncated.
#[derive(Debug)]
pub struct ResponseBuffer {
    buf: BytesMut,
    capacity: usize,
}

impl ResponseBuffer {
    pub fn new(capacity: usize) -> Self {
        ResponseBuffer {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Append received bytes.
    pub fn extend(&mut self, data: &[u8]) -> Result<()> {
        if self.buf.len() + data.len() > self.capacity {
            tracing::warn!(
                len = self.buf.len(),
                incoming = data.len(),
                capacity = self.capacity,
                "response buffer overflow"
            );
            return Err(Error::Overflow(format!(
                "response exceeds {} bytes",
                self.capacity
            )));
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Drop `n` bytes from the front (clamped to the current length).
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.buf.len());
        self.buf.advance(n);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
