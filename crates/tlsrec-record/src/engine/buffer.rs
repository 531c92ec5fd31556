//! Caller-owned byte buffer with a position/limit window.

use tlsrec_types::TlsError;

/// Fixed-capacity buffer. Bytes in `[position, limit)` are the remaining
/// (readable or writable) window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    data: Vec<u8>,
    position: usize,
    limit: usize,
    read_only: bool,
}

impl Buffer {
    /// A zero-filled buffer ready for writing.
    pub fn allocate(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity],
            position: 0,
            limit: capacity,
            read_only: false,
        }
    }

    /// A buffer whose remaining window is all of `data`.
    pub fn wrap(data: Vec<u8>) -> Self {
        let limit = data.len();
        Self {
            data,
            position: 0,
            limit,
            read_only: false,
        }
    }

    pub fn into_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    pub fn set_position(&mut self, position: usize) -> Result<(), TlsError> {
        if position > self.limit {
            return Err(TlsError::InvalidBuffer(format!(
                "position {position} beyond limit {}",
                self.limit
            )));
        }
        self.position = position;
        Ok(())
    }

    /// Move the limit; the position is pulled back if it lies beyond.
    pub fn set_limit(&mut self, limit: usize) -> Result<(), TlsError> {
        if limit > self.data.len() {
            return Err(TlsError::InvalidBuffer(format!(
                "limit {limit} beyond capacity {}",
                self.data.len()
            )));
        }
        self.limit = limit;
        self.position = self.position.min(limit);
        Ok(())
    }

    /// Limit to the current position and rewind, switching from writing
    /// to reading.
    pub fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
    }

    pub fn clear(&mut self) {
        self.position = 0;
        self.limit = self.data.len();
    }

    /// Move the remaining bytes to the front and prepare for more writes.
    pub fn compact(&mut self) -> Result<(), TlsError> {
        if self.read_only {
            return Err(TlsError::ReadOnlyBuffer);
        }
        let n = self.remaining();
        self.data.copy_within(self.position..self.limit, 0);
        self.position = n;
        self.limit = self.data.len();
        Ok(())
    }

    /// The remaining window.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.position..self.limit]
    }

    /// Copy `dst.len()` bytes out and advance.
    pub fn get(&mut self, dst: &mut [u8]) -> Result<(), TlsError> {
        if dst.len() > self.remaining() {
            return Err(TlsError::InvalidBuffer(format!(
                "underflow: {} requested, {} remaining",
                dst.len(),
                self.remaining()
            )));
        }
        dst.copy_from_slice(&self.data[self.position..self.position + dst.len()]);
        self.position += dst.len();
        Ok(())
    }

    /// Copy `src` in and advance.
    pub fn put(&mut self, src: &[u8]) -> Result<(), TlsError> {
        if self.read_only {
            return Err(TlsError::ReadOnlyBuffer);
        }
        if src.len() > self.remaining() {
            return Err(TlsError::InvalidBuffer(format!(
                "overflow: {} bytes, {} remaining",
                src.len(),
                self.remaining()
            )));
        }
        self.data[self.position..self.position + src.len()].copy_from_slice(src);
        self.position += src.len();
        Ok(())
    }

    /// Whole backing storage, independent of position and limit.
    pub fn storage(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn storage_mut(&mut self) -> Result<&mut [u8], TlsError> {
        if self.read_only {
            return Err(TlsError::ReadOnlyBuffer);
        }
        Ok(&mut self.data)
    }

    /// Restore a window saved earlier; both values were valid then.
    pub(crate) fn restore(&mut self, position: usize, limit: usize) {
        self.limit = limit.min(self.data.len());
        self.position = position.min(self.limit);
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}
