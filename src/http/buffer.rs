//! Bounded line buffer.
//!
//! # Responsibilities
//! - Accumulate the bytes of one line across arbitrarily split input chunks
//! - Enforce the hard field limit fixed at parser creation
//! - Recycle storage between lines without reallocating
//!
//! # Design Decisions
//! - Storage is reserved once, up front, with a fallible reservation
//! - Exceeding the limit is an error, never a truncation

use crate::error::{NormalizerError, Result};

/// Growable byte buffer with a hard capacity.
#[derive(Debug)]
pub struct LineBuffer {
    data: Vec<u8>,
    limit: usize,
}

impl LineBuffer {
    /// Allocate a buffer able to hold `limit` bytes.
    pub fn with_limit(limit: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(limit)
            .map_err(|_| NormalizerError::OutOfMemory(limit))?;
        Ok(Self { data, limit })
    }

    /// Append `bytes`, failing if the line would outgrow the limit.
    ///
    /// On failure the buffer is left unchanged.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let attempted = self.data.len().saturating_add(bytes.len());
        if attempted > self.limit {
            return Err(NormalizerError::BufferLimitExceeded {
                limit: self.limit,
                attempted,
            });
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Forget the current contents, keeping the allocation.
    pub fn reset(&mut self) {
        self.data.clear();
    }

    /// Free the storage. Every later append fails.
    pub fn release(&mut self) {
        self.data = Vec::new();
        self.limit = 0;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The hard limit this buffer was created with.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes currently allocated.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }
}
