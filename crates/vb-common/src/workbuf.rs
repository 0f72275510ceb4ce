// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Work buffer
//!
//! Verification runs without a heap. The host lends one byte array for the
//! whole boot and every temporary (digests, RSA scratch, copies of vblock
//! objects read from flash) is carved out of it with a bump allocator.
//!
//! Allocations are LIFO. Instead of pairing every `alloc` with a matching
//! `free`, callers usually take a child view with [`WorkBuf::scope`] or
//! [`WorkBuf::split_alloc`]; whatever the child allocates disappears when it
//! goes out of scope, and the borrow checker rules out freeing in the wrong
//! order.

use crate::constants::WORKBUF_ALIGN;
use crate::errors::{Error, Result};

/// Round `size` up to the work buffer alignment
///
/// Returns `None` on overflow.
#[must_use]
pub const fn align_up(size: usize) -> Option<usize> {
    match size.checked_add(WORKBUF_ALIGN - 1) {
        Some(v) => Some(v & !(WORKBUF_ALIGN - 1)),
        None => None,
    }
}

/// Bump allocator over a borrowed byte array
pub struct WorkBuf<'a> {
    buf: &'a mut [u8],
    used: usize,
}

impl<'a> WorkBuf<'a> {
    /// Create a work buffer over `buf`
    ///
    /// The start is moved up to the next 16-byte boundary. If the buffer is
    /// too small to reach it, the result has no space; this is not an error
    /// until something tries to allocate.
    #[must_use]
    pub fn new(buf: &'a mut [u8]) -> Self {
        let pad = buf.as_ptr().align_offset(WORKBUF_ALIGN);
        let buf = buf.get_mut(pad..).unwrap_or_default();
        Self { buf, used: 0 }
    }

    /// Total capacity after alignment
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes currently allocated (always a multiple of the alignment)
    #[must_use]
    pub fn used(&self) -> usize {
        self.used
    }

    /// Bytes still available
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.used
    }

    /// Allocate `size` bytes
    ///
    /// The block starts on a 16-byte boundary and the allocator advances by
    /// `size` rounded up to 16. Its previous contents are not cleared.
    pub fn alloc(&mut self, size: usize) -> Result<&mut [u8]> {
        let start = self.reserve(size)?;
        Ok(&mut self.buf[start..start + size])
    }

    /// Allocate `size` bytes and lend out the rest of the buffer
    ///
    /// The returned child starts right after the block. Nothing the child
    /// allocates is visible to `self` once it is dropped.
    pub fn split_alloc(&mut self, size: usize) -> Result<(&mut [u8], WorkBuf<'_>)> {
        let start = self.used;
        let rounded = align_up(size).ok_or(Error::WorkbufTooSmall)?;
        if rounded > self.remaining() {
            return Err(Error::WorkbufTooSmall);
        }
        let (block, rest) = self.buf[start..].split_at_mut(rounded);
        Ok((&mut block[..size], WorkBuf { buf: rest, used: 0 }))
    }

    /// Borrow the free tail as a scoped child
    ///
    /// Dropping the child releases everything it allocated.
    pub fn scope(&mut self) -> WorkBuf<'_> {
        WorkBuf {
            buf: &mut self.buf[self.used..],
            used: 0,
        }
    }

    /// Release the most recent allocation of `size` bytes
    pub fn free(&mut self, size: usize) {
        let rounded = align_up(size).unwrap_or(usize::MAX);
        debug_assert!(rounded <= self.used, "work buffer freed more than allocated");
        self.used = self.used.saturating_sub(rounded);
    }

    /// Resize the most recent allocation from `old_size` to `new_size`
    ///
    /// The block keeps its start, so its contents survive up to the
    /// smaller of the two sizes.
    pub fn realloc(&mut self, old_size: usize, new_size: usize) -> Result<&mut [u8]> {
        let saved = self.used;
        self.free(old_size);
        match self.reserve(new_size) {
            Ok(start) => Ok(&mut self.buf[start..start + new_size]),
            Err(e) => {
                self.used = saved;
                Err(e)
            }
        }
    }

    /// Allocated bytes, from the start of the buffer
    #[must_use]
    pub fn allocated(&self) -> &[u8] {
        &self.buf[..self.used]
    }

    /// Claim `size` bytes at the current position and return their start
    fn reserve(&mut self, size: usize) -> Result<usize> {
        let rounded = align_up(size).ok_or(Error::WorkbufTooSmall)?;
        if rounded > self.remaining() {
            return Err(Error::WorkbufTooSmall);
        }
        let start = self.used;
        self.used += rounded;
        Ok(start)
    }
}
