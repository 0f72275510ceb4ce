// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Overflow-checked containment helpers
//!
//! Every offset and size that comes off the wire goes through this module
//! before it is used to index anything. Arithmetic is done in `u64`, so two
//! `u32` fields can never wrap when added; the `*_WRAPS` errors are still
//! raised for the cases the on-wire 32-bit sum would have wrapped.

use vb_common::{Error, Result};

/// End of the range `[offset, offset + size)`, or `None` if it wraps 32 bits
#[must_use]
pub const fn checked_end(offset: u32, size: u32) -> Option<u32> {
    offset.checked_add(size)
}

/// Check that `[offset, offset + size)` lies in a buffer of `len` bytes
#[must_use]
pub fn range_inside(len: usize, offset: u32, size: u32) -> bool {
    match checked_end(offset, size) {
        Some(end) => end as usize <= len,
        None => false,
    }
}

/// Borrow `[offset, offset + size)` of `buf`
///
/// Returns `err` if the range wraps or runs off the end.
pub fn sub_slice(buf: &[u8], offset: u32, size: u32, err: Error) -> Result<&[u8]> {
    let end = checked_end(offset, size).ok_or(err)?;
    buf.get(offset as usize..end as usize).ok_or(err)
}

/// Verify that a member and the data it points to lie inside a parent
///
/// The member sits at `member_offset` in the parent and is `member_size`
/// bytes. Its data starts `data_offset` bytes after the start of the member
/// and is `data_size` bytes long. A size of zero is legal anywhere inside
/// the parent, including at its very end.
///
/// # Errors
///
/// In order: [`Error::InsideParentWraps`], [`Error::InsideMemberWraps`],
/// [`Error::InsideMemberOutside`], [`Error::InsideDataWraps`],
/// [`Error::InsideDataOutside`].
pub fn verify_member_inside(
    parent_size: u64,
    member_offset: u64,
    member_size: u64,
    data_offset: u64,
    data_size: u64,
) -> Result<()> {
    if parent_size > u64::from(u32::MAX) {
        return Err(Error::InsideParentWraps);
    }

    let member_end = member_offset
        .checked_add(member_size)
        .ok_or(Error::InsideMemberWraps)?;
    if member_offset > parent_size || member_end > parent_size {
        return Err(Error::InsideMemberOutside);
    }

    let data_start = member_offset
        .checked_add(data_offset)
        .ok_or(Error::InsideDataWraps)?;
    let data_end = data_start
        .checked_add(data_size)
        .ok_or(Error::InsideDataWraps)?;
    if data_start > parent_size || data_end > parent_size {
        return Err(Error::InsideDataOutside);
    }

    Ok(())
}

/// Verify that `[start, start + size)` lies inside `[base, base + len)`
///
/// Used for absolute addresses such as a kernel's bootloader, which is
/// placed relative to the body load address.
#[must_use]
pub fn absolute_range_inside(base: u64, len: u64, start: u64, size: u64) -> bool {
    let Some(end) = start.checked_add(size) else {
        return false;
    };
    let Some(limit) = base.checked_add(len) else {
        return false;
    };
    start >= base && end <= limit
}

/// Check that a size is a multiple of 32 bits
#[must_use]
pub const fn is_aligned4(value: u32) -> bool {
    value % 4 == 0
}
