// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Common header validation
//!
//! Every v2.1 structure starts with the same 20-byte header:
//!
//! ```text
//! +--------+-------+-------+------------+------------+-----------+
//! | magic  | major | minor | total_size | fixed_size | desc_size |
//! | u32    | u16   | u16   | u32        | u32        | u32       |
//! +--------+-------+-------+------------+------------+-----------+
//! ```
//!
//! `fixed_size` covers the structure's own fields, the description follows
//! it, and everything after that up to `total_size` is member data. Members
//! are checked in increasing offset order and may not overlap.

use vb_common::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::bounds::is_aligned4;

/// Header shared by every v2.1 structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct CommonHeader {
    /// Structure magic
    pub magic: u32,
    /// Major version; readers reject any other value
    pub struct_version_major: u16,
    /// Minor version; readers accept any value
    pub struct_version_minor: u16,
    /// Size of the whole object including members
    pub total_size: u32,
    /// Size of the fixed fields, including this header
    pub fixed_size: u32,
    /// Size of the NUL-terminated description after the fixed fields
    pub desc_size: u32,
}

impl CommonHeader {
    /// Size of the header on the wire
    pub const SIZE: usize = 20;

    /// Create a header for a structure with no description
    #[must_use]
    pub const fn new(magic: u32, major: u16, fixed_size: u32, total_size: u32) -> Self {
        Self {
            magic,
            struct_version_major: major,
            struct_version_minor: 0,
            total_size,
            fixed_size,
            desc_size: 0,
        }
    }

    /// Read the header at the front of `buf`
    ///
    /// Only the presence of 20 bytes is checked.
    #[must_use]
    pub fn peek(buf: &[u8]) -> Option<Self> {
        Self::read_from_prefix(buf).ok().map(|(hdr, _)| hdr)
    }
}

/// Per-type failure codes for the generic parser
#[derive(Debug, Clone, Copy)]
pub struct HeaderErrors {
    /// Wrong magic
    pub magic: Error,
    /// Wrong major version
    pub version: Error,
    /// `fixed_size` smaller than the structure
    pub fixed_size: Error,
}

/// A v2.1 structure that begins with a [`CommonHeader`]
pub trait HasCommonHeader: FromBytes + KnownLayout + Immutable + Sized {
    /// Expected magic
    const MAGIC: u32;
    /// Supported major version
    const VERSION_MAJOR: u16;
    /// Errors reported by [`parse_common`]
    const ERRORS: HeaderErrors;

    /// The structure's header
    fn common(&self) -> &CommonHeader;
}

/// Check the common header at the front of `buf`
///
/// `buf` is everything the caller is willing to let the object cover. The
/// object is only trusted up to the header's `total_size`.
///
/// # Errors
///
/// The `Common*` family, in the order: total size, fixed size, total
/// alignment, fixed alignment, description alignment, description wrap,
/// description size, description terminator.
pub fn verify_common_header(buf: &[u8]) -> Result<CommonHeader> {
    let c = CommonHeader::peek(buf).ok_or(Error::CommonTotalSize)?;

    if c.total_size as usize > buf.len() {
        return Err(Error::CommonTotalSize);
    }
    if c.total_size < c.fixed_size || (c.fixed_size as usize) < CommonHeader::SIZE {
        return Err(Error::CommonFixedSize);
    }

    if !is_aligned4(c.total_size) {
        return Err(Error::CommonTotalUnaligned);
    }
    if !is_aligned4(c.fixed_size) {
        return Err(Error::CommonFixedUnaligned);
    }
    if !is_aligned4(c.desc_size) {
        return Err(Error::CommonDescUnaligned);
    }

    if c.desc_size > 0 {
        let desc_end = c
            .fixed_size
            .checked_add(c.desc_size)
            .ok_or(Error::CommonDescWraps)?;
        if desc_end > c.total_size {
            return Err(Error::CommonDescSize);
        }
        if buf[desc_end as usize - 1] != 0 {
            return Err(Error::CommonDescTerminator);
        }
    }

    Ok(c)
}

/// Check one member of a verified parent
///
/// `min_offset` starts at zero and is advanced past each member, so members
/// must be checked in the order they are laid out.
///
/// # Errors
///
/// [`Error::CommonMemberWraps`], [`Error::CommonMemberUnaligned`],
/// [`Error::CommonMemberOverlap`] or [`Error::CommonMemberSize`].
pub fn verify_common_member(
    parent: &CommonHeader,
    min_offset: &mut u32,
    member_offset: u32,
    member_size: u32,
) -> Result<()> {
    let member_end = member_offset
        .checked_add(member_size)
        .ok_or(Error::CommonMemberWraps)?;

    if !is_aligned4(member_offset) || !is_aligned4(member_size) {
        return Err(Error::CommonMemberUnaligned);
    }

    if *min_offset == 0 {
        *min_offset = parent.fixed_size.saturating_add(parent.desc_size);
    }

    if member_offset < *min_offset {
        return Err(Error::CommonMemberOverlap);
    }
    if member_end > parent.total_size {
        return Err(Error::CommonMemberSize);
    }

    *min_offset = member_end;
    Ok(())
}

/// Check a member that is itself a v2.1 object
///
/// `parent` is the parent's bytes, at least `parent_hdr.total_size` long.
/// Returns the member's header.
///
/// # Errors
///
/// Any error of [`verify_common_member`] or [`verify_common_header`].
pub fn verify_common_subobject(
    parent: &[u8],
    parent_hdr: &CommonHeader,
    min_offset: &mut u32,
    member_offset: u32,
) -> Result<CommonHeader> {
    verify_common_member(parent_hdr, min_offset, member_offset, CommonHeader::SIZE as u32)?;

    let sub = parent
        .get(member_offset as usize..parent_hdr.total_size as usize)
        .ok_or(Error::CommonMemberSize)?;
    let hdr = verify_common_header(sub)?;

    *min_offset = member_offset + hdr.total_size;
    Ok(hdr)
}

/// Description of a verified object, without the terminator
///
/// Empty when the object has no description.
#[must_use]
pub fn common_desc<'a>(buf: &'a [u8], hdr: &CommonHeader) -> &'a [u8] {
    if hdr.desc_size == 0 {
        return &[];
    }
    let start = hdr.fixed_size as usize;
    let end = start + hdr.desc_size as usize;
    let desc = buf.get(start..end).unwrap_or_default();
    let len = desc.iter().position(|&b| b == 0).unwrap_or(desc.len());
    &desc[..len]
}

/// Check and read a v2.1 structure from the front of `buf`
///
/// Checks, in order: magic, common header, major version, and that
/// `fixed_size` covers the whole structure.
///
/// # Errors
///
/// `T::ERRORS.magic`, any [`verify_common_header`] error,
/// `T::ERRORS.version` or `T::ERRORS.fixed_size`.
pub fn parse_common<T: HasCommonHeader>(buf: &[u8]) -> Result<(T, CommonHeader)> {
    let magic = buf
        .get(..4)
        .and_then(|b| u32::read_from_bytes(b).ok())
        .ok_or(T::ERRORS.magic)?;
    if magic != T::MAGIC {
        return Err(T::ERRORS.magic);
    }

    let hdr = verify_common_header(buf)?;

    if hdr.struct_version_major != T::VERSION_MAJOR {
        return Err(T::ERRORS.version);
    }
    if (hdr.fixed_size as usize) < core::mem::size_of::<T>() {
        return Err(T::ERRORS.fixed_size);
    }

    let (value, _) = T::read_from_prefix(buf).map_err(|_| T::ERRORS.fixed_size)?;
    Ok((value, hdr))
}
