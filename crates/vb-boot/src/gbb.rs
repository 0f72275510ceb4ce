// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Google Binary Block
//!
//! The GBB sits in read-only flash and holds the root key, the recovery
//! key and a flags word. Only the header is read here; the keys are read
//! later by whoever needs them, using the locations saved in
//! [`SharedData`](crate::context::SharedData).

use vb_common::{Error, Result};
use zerocopy::FromBytes;

use crate::context::{status, Context};
use crate::host::{BootHost, ResourceIndex};
use crate::wire::{GbbHeader, GBB_MAGIC, GBB_VERSION_MAJOR, GBB_VERSION_MINOR_MIN};

/// Check a GBB header
///
/// # Errors
///
/// [`Error::GbbMagic`], [`Error::GbbVersion`], [`Error::GbbTooOld`] or
/// [`Error::GbbHeaderSize`], in that order.
pub fn validate_gbb_header(gbb: &GbbHeader) -> Result<()> {
    if gbb.signature != GBB_MAGIC {
        return Err(Error::GbbMagic);
    }
    if gbb.major_version != GBB_VERSION_MAJOR {
        return Err(Error::GbbVersion);
    }
    if gbb.minor_version < GBB_VERSION_MINOR_MIN {
        return Err(Error::GbbTooOld);
    }
    if (gbb.header_size as usize) < GbbHeader::SIZE {
        return Err(Error::GbbHeaderSize);
    }
    Ok(())
}

/// Read and check the GBB header, saving its flags and key locations
///
/// # Errors
///
/// [`Error::GbbWorkbuf`] if there is no room for the header, host read
/// errors, or any error from [`validate_gbb_header`].
pub fn read_gbb_header<H: BootHost + ?Sized>(ctx: &mut Context<'_>, host: &mut H) -> Result<GbbHeader> {
    let gbb = {
        let (_, mut wb) = ctx.split_workbuf();
        let buf = wb.alloc(GbbHeader::SIZE).map_err(|_| Error::GbbWorkbuf)?;
        host.read_resource(ResourceIndex::Gbb, 0, buf)?;
        GbbHeader::read_from_bytes(buf).map_err(|_| Error::GbbHeaderSize)?
    };

    validate_gbb_header(&gbb)?;

    let sd = &mut ctx.shared;
    sd.gbb_flags = gbb.flags;
    sd.gbb_rootkey_offset = gbb.rootkey_offset;
    sd.gbb_rootkey_size = gbb.rootkey_size;
    sd.gbb_recovery_key_offset = gbb.recovery_key_offset;
    sd.gbb_recovery_key_size = gbb.recovery_key_size;
    sd.status |= status::GBB_PARSED;

    Ok(gbb)
}
