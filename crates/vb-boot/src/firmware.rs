// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Firmware vblock loading
//!
//! The vblock of the chosen slot is a key block followed by a firmware
//! preamble. Each object is peeked at first to learn its format and size,
//! then read whole into scratch space and verified.
//!
//! Work buffer layout while loading the key block:
//!
//! ```text
//! used ──► +----------+----------------------+---------+
//!          | root key | key block            | scratch |
//!          +----------+----------------------+---------+
//! ```
//!
//! Afterwards only the data key is kept, moved down to `used`. The
//! preamble is read after it and kept in place (legacy) or moved over the
//! data key (v2.1, which needs no key once the preamble is verified).

use vb_common::workbuf::align_up;
use vb_common::{log_debug, log_info, Error, Result, Version};
use zerocopy::FromBytes;

use crate::common::CommonHeader;
use crate::context::{Context, WorkbufRegion};
use crate::host::{BootHost, ResourceIndex};
use crate::key::unpack_key;
use crate::keyblock::{legacy_data_key, v21_data_key, verify_keyblock, verify_v21_keyblock};
use crate::preamble::{verify_fw_preamble, verify_v21_fw_preamble};
use crate::rollback::{
    check_combined_version, check_key_version, combine_version, fw_rollback_policy, roll_forward_fw,
    ImageKind,
};
use crate::wire::{Keyblock, PackedKey, WireFormat, MAGIC_FW_PREAMBLE, MAGIC_KEYBLOCK};

const MODULE: &str = "fw";

/// Offset of `keyblock_size` in a legacy key block
pub(crate) const KEYBLOCK_SIZE_OFFSET: usize = 16;

/// Offset of `preamble_size` in a legacy preamble
pub(crate) const PREAMBLE_SIZE_OFFSET: usize = 0;

/// Read the front of an object to learn its format and total size
pub(crate) fn peek_object<H: BootHost + ?Sized>(
    host: &mut H,
    index: ResourceIndex,
    offset: u32,
    v21_magic: u32,
    legacy_size_offset: usize,
) -> Result<(WireFormat, usize)> {
    let mut head = [0u8; CommonHeader::SIZE];
    host.read_resource(index, offset, &mut head)?;

    let format = WireFormat::detect(&head, v21_magic);
    let size = match format {
        WireFormat::Legacy => head
            .get(legacy_size_offset..legacy_size_offset + 4)
            .and_then(|b| u32::read_from_bytes(b).ok())
            .unwrap_or(0),
        WireFormat::V21 => CommonHeader::peek(&head).map_or(0, |hdr| hdr.total_size),
    };
    Ok((format, size as usize))
}

/// Read the size field of a legacy object without probing its format
pub(crate) fn read_legacy_size<H: BootHost + ?Sized>(
    host: &mut H,
    index: ResourceIndex,
    offset: u32,
    size_offset: usize,
) -> Result<usize> {
    let at = offset
        .checked_add(size_offset as u32)
        .ok_or(Error::ExReadResourceSize)?;
    let mut field = [0u8; 4];
    host.read_resource(index, at, &mut field)?;
    Ok(u32::from_ne_bytes(field) as usize)
}

/// Bytes a legacy packed key occupies, header included
pub(crate) fn packed_key_extent(key: &PackedKey) -> usize {
    (key.key_offset as usize)
        .saturating_add(key.key_size as usize)
        .max(PackedKey::SIZE)
}

/// Load and verify the firmware key block with the GBB root key
///
/// On success the data key is kept in the work buffer and its version
/// becomes the upper half of the firmware version.
///
/// # Errors
///
/// - [`Error::FwKeyblockWorkbufRootKey`] / [`Error::ReadResourceObjectBuf`]
///   when the work buffer cannot hold the root key or the key block
/// - host read errors, key unpacking and key block verification errors
/// - [`Error::FwKeyblockVersionRange`] / [`Error::FwKeyblockVersionRollback`]
pub fn load_fw_keyblock<H: BootHost + ?Sized>(ctx: &mut Context<'_>, host: &mut H) -> Result<()> {
    let ts = host.timestamp();
    let used = ctx.workbuf_used();
    let rootkey_offset = ctx.shared.gbb_rootkey_offset;
    let rootkey_size = ctx.shared.gbb_rootkey_size as usize;
    let block_start = align_up(rootkey_size).ok_or(Error::FwKeyblockWorkbufRootKey)?;

    let (format, block_size) =
        peek_object(host, ResourceIndex::FwVblock, 0, MAGIC_KEYBLOCK, KEYBLOCK_SIZE_OFFSET)?;

    let (key_offset, key_size, key_version) = {
        let (_, mut wb) = ctx.split_workbuf();
        let (root_buf, mut rest) =
            wb.split_alloc(rootkey_size).map_err(|_| Error::FwKeyblockWorkbufRootKey)?;
        host.read_resource(ResourceIndex::Gbb, rootkey_offset, root_buf)?;
        let root_key = unpack_key(root_buf)?;

        let (block, mut scratch) =
            rest.split_alloc(block_size).map_err(|_| Error::ReadResourceObjectBuf)?;
        host.read_resource(ResourceIndex::FwVblock, 0, block)?;

        let (offset, packed) = match format {
            WireFormat::Legacy => {
                let kb = verify_keyblock(block, &root_key, &mut scratch)?;
                (Keyblock::DATA_KEY_OFFSET, legacy_data_key(block, &kb))
            }
            WireFormat::V21 => {
                let kb = verify_v21_keyblock(block, &root_key, &mut scratch)?;
                (kb.key_offset as usize, v21_data_key(block, &kb))
            }
        };
        let data_key = unpack_key(packed)?;
        let size = match format {
            WireFormat::Legacy => {
                PackedKey::read_from_prefix(packed).map_or(0, |(k, _)| packed_key_extent(&k))
            }
            WireFormat::V21 => CommonHeader::peek(packed).map_or(0, |hdr| hdr.total_size as usize),
        };
        (block_start + offset, size.min(packed.len()), data_key.version)
    };

    let check = check_key_version(ImageKind::Firmware, key_version, ctx.shared.fw_version_secdata);
    fw_rollback_policy(ctx, ts, check)?;

    ctx.shared.data_key = ctx.keep(used + key_offset, key_size, used)?;
    ctx.shared.fw_version = key_version << 16;
    ctx.shared.vblock_preamble_offset = block_size as u32;

    log_debug!(ctx.log, ts, MODULE, "{:?} key block verified, key version {}", format, key_version);
    Ok(())
}

/// Load and verify the firmware preamble with the data key
///
/// Completes the firmware version, enforces rollback and rolls the stored
/// version forward when allowed.
///
/// # Errors
///
/// - [`Error::FwPreambleDataKey`] if no data key was loaded
/// - [`Error::ReadResourceObjectBuf`], host read and preamble errors
/// - [`Error::FwPreambleVersionRange`] / [`Error::FwPreambleVersionRollback`]
pub fn load_fw_preamble<H: BootHost + ?Sized>(ctx: &mut Context<'_>, host: &mut H) -> Result<()> {
    let ts = host.timestamp();
    let key_region = ctx.shared.data_key;
    if key_region.is_empty() {
        return Err(Error::FwPreambleDataKey);
    }
    let used = ctx.workbuf_used();
    let vblock_offset = ctx.shared.vblock_preamble_offset;

    let (format, size) = peek_object(
        host,
        ResourceIndex::FwVblock,
        vblock_offset,
        MAGIC_FW_PREAMBLE,
        PREAMBLE_SIZE_OFFSET,
    )?;

    let image_version = {
        let (head, mut wb) = ctx.split_workbuf();
        let key_bytes = head
            .get(key_region.offset..key_region.offset + key_region.size)
            .ok_or(Error::FwPreambleDataKey)?;
        let key = unpack_key(key_bytes)?;

        let (buf, mut scratch) = wb.split_alloc(size).map_err(|_| Error::ReadResourceObjectBuf)?;
        host.read_resource(ResourceIndex::FwVblock, vblock_offset, buf)?;

        match format {
            WireFormat::Legacy => verify_fw_preamble(buf, &key, &mut scratch)?.firmware_version,
            WireFormat::V21 => verify_v21_fw_preamble(buf, &key, &mut scratch)?.fw_version,
        }
    };

    let combined = combine_version(ImageKind::Firmware, ctx.shared.fw_version, image_version)?;
    ctx.shared.fw_version = combined;
    let check = check_combined_version(ImageKind::Firmware, combined, ctx.shared.fw_version_secdata);
    fw_rollback_policy(ctx, ts, check)?;

    roll_forward_fw(ctx, ts);

    ctx.shared.preamble = match format {
        WireFormat::Legacy => ctx.keep(used, size, used)?,
        WireFormat::V21 => {
            let region = ctx.keep(used, size, key_region.offset)?;
            ctx.shared.data_key = WorkbufRegion::EMPTY;
            region
        }
    };
    ctx.shared.preamble_format = format;

    log_info!(
        ctx.log,
        ts,
        MODULE,
        "slot {} verified, version {}",
        ctx.shared.fw_slot,
        Version::from_combined(combined)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vb_common::HashAlgorithm;
    use vb_crypto::HwCrypto;
    use zerocopy::{FromZeros, IntoBytes};

    use crate::common::HasCommonHeader;
    use crate::wire::V21Keyblock;

    struct Blob<'a>(&'a [u8]);

    impl HwCrypto for Blob<'_> {}

    impl BootHost for Blob<'_> {
        fn read_resource(&mut self, _: ResourceIndex, offset: u32, buf: &mut [u8]) -> Result<()> {
            let src = self
                .0
                .get(offset as usize..offset as usize + buf.len())
                .ok_or(Error::ExReadResourceSize)?;
            buf.copy_from_slice(src);
            Ok(())
        }

        fn tpm_clear_owner(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_peek_legacy_keyblock() {
        let mut kb = Keyblock::new_zeroed();
        kb.keyblock_size = 0x1234;
        let mut host = Blob(kb.as_bytes());
        assert_eq!(
            peek_object(&mut host, ResourceIndex::FwVblock, 0, MAGIC_KEYBLOCK, KEYBLOCK_SIZE_OFFSET),
            Ok((WireFormat::Legacy, 0x1234))
        );
    }

    #[test]
    fn test_peek_v21_keyblock() {
        let mut kb = V21Keyblock::new_zeroed();
        kb.c = CommonHeader::new(V21Keyblock::MAGIC, V21Keyblock::VERSION_MAJOR, 36, 400);
        let mut host = Blob(kb.as_bytes());
        assert_eq!(
            peek_object(&mut host, ResourceIndex::FwVblock, 0, MAGIC_KEYBLOCK, KEYBLOCK_SIZE_OFFSET),
            Ok((WireFormat::V21, 400))
        );
    }

    #[test]
    fn test_peek_short_vblock() {
        let mut host = Blob(&[0u8; 8]);
        assert_eq!(
            peek_object(&mut host, ResourceIndex::FwVblock, 0, MAGIC_KEYBLOCK, KEYBLOCK_SIZE_OFFSET),
            Err(Error::ExReadResourceSize)
        );
    }

    #[test]
    fn test_read_legacy_size() {
        let mut kb = Keyblock::new_zeroed();
        kb.keyblock_size = 0x0200;
        let mut host = Blob(kb.as_bytes());
        assert_eq!(
            read_legacy_size(&mut host, ResourceIndex::KernelVblock, 0, KEYBLOCK_SIZE_OFFSET),
            Ok(0x0200)
        );
        assert_eq!(
            read_legacy_size(&mut host, ResourceIndex::KernelVblock, u32::MAX, KEYBLOCK_SIZE_OFFSET),
            Err(Error::ExReadResourceSize)
        );
    }

    #[test]
    fn test_packed_key_extent() {
        let mut key = PackedKey::new_zeroed();
        key.key_offset = PackedKey::SIZE as u32;
        key.key_size = HashAlgorithm::Sha256.digest_size() as u32;
        assert_eq!(packed_key_extent(&key), 64);

        key.key_offset = 0;
        key.key_size = 4;
        assert_eq!(packed_key_extent(&key), PackedKey::SIZE);
    }
}
