// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Kernel verification
//!
//! The kernel partition starts with a legacy vblock: a key block signed by
//! the kernel subkey (or by the recovery key in recovery mode) and a
//! kernel preamble signed by the key block's data key.
//!
//! In developer mode a kernel may be accepted without a valid signature,
//! as long as its key block checksum is intact. Such a kernel never rolls
//! the stored kernel version forward.

use vb_common::{log_debug, log_info, log_warn, Error, Result, Version};
use zerocopy::FromBytes;

use crate::context::{context_flags, shared_flags, Context, HashTag, WorkbufRegion};
use crate::firmware::{packed_key_extent, read_legacy_size, KEYBLOCK_SIZE_OFFSET, PREAMBLE_SIZE_OFFSET};
use crate::host::{BootHost, ResourceIndex};
use crate::key::unpack_key;
use crate::keyblock::{legacy_data_key, verify_keyblock, verify_keyblock_hash};
use crate::preamble::{kernel_body_sig_data, kernel_subkey, verify_kernel_preamble};
use crate::rollback::{check_combined_version, check_key_version, combine_version, roll_forward_kernel, ImageKind};
use crate::signature::verify_legacy_data;
use crate::wire::{keyblock_flags, FwPreamble, Keyblock, KernelPreamble, WireFormat};

const MODULE: &str = "kernel";

/// Whether this boot only accepts signature-verified kernels
///
/// Normal and recovery boots always do. Developer mode does when NV data
/// or the configuration asks for signed kernels only.
#[must_use]
pub fn need_signed_kernel(ctx: &Context<'_>) -> bool {
    !ctx.has_flag(context_flags::DEVELOPER_MODE)
        || ctx.has_flag(context_flags::RECOVERY_MODE)
        || ctx.nv().dev_boot_signed_only
        || ctx.config.require_signed_kernel
}

/// Load the key that signs kernel key blocks
///
/// In recovery mode this is the GBB recovery key. Otherwise it is the
/// kernel subkey from the verified legacy firmware preamble, which is
/// moved to the start of the work buffer; everything else stored there
/// is discarded.
///
/// # Errors
///
/// - [`Error::ApiKphase1Preamble`] if no legacy firmware preamble is loaded
/// - [`Error::ApiKphase1Workbuf`] if the key does not fit
/// - host read and key unpacking errors
pub fn kernel_phase1<H: BootHost + ?Sized>(ctx: &mut Context<'_>, host: &mut H) -> Result<()> {
    let ts = host.timestamp();
    ctx.shared.kernel_version_secdata = ctx.secdata().kernel_versions;
    ctx.shared.hash_tag = HashTag::Invalid;
    ctx.digest = None;

    let region = if ctx.has_flag(context_flags::RECOVERY_MODE) {
        let offset = ctx.shared.gbb_recovery_key_offset;
        let size = ctx.shared.gbb_recovery_key_size as usize;
        let used = ctx.workbuf_used();
        {
            let (_, mut wb) = ctx.split_workbuf();
            let buf = wb.alloc(size).map_err(|_| Error::ApiKphase1Workbuf)?;
            host.read_resource(ResourceIndex::Gbb, offset, buf)?;
            unpack_key(buf)?;
        }
        let region = ctx.keep(used, size, used).map_err(|_| Error::ApiKphase1Workbuf)?;
        log_info!(ctx.log, ts, MODULE, "using recovery key");
        region
    } else {
        if ctx.shared.preamble_format != WireFormat::Legacy {
            return Err(Error::ApiKphase1Preamble);
        }
        let pre_region = ctx.shared.preamble;
        let (start, size) = {
            let bytes = ctx.stored(pre_region).ok_or(Error::ApiKphase1Preamble)?;
            let (pre, _) = FwPreamble::read_from_prefix(bytes).map_err(|_| Error::ApiKphase1Preamble)?;
            let subkey = kernel_subkey(bytes, &pre);
            unpack_key(subkey)?;
            (pre_region.offset + FwPreamble::KERNEL_SUBKEY_OFFSET, subkey.len())
        };
        let region = ctx.keep(start, size, 0).map_err(|_| Error::ApiKphase1Workbuf)?;
        ctx.shared.data_key = WorkbufRegion::EMPTY;
        ctx.shared.preamble = WorkbufRegion::EMPTY;
        log_debug!(ctx.log, ts, MODULE, "using kernel subkey");
        region
    };

    ctx.shared.kernel_key = region;
    Ok(())
}

/// Load and verify the kernel key block
///
/// When a signed kernel is not required, a key block whose signature does
/// not verify is accepted on its checksum, and flag or version mismatches
/// only clear [`shared_flags::KERNEL_SIGNED`].
///
/// # Errors
///
/// - [`Error::ApiKphase1Preamble`] if [`kernel_phase1`] has not run
/// - [`Error::ReadResourceObjectBuf`], host read and key block errors
/// - [`Error::KernelKeyblockDevFlag`] / [`Error::KernelKeyblockRecFlag`]
/// - [`Error::KernelKeyblockVersionRange`] /
///   [`Error::KernelKeyblockVersionRollback`], outside recovery mode
pub fn load_kernel_keyblock<H: BootHost + ?Sized>(ctx: &mut Context<'_>, host: &mut H) -> Result<()> {
    let ts = host.timestamp();
    let key_region = ctx.shared.kernel_key;
    if key_region.is_empty() {
        return Err(Error::ApiKphase1Preamble);
    }
    let recovery = ctx.has_flag(context_flags::RECOVERY_MODE);
    let developer = ctx.has_flag(context_flags::DEVELOPER_MODE);
    let need_signed = need_signed_kernel(ctx);
    let used = ctx.workbuf_used();

    let size = read_legacy_size(host, ResourceIndex::KernelVblock, 0, KEYBLOCK_SIZE_OFFSET)?;

    let (block, signature_ok, key_size) = {
        let (head, mut wb) = ctx.split_workbuf();
        let key_bytes = head
            .get(key_region.offset..key_region.offset + key_region.size)
            .ok_or(Error::ApiKphase1Preamble)?;
        let key = unpack_key(key_bytes)?;

        let (buf, mut scratch) = wb.split_alloc(size).map_err(|_| Error::ReadResourceObjectBuf)?;
        host.read_resource(ResourceIndex::KernelVblock, 0, buf)?;

        let (block, signature_ok) = match verify_keyblock(buf, &key, &mut scratch) {
            Ok(block) => (block, true),
            Err(e) if need_signed => return Err(e),
            Err(_) => (verify_keyblock_hash(buf, &mut scratch)?, false),
        };
        unpack_key(legacy_data_key(buf, &block))?;
        (block, signature_ok, packed_key_extent(&block.data_key))
    };

    let mut signed = signature_ok;
    if !signature_ok {
        log_warn!(ctx.log, ts, MODULE, "key block signature invalid; accepted on checksum");
    }

    let dev_flag = if developer {
        keyblock_flags::DEVELOPER_1
    } else {
        keyblock_flags::DEVELOPER_0
    };
    if block.keyblock_flags & dev_flag == 0 {
        signed = false;
        if need_signed {
            return Err(Error::KernelKeyblockDevFlag);
        }
        log_warn!(ctx.log, ts, MODULE, "key block developer flag mismatch");
    }

    let rec_flag = if recovery {
        keyblock_flags::RECOVERY_1
    } else {
        keyblock_flags::RECOVERY_0
    };
    if block.keyblock_flags & rec_flag == 0 {
        signed = false;
        if need_signed {
            return Err(Error::KernelKeyblockRecFlag);
        }
        log_warn!(ctx.log, ts, MODULE, "key block recovery flag mismatch");
    }

    let key_version = block.data_key.key_version;
    if !recovery {
        if let Err(e) = check_key_version(ImageKind::Kernel, key_version, ctx.shared.kernel_version_secdata) {
            signed = false;
            if need_signed {
                return Err(e);
            }
            log_warn!(ctx.log, ts, MODULE, "ignoring key version check: {}", e.description());
        }
    }

    ctx.shared.kernel_version = key_version << 16;
    if signed {
        ctx.shared.flags |= shared_flags::KERNEL_SIGNED;
    } else {
        ctx.shared.flags &= !shared_flags::KERNEL_SIGNED;
    }
    ctx.shared.vblock_preamble_offset = block.keyblock_size;

    ctx.shared.data_key = ctx.keep(used + Keyblock::DATA_KEY_OFFSET, key_size, key_region.offset)?;
    ctx.shared.kernel_key = WorkbufRegion::EMPTY;

    log_debug!(ctx.log, ts, MODULE, "key block loaded, key version {}, signed {}", key_version, signed);
    Ok(())
}

/// Load and verify the kernel preamble
///
/// The version range is always checked. Rollback is enforced only when a
/// signed kernel is required, and never in recovery mode.
///
/// # Errors
///
/// - [`Error::KernelPreambleDataKey`] if no data key is loaded
/// - [`Error::ReadResourceObjectBuf`], host read and preamble errors
/// - [`Error::KernelPreambleVersionRange`] /
///   [`Error::KernelPreambleVersionRollback`]
pub fn load_kernel_preamble<H: BootHost + ?Sized>(ctx: &mut Context<'_>, host: &mut H) -> Result<()> {
    let ts = host.timestamp();
    let key_region = ctx.shared.data_key;
    if key_region.is_empty() {
        return Err(Error::KernelPreambleDataKey);
    }
    let used = ctx.workbuf_used();
    let vblock_offset = ctx.shared.vblock_preamble_offset;

    let size = read_legacy_size(host, ResourceIndex::KernelVblock, vblock_offset, PREAMBLE_SIZE_OFFSET)?;

    let kernel_version = {
        let (head, mut wb) = ctx.split_workbuf();
        let key_bytes = head
            .get(key_region.offset..key_region.offset + key_region.size)
            .ok_or(Error::KernelPreambleDataKey)?;
        let key = unpack_key(key_bytes)?;

        let (buf, mut scratch) = wb.split_alloc(size).map_err(|_| Error::ReadResourceObjectBuf)?;
        host.read_resource(ResourceIndex::KernelVblock, vblock_offset, buf)?;
        verify_kernel_preamble(buf, &key, &mut scratch)?.kernel_version
    };

    let combined = combine_version(ImageKind::Kernel, ctx.shared.kernel_version, kernel_version)?;
    ctx.shared.kernel_version = combined;
    if need_signed_kernel(ctx) && !ctx.has_flag(context_flags::RECOVERY_MODE) {
        check_combined_version(ImageKind::Kernel, combined, ctx.shared.kernel_version_secdata)?;
    }

    ctx.shared.preamble = ctx.keep(used, size, used)?;
    ctx.shared.preamble_format = WireFormat::Legacy;

    log_info!(ctx.log, ts, MODULE, "kernel preamble verified, version {}", Version::from_combined(combined));
    Ok(())
}

/// Verify the kernel body against the loaded preamble
///
/// # Errors
///
/// - [`Error::KernelDataPreamble`] if no kernel preamble is loaded
/// - [`Error::KernelDataSize`] if `data` is not exactly the signed size
/// - [`Error::KernelDataKey`] if no data key is loaded
/// - key unpacking and signature verification errors
pub fn verify_kernel_data(ctx: &mut Context<'_>, data: &[u8]) -> Result<()> {
    let pre_region = ctx.shared.preamble;
    let key_region = ctx.shared.data_key;
    let (head, mut wb) = ctx.split_workbuf();

    let pre_bytes = head
        .get(pre_region.offset..pre_region.offset + pre_region.size)
        .filter(|b| !b.is_empty())
        .ok_or(Error::KernelDataPreamble)?;
    let pre = KernelPreamble::read_partial(pre_bytes);
    let body_sig = pre.body_signature;
    if data.len() != body_sig.data_size as usize {
        return Err(Error::KernelDataSize);
    }

    let key_bytes = head
        .get(key_region.offset..key_region.offset + key_region.size)
        .filter(|b| !b.is_empty())
        .ok_or(Error::KernelDataKey)?;
    let key = unpack_key(key_bytes)?;

    let sig_data = kernel_body_sig_data(pre_bytes, &pre)?;
    verify_legacy_data(data, &body_sig, sig_data, &key, &mut wb)
}

/// Finish kernel verification
///
/// Rolls the stored kernel version forward for a signed kernel outside
/// recovery mode.
pub fn kernel_phase3<H: BootHost + ?Sized>(ctx: &mut Context<'_>, host: &H) {
    let ts = host.timestamp();
    if ctx.shared.flags & shared_flags::KERNEL_SIGNED != 0 && !ctx.has_flag(context_flags::RECOVERY_MODE) {
        roll_forward_kernel(ctx, ts);
    }
}
