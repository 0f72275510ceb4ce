// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Boot phase API
//!
//! Firmware calls these in order:
//!
//! 1. [`fw_phase1`]: GBB, developer switch and recovery decision
//! 2. [`fw_phase2`]: TPM clear request and slot selection
//! 3. [`fw_phase3`]: firmware key block and preamble of the chosen slot
//! 4. [`init_hash`] or [`init_hash_by_id`], [`extend_hash`] per chunk of
//!    the firmware body, then [`check_hash`]
//!
//! Any error from phase 3 onward means the slot is bad; the caller records
//! it with [`fail`](crate::recovery::fail) (phase 3 does so itself) and
//! reboots.

use vb_common::{log_debug, log_info, Error, HashAlgorithm, KeyId, Result};
use vb_crypto::{constant_time_eq, StreamingDigest};
use zerocopy::FromBytes;

use crate::context::{context_flags, Context, HashTag};
use crate::firmware::{load_fw_keyblock, load_fw_preamble};
use crate::gbb::read_gbb_header;
use crate::host::BootHost;
use crate::key::unpack_key;
use crate::preamble::{find_v21_hash, fw_body_sig_data};
use crate::recovery::{check_dev_switch, check_recovery, check_tpm_clear, fail_with, select_fw_slot, RecoveryReason};
use crate::signature::verify_legacy_digest;
use crate::wire::{preamble_flags, FwPreamble, V21FwPreamble, WireFormat};

const MODULE: &str = "api";

// ============================================================================
// Firmware Phases
// ============================================================================

/// Read the GBB, decide developer and recovery mode
///
/// # Errors
///
/// [`Error::ApiPhase1Recovery`] when this boot must go to recovery. The
/// caller should then boot the recovery path with `RECOVERY_MODE` set.
/// GBB and developer switch failures end up here too, after recovery has
/// been requested for them.
pub fn fw_phase1<H: BootHost + ?Sized>(ctx: &mut Context<'_>, host: &mut H) -> Result<()> {
    let ts = host.timestamp();

    if let Err(e) = read_gbb_header(ctx, host) {
        fail_with(ctx, ts, RecoveryReason::GbbHeader, e);
    } else if let Err(e) = check_dev_switch(ctx, host) {
        fail_with(ctx, ts, RecoveryReason::DevSwitch, e);
    }

    ctx.shared.fw_version_secdata = ctx.secdata().fw_versions;
    ctx.shared.kernel_version_secdata = ctx.secdata().kernel_versions;

    // A failure above left its reason in NV data; pick it up now.
    check_recovery(ctx, ts);

    if ctx.has_flag(context_flags::RECOVERY_MODE) {
        ctx.flags |= context_flags::CLEAR_RAM;
        return Err(Error::ApiPhase1Recovery);
    }
    Ok(())
}

/// Handle a TPM clear request and choose the firmware slot
///
/// # Errors
///
/// The host's TPM error; recovery has already been requested.
pub fn fw_phase2<H: BootHost + ?Sized>(ctx: &mut Context<'_>, host: &mut H) -> Result<()> {
    let ts = host.timestamp();

    if ctx.has_flag(context_flags::DEVELOPER_MODE) {
        ctx.flags |= context_flags::CLEAR_RAM;
    }

    check_tpm_clear(ctx, host)?;
    select_fw_slot(ctx, ts);
    Ok(())
}

/// Verify the chosen slot's key block and preamble
///
/// # Errors
///
/// Any key block or preamble error. The failure has been charged to the
/// slot with [`RecoveryReason::RoInvalidRw`].
pub fn fw_phase3<H: BootHost + ?Sized>(ctx: &mut Context<'_>, host: &mut H) -> Result<()> {
    let ts = host.timestamp();
    let result = load_fw_keyblock(ctx, host).and_then(|()| load_fw_preamble(ctx, host));
    if let Err(e) = result {
        fail_with(ctx, ts, RecoveryReason::RoInvalidRw, e);
        return Err(e);
    }
    Ok(())
}

// ============================================================================
// Body Hashing
// ============================================================================

/// Start hashing the firmware body described by a legacy preamble
///
/// Returns the number of bytes the caller must feed to [`extend_hash`].
///
/// # Errors
///
/// - [`Error::ApiInitHashPreamble`] if no legacy preamble is loaded
/// - [`Error::ApiInitHashTag`] for any tag but [`HashTag::FirmwareBody`]
/// - [`Error::ApiInitHashDataKey`] if the data key is gone
/// - key unpacking and digest start errors
pub fn init_hash<H: BootHost + ?Sized>(ctx: &mut Context<'_>, host: &mut H, tag: HashTag) -> Result<u32> {
    let ts = host.timestamp();
    if ctx.shared.preamble_format != WireFormat::Legacy {
        return Err(Error::ApiInitHashPreamble);
    }
    let pre_bytes = ctx.stored(ctx.shared.preamble).ok_or(Error::ApiInitHashPreamble)?;
    let (pre, _) = FwPreamble::read_from_prefix(pre_bytes).map_err(|_| Error::ApiInitHashPreamble)?;

    if tag != HashTag::FirmwareBody {
        return Err(Error::ApiInitHashTag);
    }

    let key_bytes = ctx.stored(ctx.shared.data_key).ok_or(Error::ApiInitHashDataKey)?;
    let hash_alg = unpack_key(key_bytes)?.hash_alg;

    let allow_hw = ctx.config.allow_hwcrypto && pre.flags() & preamble_flags::DISALLOW_HWCRYPTO == 0;
    let size = pre.body_signature.data_size;
    let digest = StreamingDigest::start(host, allow_hw, hash_alg, size)?;

    log_debug!(
        ctx.log,
        ts,
        MODULE,
        "hashing {} body bytes with {} in {}",
        size,
        hash_alg.name(),
        if digest.is_hardware() { "hardware" } else { "software" }
    );

    ctx.digest = Some(digest);
    ctx.shared.hash_tag = tag;
    ctx.shared.hash_remaining_size = size;
    Ok(size)
}

/// Start hashing the firmware body hash made for key `id`
///
/// Returns the number of bytes the caller must feed to [`extend_hash`].
///
/// # Errors
///
/// - [`Error::ApiInitHashPreamble`] if no v2.1 preamble is loaded
/// - [`Error::ApiInitHashId`] if the preamble has no hash for `id`
/// - digest start errors
pub fn init_hash_by_id<H: BootHost + ?Sized>(ctx: &mut Context<'_>, host: &mut H, id: &KeyId) -> Result<u32> {
    let ts = host.timestamp();
    if ctx.shared.preamble_format != WireFormat::V21 {
        return Err(Error::ApiInitHashPreamble);
    }
    let pre_bytes = ctx.stored(ctx.shared.preamble).ok_or(Error::ApiInitHashPreamble)?;
    let (pre, _) = V21FwPreamble::read_from_prefix(pre_bytes).map_err(|_| Error::ApiInitHashPreamble)?;
    let (hash, _) = find_v21_hash(pre_bytes, &pre, id).ok_or(Error::ApiInitHashId)?;

    let hash_alg = HashAlgorithm::from_raw(u32::from(hash.hash_alg)).ok_or(Error::ApiInitHashId)?;
    let allow_hw = ctx.config.allow_hwcrypto && pre.flags & preamble_flags::DISALLOW_HWCRYPTO == 0;
    let size = hash.data_size;
    let digest = StreamingDigest::start(host, allow_hw, hash_alg, size)?;

    log_debug!(
        ctx.log,
        ts,
        MODULE,
        "hashing {} body bytes by id with {}",
        size,
        hash_alg.name()
    );

    ctx.digest = Some(digest);
    ctx.shared.hash_tag = HashTag::Id(*id);
    ctx.shared.hash_remaining_size = size;
    Ok(size)
}

/// Feed the next chunk of the body
///
/// # Errors
///
/// - [`Error::ApiExtendHashWorkbuf`] if no hash was started
/// - [`Error::ApiExtendHashSize`] if `data` runs past the signed size
/// - host errors when hashing in hardware
pub fn extend_hash<H: BootHost + ?Sized>(ctx: &mut Context<'_>, host: &mut H, data: &[u8]) -> Result<()> {
    let remaining = ctx.shared.hash_remaining_size;
    let digest = ctx.digest.as_mut().ok_or(Error::ApiExtendHashWorkbuf)?;
    let len = u32::try_from(data.len())
        .ok()
        .filter(|&len| len <= remaining)
        .ok_or(Error::ApiExtendHashSize)?;

    digest.extend(host, data)?;
    ctx.shared.hash_remaining_size = remaining - len;
    Ok(())
}

/// Finish the body hash and check it against the preamble
///
/// The hash is consumed even on failure; a new one needs another
/// `init_hash` call.
///
/// # Errors
///
/// In order: [`Error::ApiCheckHashPreamble`],
/// [`Error::ApiCheckHashWorkbuf`], [`Error::ApiCheckHashSize`],
/// [`Error::ApiCheckHashWorkbufDigest`], digest errors,
/// [`Error::ApiCheckHashTag`], then for a legacy preamble
/// [`Error::ApiCheckHashDataKey`] or an RSA failure, and for a v2.1
/// preamble [`Error::ApiCheckHashSig`].
pub fn check_hash<H: BootHost + ?Sized>(ctx: &mut Context<'_>, host: &mut H) -> Result<()> {
    let ts = host.timestamp();
    let pre_region = ctx.shared.preamble;
    let key_region = ctx.shared.data_key;
    let format = ctx.shared.preamble_format;
    let tag = ctx.shared.hash_tag;

    if pre_region.is_empty() {
        return Err(Error::ApiCheckHashPreamble);
    }
    let digest = ctx.digest.take().ok_or(Error::ApiCheckHashWorkbuf)?;
    if ctx.shared.hash_remaining_size != 0 {
        return Err(Error::ApiCheckHashSize);
    }
    ctx.shared.hash_tag = HashTag::Invalid;

    let (head, mut wb) = ctx.split_workbuf();
    let digest_size = digest.algorithm().digest_size();
    let (out, mut scratch) = wb
        .split_alloc(digest_size)
        .map_err(|_| Error::ApiCheckHashWorkbufDigest)?;
    let size = digest.finalize(host, out)?;
    let computed = &out[..size];

    let pre_bytes = head
        .get(pre_region.offset..pre_region.offset + pre_region.size)
        .ok_or(Error::ApiCheckHashPreamble)?;

    let result = match (format, tag) {
        (WireFormat::Legacy, HashTag::FirmwareBody) => {
            let (pre, _) = FwPreamble::read_from_prefix(pre_bytes).map_err(|_| Error::ApiCheckHashPreamble)?;
            let key_bytes = head
                .get(key_region.offset..key_region.offset + key_region.size)
                .filter(|b| !b.is_empty())
                .ok_or(Error::ApiCheckHashDataKey)?;
            let key = unpack_key(key_bytes)?;
            let body_sig = pre.body_signature;
            let sig_data = fw_body_sig_data(pre_bytes, &pre)?;
            verify_legacy_digest(&key, &body_sig, sig_data, computed, &mut scratch)
        }
        (WireFormat::V21, HashTag::Id(id)) => {
            let (pre, _) =
                V21FwPreamble::read_from_prefix(pre_bytes).map_err(|_| Error::ApiCheckHashPreamble)?;
            match find_v21_hash(pre_bytes, &pre, &id) {
                Some((_, expected)) if constant_time_eq(expected, computed) => Ok(()),
                _ => Err(Error::ApiCheckHashSig),
            }
        }
        _ => return Err(Error::ApiCheckHashTag),
    };

    if result.is_ok() {
        log_info!(ctx.log, ts, MODULE, "firmware body verified");
    }
    result
}
