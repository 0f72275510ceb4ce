// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Preamble verification
//!
//! A preamble is signed by the data key from the key block in front of it
//! and describes the body that follows: its version, where the body's
//! signature (or hashes) live and, for firmware, the key that signs kernels.

use vb_common::{Error, KeyId, Result, SignatureAlgorithm, WorkBuf};
use zerocopy::FromBytes;

use crate::bounds::absolute_range_inside;
use crate::common::{parse_common, verify_common_subobject};
use crate::key::PublicKey;
use crate::signature::{
    legacy_sig_data, v21_sig_data, verify_data, verify_legacy_data, verify_packed_key_inside,
    verify_signature, verify_signature_inside,
};
use crate::wire::{
    FwPreamble, KernelPreamble, Signature, V21FwPreamble, V21Signature, FW_PREAMBLE_VERSION_MAJOR,
    KERNEL_PREAMBLE_VERSION_MAJOR,
};

// ============================================================================
// Legacy Preambles
// ============================================================================

/// Checks shared by firmware and kernel preambles once the header has been
/// read: the preamble fits, its signature is inside it and verifies, and
/// the signature covers at least `min_signed` bytes.
fn check_signed_preamble(
    buf: &[u8],
    preamble_size: u32,
    sig: &Signature,
    sig_offset: usize,
    min_signed: usize,
    key: &PublicKey<'_>,
    wb: &mut WorkBuf<'_>,
) -> Result<()> {
    if buf.len() < preamble_size as usize {
        return Err(Error::PreambleSize);
    }

    verify_signature_inside(preamble_size, sig_offset, sig).map_err(|_| Error::PreambleSigOutside)?;

    if preamble_size < sig.data_size {
        return Err(Error::PreambleSignedTooMuch);
    }

    let sig_data = legacy_sig_data(buf, sig_offset, sig).map_err(|_| Error::PreambleSigOutside)?;
    verify_legacy_data(buf, sig, sig_data, key, wb).map_err(|_| Error::PreambleSigInvalid)?;

    if (sig.data_size as usize) < min_signed {
        return Err(Error::PreambleSignedTooLittle);
    }
    Ok(())
}

/// Verify a legacy firmware preamble signed by `key`
///
/// # Errors
///
/// In order: [`Error::PreambleTooSmallForHeader`],
/// [`Error::PreambleHeaderVersion`], [`Error::PreambleHeaderOld`],
/// [`Error::PreambleSize`], [`Error::PreambleSigOutside`],
/// [`Error::PreambleSignedTooMuch`], [`Error::PreambleSigInvalid`],
/// [`Error::PreambleSignedTooLittle`], [`Error::PreambleBodySigOutside`],
/// [`Error::PreambleKernelSubkeyOutside`].
pub fn verify_fw_preamble(buf: &[u8], key: &PublicKey<'_>, wb: &mut WorkBuf<'_>) -> Result<FwPreamble> {
    let (pre, _) = FwPreamble::read_from_prefix(buf).map_err(|_| Error::PreambleTooSmallForHeader)?;

    if pre.header_version_major != FW_PREAMBLE_VERSION_MAJOR {
        return Err(Error::PreambleHeaderVersion);
    }
    if pre.header_version_minor < 1 {
        return Err(Error::PreambleHeaderOld);
    }

    let sig = pre.preamble_signature;
    check_signed_preamble(
        buf,
        pre.preamble_size,
        &sig,
        FwPreamble::SIGNATURE_OFFSET,
        FwPreamble::SIZE,
        key,
        wb,
    )?;

    verify_signature_inside(sig.data_size, FwPreamble::BODY_SIGNATURE_OFFSET, &pre.body_signature)
        .map_err(|_| Error::PreambleBodySigOutside)?;
    verify_packed_key_inside(sig.data_size, FwPreamble::KERNEL_SUBKEY_OFFSET, &pre.kernel_subkey)
        .map_err(|_| Error::PreambleKernelSubkeyOutside)?;

    Ok(pre)
}

/// Packed kernel subkey bytes of a verified firmware preamble
#[must_use]
pub fn kernel_subkey<'a>(buf: &'a [u8], pre: &FwPreamble) -> &'a [u8] {
    let start = FwPreamble::KERNEL_SUBKEY_OFFSET;
    let end = start
        .saturating_add(pre.kernel_subkey.key_offset as usize)
        .saturating_add(pre.kernel_subkey.key_size as usize);
    buf.get(start..end).unwrap_or_default()
}

/// Verify a legacy kernel preamble signed by `key`
///
/// Minor versions 0, 1 and 2 are accepted; each needs a declared size
/// large enough for its fields, and the signature must cover that header.
/// A zero-size bootloader or vmlinuz header is not checked against the
/// body.
///
/// # Errors
///
/// The firmware preamble errors except [`Error::PreambleHeaderOld`] and
/// [`Error::PreambleKernelSubkeyOutside`], then
/// [`Error::PreambleBootloaderOutside`] and
/// [`Error::PreambleVmlinuzHeaderOutside`].
pub fn verify_kernel_preamble(
    buf: &[u8],
    key: &PublicKey<'_>,
    wb: &mut WorkBuf<'_>,
) -> Result<KernelPreamble> {
    if buf.len() < KernelPreamble::SIZE_2_0 {
        return Err(Error::PreambleTooSmallForHeader);
    }
    let pre = KernelPreamble::read_partial(buf);

    if pre.header_version_major != KERNEL_PREAMBLE_VERSION_MAJOR {
        return Err(Error::PreambleHeaderVersion);
    }
    // Fields past the 2.0 header are only trusted once the declared size
    // covers them and the buffer covers the declared size.
    let min_size = KernelPreamble::min_size(pre.header_version_minor);
    if (pre.preamble_size as usize) < min_size {
        return Err(Error::PreambleTooSmallForHeader);
    }

    let sig = pre.preamble_signature;
    check_signed_preamble(
        buf,
        pre.preamble_size,
        &sig,
        KernelPreamble::SIGNATURE_OFFSET,
        min_size,
        key,
        wb,
    )?;

    let body_sig = pre.body_signature;
    verify_signature_inside(sig.data_size, KernelPreamble::BODY_SIGNATURE_OFFSET, &body_sig)
        .map_err(|_| Error::PreambleBodySigOutside)?;

    let body_start = pre.body_load_address();
    let body_size = u64::from(body_sig.data_size);
    if pre.bootloader_size != 0
        && !absolute_range_inside(
            body_start,
            body_size,
            pre.bootloader_address(),
            u64::from(pre.bootloader_size),
        )
    {
        return Err(Error::PreambleBootloaderOutside);
    }

    let (vmlinuz_address, vmlinuz_size) = pre.vmlinuz_header();
    if vmlinuz_size != 0
        && !absolute_range_inside(body_start, body_size, vmlinuz_address, u64::from(vmlinuz_size))
    {
        return Err(Error::PreambleVmlinuzHeaderOutside);
    }

    Ok(pre)
}

/// Body signature bytes of a verified kernel preamble
///
/// # Errors
///
/// [`Error::InsideDataOutside`] if the bytes are not in `buf`.
pub fn kernel_body_sig_data<'a>(buf: &'a [u8], pre: &KernelPreamble) -> Result<&'a [u8]> {
    legacy_sig_data(buf, KernelPreamble::BODY_SIGNATURE_OFFSET, &pre.body_signature)
}

/// Body signature bytes of a verified firmware preamble
///
/// # Errors
///
/// [`Error::InsideDataOutside`] if the bytes are not in `buf`.
pub fn fw_body_sig_data<'a>(buf: &'a [u8], pre: &FwPreamble) -> Result<&'a [u8]> {
    legacy_sig_data(buf, FwPreamble::BODY_SIGNATURE_OFFSET, &pre.body_signature)
}

// ============================================================================
// v2.1 Firmware Preambles
// ============================================================================

/// Verify a v2.1 firmware preamble signed by `key`
///
/// Every body hash must be a well-formed, unsigned hash.
///
/// # Errors
///
/// In order: [`Error::PreambleMagic`], common header errors,
/// [`Error::PreambleHeaderVersion`], [`Error::PreambleSize`], per-hash
/// sub-object and integrity errors, [`Error::PreambleHashSigned`],
/// signature sub-object and integrity errors, `verify_data` errors.
pub fn verify_v21_fw_preamble(
    buf: &[u8],
    key: &PublicKey<'_>,
    wb: &mut WorkBuf<'_>,
) -> Result<V21FwPreamble> {
    let (pre, hdr) = parse_common::<V21FwPreamble>(buf)?;
    let bytes = &buf[..hdr.total_size as usize];

    let mut min_offset = 0;
    let mut hash_offset = pre.hash_offset;
    for _ in 0..pre.hash_count {
        verify_common_subobject(bytes, &hdr, &mut min_offset, hash_offset)?;
        let hash = verify_signature(&bytes[hash_offset as usize..])?;
        if hash.sig_alg != SignatureAlgorithm::None.as_raw() {
            return Err(Error::PreambleHashSigned);
        }
        hash_offset = min_offset;
    }

    verify_common_subobject(bytes, &hdr, &mut min_offset, pre.sig_offset)?;
    let sig_buf = &bytes[pre.sig_offset as usize..];
    let sig = verify_signature(sig_buf)?;
    let sig_data = v21_sig_data(sig_buf, &sig)?;

    let signed = bytes.get(..pre.sig_offset as usize).ok_or(Error::VdataSize)?;
    verify_data(signed, &sig, sig_data, key, wb)?;

    Ok(pre)
}

/// Find the body hash made for `id` in a verified v2.1 preamble
///
/// Returns the hash header and its digest bytes.
#[must_use]
pub fn find_v21_hash<'a>(
    buf: &'a [u8],
    pre: &V21FwPreamble,
    id: &KeyId,
) -> Option<(V21Signature, &'a [u8])> {
    let bytes = buf.get(..pre.c.total_size as usize)?;
    let mut min_offset = 0;
    let mut hash_offset = pre.hash_offset;
    for _ in 0..pre.hash_count {
        verify_common_subobject(bytes, &pre.c, &mut min_offset, hash_offset).ok()?;
        let hash_buf = &bytes[hash_offset as usize..];
        let (hash, _) = V21Signature::read_from_prefix(hash_buf).ok()?;
        if hash.key_id() == *id {
            let digest = v21_sig_data(hash_buf, &hash).ok()?;
            return Some((hash, digest));
        }
        hash_offset = min_offset;
    }
    None
}
