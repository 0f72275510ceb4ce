// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Key block verification
//!
//! A key block carries a data key and is signed by its parent key. The
//! legacy layout also carries a SHA-512 checksum of the same range, which
//! developer-mode kernels may be verified against instead of a signature.

use vb_common::{Error, HashAlgorithm, Result, WorkBuf};
use vb_crypto::{constant_time_eq, digest_buffer};
use zerocopy::FromBytes;

use crate::common::{parse_common, verify_common_subobject};
use crate::key::PublicKey;
use crate::signature::{
    legacy_sig_data, v21_sig_data, verify_data, verify_legacy_data, verify_packed_key_inside,
    verify_signature, verify_signature_inside,
};
use crate::wire::{Keyblock, Signature, V21Keyblock, KEYBLOCK_MAGIC, KEYBLOCK_VERSION_MAJOR};

// ============================================================================
// Legacy Key Blocks
// ============================================================================

/// Containment checks shared by both legacy verifiers, up to the point
/// where the signature itself is checked
fn check_layout(buf: &[u8], sig_offset: usize) -> Result<(Keyblock, Signature)> {
    let (block, _) = Keyblock::read_from_prefix(buf).map_err(|_| Error::KeyblockTooSmallForHeader)?;

    if block.magic != KEYBLOCK_MAGIC {
        return Err(Error::KeyblockMagic);
    }
    if block.header_version_major != KEYBLOCK_VERSION_MAJOR {
        return Err(Error::KeyblockHeaderVersion);
    }
    if buf.len() < block.keyblock_size as usize {
        return Err(Error::KeyblockSize);
    }

    let sig = if sig_offset == Keyblock::HASH_OFFSET {
        block.keyblock_hash
    } else {
        block.keyblock_signature
    };
    verify_signature_inside(block.keyblock_size, sig_offset, &sig)
        .map_err(|_| Error::KeyblockSigOutside)?;

    if block.keyblock_size < sig.data_size {
        return Err(Error::KeyblockSignedTooMuch);
    }

    verify_packed_key_inside(block.keyblock_size, Keyblock::DATA_KEY_OFFSET, &block.data_key)
        .map_err(|_| Error::KeyblockDataKeyOutside)?;

    Ok((block, sig))
}

/// Checks on the signed range once the signature is known good
fn check_signed_range(block: &Keyblock, sig: &Signature) -> Result<()> {
    if (sig.data_size as usize) < Keyblock::SIZE {
        return Err(Error::KeyblockSignedTooLittle);
    }
    verify_packed_key_inside(sig.data_size, Keyblock::DATA_KEY_OFFSET, &block.data_key)
        .map_err(|_| Error::KeyblockDataKeyOutside)
}

/// Verify a legacy key block signed by `key`
///
/// # Errors
///
/// In order: [`Error::KeyblockTooSmallForHeader`], [`Error::KeyblockMagic`],
/// [`Error::KeyblockHeaderVersion`], [`Error::KeyblockSize`],
/// [`Error::KeyblockSigOutside`], [`Error::KeyblockSignedTooMuch`],
/// [`Error::KeyblockDataKeyOutside`], [`Error::KeyblockSigInvalid`],
/// [`Error::KeyblockSignedTooLittle`], and [`Error::KeyblockDataKeyOutside`]
/// if the data key is not covered by the signature.
pub fn verify_keyblock(buf: &[u8], key: &PublicKey<'_>, wb: &mut WorkBuf<'_>) -> Result<Keyblock> {
    let (block, sig) = check_layout(buf, Keyblock::SIGNATURE_OFFSET)?;

    let sig_data = legacy_sig_data(buf, Keyblock::SIGNATURE_OFFSET, &sig)
        .map_err(|_| Error::KeyblockSigOutside)?;
    verify_legacy_data(buf, &sig, sig_data, key, wb).map_err(|_| Error::KeyblockSigInvalid)?;

    check_signed_range(&block, &sig)?;
    Ok(block)
}

/// Verify a legacy key block against its embedded SHA-512 checksum
///
/// This proves only that the block is intact, not who made it.
///
/// # Errors
///
/// The same as [`verify_keyblock`], with [`Error::KeyblockSigInvalid`] for
/// a checksum mismatch and [`Error::WorkbufTooSmall`] if the digest does
/// not fit.
pub fn verify_keyblock_hash(buf: &[u8], wb: &mut WorkBuf<'_>) -> Result<Keyblock> {
    let (block, sig) = check_layout(buf, Keyblock::HASH_OFFSET)?;

    let digest_size = HashAlgorithm::Sha512.digest_size();
    if sig.sig_size as usize != digest_size {
        return Err(Error::KeyblockSigInvalid);
    }
    let expected = legacy_sig_data(buf, Keyblock::HASH_OFFSET, &sig)
        .map_err(|_| Error::KeyblockSigOutside)?;
    let signed = buf
        .get(..sig.data_size as usize)
        .ok_or(Error::KeyblockSignedTooMuch)?;

    let mut scope = wb.scope();
    let digest = scope.alloc(digest_size)?;
    digest_buffer(HashAlgorithm::Sha512, signed, digest)?;
    if !constant_time_eq(digest, expected) {
        return Err(Error::KeyblockSigInvalid);
    }

    check_signed_range(&block, &sig)?;
    Ok(block)
}

/// Packed data key bytes of a verified legacy key block
///
/// The slice starts at the packed key header, so it can be handed straight
/// to [`crate::key::unpack_key`].
#[must_use]
pub fn legacy_data_key<'a>(buf: &'a [u8], block: &Keyblock) -> &'a [u8] {
    let end = (block.keyblock_size as usize).min(buf.len());
    buf.get(Keyblock::DATA_KEY_OFFSET..end).unwrap_or_default()
}

// ============================================================================
// v2.1 Key Blocks
// ============================================================================

/// Verify a v2.1 key block
///
/// The block may carry several signatures; the first whose id matches
/// `key` must verify. Signatures by other keys are still checked for
/// integrity.
///
/// # Errors
///
/// In order: [`Error::KeyblockMagic`], common header errors,
/// [`Error::KeyblockHeaderVersion`], [`Error::KeyblockSize`], data key
/// sub-object errors, per-signature sub-object and integrity errors,
/// [`Error::KeyblockSignedSize`], `verify_data` errors, and
/// [`Error::KeyblockSigId`] if no signature was made by `key`.
pub fn verify_v21_keyblock(buf: &[u8], key: &PublicKey<'_>, wb: &mut WorkBuf<'_>) -> Result<V21Keyblock> {
    let (block, hdr) = parse_common::<V21Keyblock>(buf)?;
    let bytes = &buf[..hdr.total_size as usize];

    let mut min_offset = 0;
    verify_common_subobject(bytes, &hdr, &mut min_offset, block.key_offset)?;

    let mut sig_offset = block.sig_offset;
    for _ in 0..block.sig_count {
        verify_common_subobject(bytes, &hdr, &mut min_offset, sig_offset)?;

        let sig_buf = &bytes[sig_offset as usize..];
        let sig = verify_signature(sig_buf)?;

        if key.id != Some(sig.key_id()) {
            sig_offset = min_offset;
            continue;
        }

        if sig.data_size != block.sig_offset {
            return Err(Error::KeyblockSignedSize);
        }

        let signed = bytes
            .get(..block.sig_offset as usize)
            .ok_or(Error::KeyblockSignedSize)?;
        let sig_data = v21_sig_data(sig_buf, &sig)?;
        verify_data(signed, &sig, sig_data, key, wb)?;
        return Ok(block);
    }

    Err(Error::KeyblockSigId)
}

/// Packed data key bytes of a verified v2.1 key block
#[must_use]
pub fn v21_data_key<'a>(buf: &'a [u8], block: &V21Keyblock) -> &'a [u8] {
    let end = (block.c.total_size as usize).min(buf.len());
    buf.get(block.key_offset as usize..end).unwrap_or_default()
}
