// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Signature and signed-data verification
//!
//! The digest of the signed range is computed into the work buffer and
//! kept there while the RSA step borrows the rest of the buffer as scratch.

use vb_common::{Error, HashAlgorithm, Result, SignatureAlgorithm, WorkBuf};
use vb_crypto::{constant_time_eq, digest_buffer, rsa};

use crate::bounds::{sub_slice, verify_member_inside};
use crate::common::{parse_common, verify_common_member};
use crate::key::PublicKey;
use crate::wire::{PackedKey, Signature, V21Signature};

// ============================================================================
// Legacy Signatures
// ============================================================================

/// Verify that a legacy signature at `member_offset` and its data lie in
/// the first `parent_size` bytes of the parent
///
/// # Errors
///
/// Any `Inside*` error.
pub fn verify_signature_inside(parent_size: u32, member_offset: usize, sig: &Signature) -> Result<()> {
    verify_member_inside(
        u64::from(parent_size),
        member_offset as u64,
        Signature::SIZE as u64,
        u64::from(sig.sig_offset),
        u64::from(sig.sig_size),
    )
}

/// Verify that a legacy packed key at `member_offset` and its data lie in
/// the first `parent_size` bytes of the parent
///
/// # Errors
///
/// Any `Inside*` error.
pub fn verify_packed_key_inside(
    parent_size: u32,
    member_offset: usize,
    key: &PackedKey,
) -> Result<()> {
    verify_member_inside(
        u64::from(parent_size),
        member_offset as u64,
        PackedKey::SIZE as u64,
        u64::from(key.key_offset),
        u64::from(key.key_size),
    )
}

/// Signature bytes of a legacy signature embedded at `member_offset`
///
/// # Errors
///
/// [`Error::InsideDataOutside`] if the bytes are not in `parent`.
pub fn legacy_sig_data<'a>(parent: &'a [u8], member_offset: usize, sig: &Signature) -> Result<&'a [u8]> {
    let start = u32::try_from(member_offset)
        .ok()
        .and_then(|m| m.checked_add(sig.sig_offset))
        .ok_or(Error::InsideDataOutside)?;
    sub_slice(parent, start, sig.sig_size, Error::InsideDataOutside)
}

/// Verify a legacy signature over the front of `data`
///
/// The signature covers `data[..sig.data_size]`.
///
/// # Errors
///
/// [`Error::VdataAlgorithm`] if the key has no legacy algorithm,
/// [`Error::VdataSigSize`], [`Error::VdataNotEnoughData`],
/// [`Error::VdataWorkbufDigest`], or an RSA failure.
pub fn verify_legacy_data(
    data: &[u8],
    sig: &Signature,
    sig_data: &[u8],
    key: &PublicKey<'_>,
    wb: &mut WorkBuf<'_>,
) -> Result<()> {
    if key.algorithm().is_none() {
        return Err(Error::VdataAlgorithm);
    }
    if sig.sig_size as usize != key.sig_alg.rsa_sig_size() {
        return Err(Error::VdataSigSize);
    }
    let signed = data
        .get(..sig.data_size as usize)
        .ok_or(Error::VdataNotEnoughData)?;

    let (digest, mut rest) = wb
        .split_alloc(key.hash_alg.digest_size())
        .map_err(|_| Error::VdataWorkbufDigest)?;
    digest_buffer(key.hash_alg, signed, digest)?;

    check_digest(key, sig_data, digest, &mut rest)
}

/// Check a digest computed elsewhere against a legacy signature
///
/// # Errors
///
/// [`Error::VdataAlgorithm`], [`Error::VdataSigSize`], or an RSA failure.
pub fn verify_legacy_digest(
    key: &PublicKey<'_>,
    sig: &Signature,
    sig_data: &[u8],
    digest: &[u8],
    wb: &mut WorkBuf<'_>,
) -> Result<()> {
    if key.algorithm().is_none() {
        return Err(Error::VdataAlgorithm);
    }
    if sig.sig_size as usize != key.sig_alg.rsa_sig_size() {
        return Err(Error::VdataSigSize);
    }
    check_digest(key, sig_data, digest, wb)
}

// ============================================================================
// v2.1 Signatures
// ============================================================================

/// Verify a standalone v2.1 signature
///
/// `buf` runs from the signature to the end of whatever contains it.
///
/// # Errors
///
/// In order: [`Error::SigMagic`], common header errors,
/// [`Error::SigVersion`], [`Error::SigHeaderSize`], member errors for the
/// signature data, [`Error::SigAlgorithm`], [`Error::SigSize`].
pub fn verify_signature(buf: &[u8]) -> Result<V21Signature> {
    let (sig, hdr) = parse_common::<V21Signature>(buf)?;

    let mut min_offset = 0;
    verify_common_member(&hdr, &mut min_offset, sig.sig_offset, sig.sig_size)?;

    let expected = v21_sig_size(&sig);
    if expected == 0 {
        return Err(Error::SigAlgorithm);
    }
    if sig.sig_size as usize != expected {
        return Err(Error::SigSize);
    }

    Ok(sig)
}

/// Expected size of a v2.1 signature's data, or 0 for unknown algorithms
fn v21_sig_size(sig: &V21Signature) -> usize {
    match (
        SignatureAlgorithm::from_raw(u32::from(sig.sig_alg)),
        HashAlgorithm::from_raw(u32::from(sig.hash_alg)),
    ) {
        (Some(sig_alg), Some(hash_alg)) => vb_common::sig_size(sig_alg, hash_alg),
        _ => 0,
    }
}

/// Signature bytes of a verified v2.1 signature at the front of `buf`
///
/// # Errors
///
/// [`Error::CommonMemberSize`] if the bytes are not in `buf`.
pub fn v21_sig_data<'a>(buf: &'a [u8], sig: &V21Signature) -> Result<&'a [u8]> {
    sub_slice(buf, sig.sig_offset, sig.sig_size, Error::CommonMemberSize)
}

/// Check a computed digest against a v2.1 signature
///
/// # Errors
///
/// In order: [`Error::VdataAlgorithm`], [`Error::VdataAlgorithmMismatch`],
/// [`Error::VdataSigSize`], then [`Error::VdataVerifyDigest`] for a bare
/// hash or an RSA failure.
pub fn verify_digest(
    key: &PublicKey<'_>,
    sig: &V21Signature,
    sig_data: &[u8],
    digest: &[u8],
    wb: &mut WorkBuf<'_>,
) -> Result<()> {
    let key_sig_size = key.sig_size();
    if key_sig_size == 0 {
        return Err(Error::VdataAlgorithm);
    }
    if key.sig_alg.as_raw() != sig.sig_alg || key.hash_alg.as_raw() != sig.hash_alg {
        return Err(Error::VdataAlgorithmMismatch);
    }
    if sig.sig_size as usize != key_sig_size {
        return Err(Error::VdataSigSize);
    }

    check_digest(key, sig_data, digest, wb)
}

/// Verify a v2.1 signature over all of `data`
///
/// # Errors
///
/// [`Error::VdataSize`] unless the signature covers exactly `data`,
/// [`Error::VdataDigestSize`], [`Error::VdataWorkbufDigest`], or any
/// [`verify_digest`] error.
pub fn verify_data(
    data: &[u8],
    sig: &V21Signature,
    sig_data: &[u8],
    key: &PublicKey<'_>,
    wb: &mut WorkBuf<'_>,
) -> Result<()> {
    if sig.data_size as usize != data.len() {
        return Err(Error::VdataSize);
    }

    let digest_size = key.hash_alg.digest_size();
    if digest_size == 0 {
        return Err(Error::VdataDigestSize);
    }

    let (digest, mut rest) = wb
        .split_alloc(digest_size)
        .map_err(|_| Error::VdataWorkbufDigest)?;
    digest_buffer(key.hash_alg, data, digest)?;

    verify_digest(key, sig, sig_data, digest, &mut rest)
}

/// Compare a digest against signature bytes with the key's method
fn check_digest(key: &PublicKey<'_>, sig_data: &[u8], digest: &[u8], wb: &mut WorkBuf<'_>) -> Result<()> {
    match &key.rsa {
        Some(rsa_key) => Ok(rsa::verify_digest(rsa_key, sig_data, digest, wb)?),
        None if constant_time_eq(sig_data, digest) => Ok(()),
        None => Err(Error::VdataVerifyDigest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::CommonHeader;
    use crate::wire::{MAGIC_SIGNATURE, V21_VERSION_MAJOR};
    use vb_common::KeyId;
    use zerocopy::IntoBytes;

    #[repr(C, align(16))]
    struct Aligned([u8; 512]);

    /// Bare SHA-256 "signature" of `data`, returned with its total size
    fn bare_sig(data: &[u8], out: &mut [u8]) -> usize {
        let total = V21Signature::SIZE + 32;
        let sig = V21Signature {
            c: CommonHeader::new(MAGIC_SIGNATURE, V21_VERSION_MAJOR, V21Signature::SIZE as u32, total as u32),
            sig_offset: V21Signature::SIZE as u32,
            sig_size: 32,
            data_size: data.len() as u32,
            sig_alg: SignatureAlgorithm::None.as_raw(),
            hash_alg: HashAlgorithm::Sha256.as_raw(),
            id: *KeyId::NONE_SHA256.as_bytes(),
        };
        out[..V21Signature::SIZE].copy_from_slice(sig.as_bytes());
        digest_buffer(HashAlgorithm::Sha256, data, &mut out[V21Signature::SIZE..total]).unwrap();
        total
    }

    #[test]
    fn test_bare_hash_round() {
        let data = b"firmware body";
        let mut buf = [0u8; 128];
        let total = bare_sig(data, &mut buf);

        let sig = verify_signature(&buf[..total]).unwrap();
        let sig_data = v21_sig_data(&buf, &sig).unwrap();
        let key = PublicKey::bare_hash(HashAlgorithm::Sha256).unwrap();

        let mut work = Aligned([0u8; 512]);
        let mut wb = WorkBuf::new(&mut work.0);
        assert!(verify_data(data, &sig, sig_data, &key, &mut wb).is_ok());
        assert_eq!(
            verify_data(b"firmware bodY", &sig, sig_data, &key, &mut wb),
            Err(Error::VdataVerifyDigest)
        );
        assert_eq!(
            verify_data(b"firmware", &sig, sig_data, &key, &mut wb),
            Err(Error::VdataSize)
        );
    }

    #[test]
    fn test_signature_size_mismatch() {
        let mut buf = [0u8; 128];
        let total = bare_sig(b"x", &mut buf);
        // Claim SHA-512 while carrying 32 bytes.
        buf[34..36].copy_from_slice(&HashAlgorithm::Sha512.as_raw().to_ne_bytes());
        assert_eq!(verify_signature(&buf[..total]), Err(Error::SigSize));
        buf[34..36].copy_from_slice(&7u16.to_ne_bytes());
        assert_eq!(verify_signature(&buf[..total]), Err(Error::SigAlgorithm));
    }

    #[test]
    fn test_signature_magic_and_version() {
        let mut buf = [0u8; 128];
        let total = bare_sig(b"x", &mut buf);
        buf[4] = 2;
        assert_eq!(verify_signature(&buf[..total]), Err(Error::SigVersion));
        buf[0] ^= 1;
        assert_eq!(verify_signature(&buf[..total]), Err(Error::SigMagic));
    }

    #[test]
    fn test_algorithm_mismatch() {
        let mut buf = [0u8; 128];
        let total = bare_sig(b"x", &mut buf);
        let sig = verify_signature(&buf[..total]).unwrap();
        let key = PublicKey::bare_hash(HashAlgorithm::Sha512).unwrap();
        let mut work = Aligned([0u8; 512]);
        let mut wb = WorkBuf::new(&mut work.0);
        assert_eq!(
            verify_digest(&key, &sig, &buf[52..84], &[0u8; 64], &mut wb),
            Err(Error::VdataAlgorithmMismatch)
        );
    }
}
