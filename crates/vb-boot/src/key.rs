// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Packed key unpacking
//!
//! A packed key is turned into a [`PublicKey`] that borrows its RSA arrays,
//! description and id straight out of the source bytes. Nothing is copied,
//! so the source must stay put for as long as the key is used.

use vb_common::{CryptoAlgorithm, Error, HashAlgorithm, KeyId, Result, SignatureAlgorithm};
use vb_crypto::RsaPublicKey;
use zerocopy::FromBytes;

use crate::bounds::{sub_slice, verify_member_inside};
use crate::common::{common_desc, verify_common_header, verify_common_member};
use crate::wire::{PackedKey, V21PackedKey, WireFormat, MAGIC_PACKED_KEY, V21_VERSION_MAJOR};

/// Packed key layouts
pub type PackedKeyFormat = WireFormat;

/// An unpacked public key
#[derive(Debug, Clone, Copy)]
pub struct PublicKey<'a> {
    /// Signature algorithm; [`SignatureAlgorithm::None`] for a bare hash
    pub sig_alg: SignatureAlgorithm,
    /// Hash algorithm
    pub hash_alg: HashAlgorithm,
    /// RSA parameters, absent for a bare hash
    pub rsa: Option<RsaPublicKey<'a>>,
    /// Description, without terminator; empty for legacy keys
    pub desc: &'a [u8],
    /// Key version
    pub version: u32,
    /// Key id; legacy keys have none
    pub id: Option<KeyId>,
    /// Layout the key was unpacked from
    pub format: PackedKeyFormat,
}

impl PublicKey<'static> {
    /// Key that "verifies" a bare hash of `hash_alg`
    ///
    /// Returns `None` for [`HashAlgorithm::None`].
    #[must_use]
    pub const fn bare_hash(hash_alg: HashAlgorithm) -> Option<Self> {
        let Some(id) = KeyId::for_hash(hash_alg) else {
            return None;
        };
        Some(Self {
            sig_alg: SignatureAlgorithm::None,
            hash_alg,
            rsa: None,
            desc: &[],
            version: 0,
            id: Some(id),
            format: WireFormat::V21,
        })
    }
}

impl PublicKey<'_> {
    /// Expected size of signatures made with this key
    #[must_use]
    pub const fn sig_size(&self) -> usize {
        vb_common::sig_size(self.sig_alg, self.hash_alg)
    }

    /// Legacy combined algorithm, if the pair has one
    #[must_use]
    pub const fn algorithm(&self) -> Option<CryptoAlgorithm> {
        CryptoAlgorithm::from_pair(self.sig_alg, self.hash_alg)
    }
}

/// Unpack a key in either layout
///
/// A buffer that starts with the v2.1 packed-key magic is unpacked as v2.1;
/// anything else is treated as legacy.
///
/// # Errors
///
/// See [`unpack_legacy_key`] and [`unpack_v21_key`].
pub fn unpack_key(buf: &[u8]) -> Result<PublicKey<'_>> {
    match WireFormat::detect(buf, MAGIC_PACKED_KEY) {
        WireFormat::Legacy => unpack_legacy_key(buf),
        WireFormat::V21 => unpack_v21_key(buf),
    }
}

/// Key data words: `arrsize, n0inv, n[arrsize], rr[arrsize]`
fn rsa_from_words<'a>(
    words: &'a [u32],
    sig_alg: SignatureAlgorithm,
    hash_alg: HashAlgorithm,
    size_err: Error,
) -> Result<RsaPublicKey<'a>> {
    let (&arrsize, rest) = words.split_first().ok_or(size_err)?;
    if (arrsize as usize).checked_mul(4) != Some(sig_alg.rsa_sig_size()) {
        return Err(size_err);
    }
    let arrsize = arrsize as usize;
    let (&n0inv, arrays) = rest.split_first().ok_or(size_err)?;
    let n = arrays.get(..arrsize).ok_or(size_err)?;
    let rr = arrays.get(arrsize..2 * arrsize).ok_or(size_err)?;

    Ok(RsaPublicKey {
        n,
        rr,
        n0inv,
        sig_alg,
        hash_alg,
    })
}

/// Unpack a legacy packed key
///
/// # Errors
///
/// In order: an `Inside*` error if the key data is not inside `buf`,
/// [`Error::UnpackKeyBadAlgorithm`], [`Error::UnpackKeyBadKey`] for a size
/// mismatch, [`Error::UnpackKeyBufferUnaligned`], and
/// [`Error::UnpackKeyBadKey`] for a bad array size.
pub fn unpack_legacy_key(buf: &[u8]) -> Result<PublicKey<'_>> {
    let (packed, _) = PackedKey::read_from_prefix(buf).map_err(|_| Error::InsideMemberOutside)?;
    verify_member_inside(
        buf.len() as u64,
        0,
        PackedKey::SIZE as u64,
        u64::from(packed.key_offset),
        u64::from(packed.key_size),
    )?;

    let alg = CryptoAlgorithm::from_raw(packed.algorithm).ok_or(Error::UnpackKeyBadAlgorithm)?;
    let sig_alg = alg.signature();
    let hash_alg = alg.hash();

    if packed.key_size as usize != sig_alg.packed_key_size() {
        return Err(Error::UnpackKeyBadKey);
    }

    let data = sub_slice(buf, packed.key_offset, packed.key_size, Error::InsideDataOutside)?;
    let words = <[u32]>::ref_from_bytes(data).map_err(|_| Error::UnpackKeyBufferUnaligned)?;
    let rsa = rsa_from_words(words, sig_alg, hash_alg, Error::UnpackKeyBadKey)?;

    Ok(PublicKey {
        sig_alg,
        hash_alg,
        rsa: Some(rsa),
        desc: &[],
        version: packed.key_version,
        id: None,
        format: WireFormat::Legacy,
    })
}

/// Unpack a v2.1 packed key
///
/// # Errors
///
/// In order: common header errors, [`Error::UnpackKeyFixedSize`], key data
/// member errors, [`Error::UnpackKeyStructVersion`],
/// [`Error::UnpackKeyHashAlgorithm`], [`Error::UnpackKeySigAlgorithm`], and
/// for RSA keys [`Error::UnpackKeySize`], [`Error::UnpackKeyAlign`],
/// [`Error::UnpackKeyArraySize`].
pub fn unpack_v21_key(buf: &[u8]) -> Result<PublicKey<'_>> {
    let hdr = verify_common_header(buf)?;
    if (hdr.fixed_size as usize) < V21PackedKey::SIZE {
        return Err(Error::UnpackKeyFixedSize);
    }
    let (packed, _) = V21PackedKey::read_from_prefix(buf).map_err(|_| Error::UnpackKeyFixedSize)?;

    let mut min_offset = 0;
    verify_common_member(&hdr, &mut min_offset, packed.key_offset, packed.key_size)?;

    // Any minor version is readable.
    if hdr.struct_version_major != V21_VERSION_MAJOR {
        return Err(Error::UnpackKeyStructVersion);
    }

    let hash_alg = HashAlgorithm::from_raw(u32::from(packed.hash_alg))
        .filter(|alg| alg.digest_size() != 0)
        .ok_or(Error::UnpackKeyHashAlgorithm)?;
    let sig_alg = SignatureAlgorithm::from_raw(u32::from(packed.sig_alg))
        .ok_or(Error::UnpackKeySigAlgorithm)?;

    let rsa = if sig_alg == SignatureAlgorithm::None {
        None
    } else {
        let data = sub_slice(buf, packed.key_offset, packed.key_size, Error::CommonMemberSize)?;
        if data.len() != sig_alg.packed_key_size() {
            return Err(Error::UnpackKeySize);
        }
        let words = <[u32]>::ref_from_bytes(data).map_err(|_| Error::UnpackKeyAlign)?;
        Some(rsa_from_words(words, sig_alg, hash_alg, Error::UnpackKeyArraySize)?)
    };

    Ok(PublicKey {
        sig_alg,
        hash_alg,
        rsa,
        desc: common_desc(buf, &hdr),
        version: packed.key_version,
        id: Some(packed.key_id()),
        format: WireFormat::V21,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::IntoBytes;

    #[repr(C, align(16))]
    struct Aligned([u8; 64]);

    #[test]
    fn test_bare_hash_key() {
        let key = PublicKey::bare_hash(HashAlgorithm::Sha256).unwrap();
        assert_eq!(key.sig_size(), 32);
        assert_eq!(key.id, Some(KeyId::NONE_SHA256));
        assert!(PublicKey::bare_hash(HashAlgorithm::None).is_none());
    }

    #[test]
    fn test_legacy_key_too_short() {
        assert_eq!(unpack_key(&[0u8; 16]).unwrap_err(), Error::InsideMemberOutside);
    }

    #[test]
    fn test_legacy_bad_algorithm() {
        let mut buf = Aligned([0u8; 64]);
        let packed = PackedKey {
            key_offset: 32,
            key_size: 8,
            algorithm: 99,
            ..PackedKey::default()
        };
        buf.0[..32].copy_from_slice(packed.as_bytes());
        assert_eq!(unpack_key(&buf.0[..40]).unwrap_err(), Error::UnpackKeyBadAlgorithm);
    }

    #[test]
    fn test_legacy_wrong_key_size() {
        let mut buf = Aligned([0u8; 64]);
        let packed = PackedKey {
            key_offset: 32,
            key_size: 8,
            algorithm: 4,
            ..PackedKey::default()
        };
        buf.0[..32].copy_from_slice(packed.as_bytes());
        assert_eq!(unpack_key(&buf.0[..40]).unwrap_err(), Error::UnpackKeyBadKey);
    }
}
