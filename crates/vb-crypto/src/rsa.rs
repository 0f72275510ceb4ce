// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! RSA PKCS#1 v1.5 signature verification
//!
//! Public exponent is fixed at 65537. Keys carry precomputed Montgomery
//! parameters (`n0inv = -1 / n[0] mod 2^32` and `rr = R^2 mod n`), so
//! verification is 17 Montgomery multiplications and needs no division.
//!
//! Big numbers are little-endian arrays of `u32` words. Signatures and
//! digests are big-endian byte strings.
//!
//! The signature is copied into work buffer scratch before the
//! exponentiation; the caller's bytes are never written.

use subtle::{Choice, ConstantTimeEq};
use vb_common::{HashAlgorithm, SignatureAlgorithm, WorkBuf};
use zerocopy::FromBytes;
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};

/// Largest supported signature in bytes (RSA-8192)
pub const RSA_MAX_SIG_SIZE: usize = vb_common::constants::RSA_MAX_SIG_SIZE;

/// DigestInfo suffix for SHA-1, preceded by the 0x00 separator
const SHA1_TAIL: [u8; 16] = [
    0x00, 0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00, 0x04, 0x14,
];

/// DigestInfo suffix for SHA-256, preceded by the 0x00 separator
const SHA256_TAIL: [u8; 20] = [
    0x00, 0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
    0x01, 0x05, 0x00, 0x04, 0x20,
];

/// DigestInfo suffix for SHA-512, preceded by the 0x00 separator
const SHA512_TAIL: [u8; 20] = [
    0x00, 0x30, 0x51, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
    0x03, 0x05, 0x00, 0x04, 0x40,
];

/// RSA public key borrowed from a packed key
#[derive(Debug, Clone, Copy)]
pub struct RsaPublicKey<'a> {
    /// Modulus, little-endian words
    pub n: &'a [u32],
    /// `R^2 mod n`, little-endian words
    pub rr: &'a [u32],
    /// `-1 / n[0] mod 2^32`
    pub n0inv: u32,
    /// Modulus size
    pub sig_alg: SignatureAlgorithm,
    /// Hash the signature was made over
    pub hash_alg: HashAlgorithm,
}

impl RsaPublicKey<'_> {
    /// Number of 32-bit words in the modulus
    #[must_use]
    pub fn arrsize(&self) -> usize {
        self.n.len()
    }
}

// =============================================================================
// Montgomery arithmetic
// =============================================================================

/// `a -= n`, ignoring the final borrow
fn sub_mod(n: &[u32], a: &mut [u32]) {
    let mut borrow: i64 = 0;
    for (ai, &ni) in a.iter_mut().zip(n) {
        borrow += i64::from(*ai) - i64::from(ni);
        *ai = borrow as u32;
        borrow >>= 32;
    }
}

/// `a >= n`
fn mont_ge(n: &[u32], a: &[u32]) -> bool {
    for (&ai, &ni) in a.iter().rev().zip(n.iter().rev()) {
        if ai < ni {
            return false;
        }
        if ai > ni {
            return true;
        }
    }
    true
}

/// `c = (c + a * b) / R mod n` for a single word `a`
fn mont_mul_add(key: &RsaPublicKey<'_>, c: &mut [u32], a: u32, b: &[u32]) {
    let n = key.n;
    let a = u64::from(a);
    let mut acc_a = a * u64::from(b[0]) + u64::from(c[0]);
    let d0 = (acc_a as u32).wrapping_mul(key.n0inv);
    let d0 = u64::from(d0);
    let mut acc_b = d0 * u64::from(n[0]) + u64::from(acc_a as u32);

    let len = n.len();
    for i in 1..len {
        acc_a = (acc_a >> 32) + a * u64::from(b[i]) + u64::from(c[i]);
        acc_b = (acc_b >> 32) + d0 * u64::from(n[i]) + u64::from(acc_a as u32);
        c[i - 1] = acc_b as u32;
    }

    acc_a = (acc_a >> 32) + (acc_b >> 32);
    c[len - 1] = acc_a as u32;

    if acc_a >> 32 != 0 {
        sub_mod(n, c);
    }
}

/// `c = a * b / R mod n`
fn mont_mul(key: &RsaPublicKey<'_>, c: &mut [u32], a: &[u32], b: &[u32]) {
    c.fill(0);
    for &ai in a {
        mont_mul_add(key, c, ai, b);
    }
}

/// `sig^65537 mod n`, leaving the result in `out`
///
/// `a` and `a_r` are scratch; all three slices have the modulus length.
fn mod_pow_f4(key: &RsaPublicKey<'_>, sig: &[u8], a: &mut [u32], a_r: &mut [u32], out: &mut [u32]) {
    let words = key.arrsize();

    // Big-endian bytes to little-endian words.
    for (i, word) in a.iter_mut().enumerate() {
        let at = (words - 1 - i) * 4;
        *word = u32::from_be_bytes([sig[at], sig[at + 1], sig[at + 2], sig[at + 3]]);
    }

    mont_mul(key, a_r, a, key.rr); // aR = a * RR / R
    for _ in 0..8 {
        mont_mul(key, out, a_r, a_r); // aaR = aR^2 / R
        mont_mul(key, a_r, out, out); // aR = aaR^2 / R
    }
    mont_mul(key, out, a_r, a); // a^65537

    if mont_ge(key.n, out) {
        sub_mod(key.n, out);
    }
}

/// Byte `index` of the big-endian encoding of `words`
fn be_byte(words: &[u32], index: usize) -> u8 {
    let word = words[words.len() - 1 - index / 4];
    (word >> (24 - 8 * (index % 4))) as u8
}

// =============================================================================
// Padding
// =============================================================================

fn digest_info_tail(hash_alg: HashAlgorithm) -> Option<&'static [u8]> {
    match hash_alg {
        HashAlgorithm::Sha1 => Some(&SHA1_TAIL),
        HashAlgorithm::Sha256 => Some(&SHA256_TAIL),
        HashAlgorithm::Sha512 => Some(&SHA512_TAIL),
        HashAlgorithm::None => None,
    }
}

/// Check `00 01 ff .. ff 00 DigestInfo` without early exit
fn padding_ok(decrypted: &[u32], sig_size: usize, tail: &[u8], hash_len: usize) -> Choice {
    let pad_size = sig_size - hash_len;
    let ff_count = pad_size - tail.len() - 2;

    let mut ok = be_byte(decrypted, 0).ct_eq(&0x00);
    ok &= be_byte(decrypted, 1).ct_eq(&0x01);
    for i in 0..ff_count {
        ok &= be_byte(decrypted, 2 + i).ct_eq(&0xff);
    }
    for (i, expected) in tail.iter().enumerate() {
        ok &= be_byte(decrypted, 2 + ff_count + i).ct_eq(expected);
    }
    ok
}

// =============================================================================
// Verification
// =============================================================================

/// Work buffer bytes needed to verify with a key of `sig_alg`
#[must_use]
pub const fn workbuf_size(sig_alg: SignatureAlgorithm) -> usize {
    3 * sig_alg.rsa_sig_size()
}

/// Verify that `sig` is a PKCS#1 v1.5 signature of `digest`
///
/// Padding is checked first, but a padding failure does not stop the
/// digest comparison; a digest mismatch is reported in preference to a
/// padding error.
///
/// # Errors
///
/// - [`CryptoError::RsaVerifyAlgorithm`]: the key is not RSA or has no hash
/// - [`CryptoError::RsaVerifySigLen`]: key or signature length mismatch
/// - [`CryptoError::RsaVerifyWorkbuf`]: not enough scratch space
/// - [`CryptoError::RsaPadding`] / [`CryptoError::RsaVerifyDigest`]
pub fn verify_digest(
    key: &RsaPublicKey<'_>,
    sig: &[u8],
    digest: &[u8],
    wb: &mut WorkBuf<'_>,
) -> CryptoResult<()> {
    let sig_size = key.sig_alg.rsa_sig_size();
    if sig_size == 0 {
        return Err(CryptoError::RsaVerifyAlgorithm);
    }
    let tail = digest_info_tail(key.hash_alg).ok_or(CryptoError::RsaVerifyAlgorithm)?;
    let hash_len = key.hash_alg.digest_size();

    let key_bytes = key.arrsize() * 4;
    if key_bytes != sig_size || key.rr.len() != key.arrsize() || sig.len() != sig_size {
        return Err(CryptoError::RsaVerifySigLen);
    }
    if digest.len() != hash_len {
        return Err(CryptoError::RsaVerifyDigest);
    }

    let mut scope = wb.scope();
    let scratch = scope
        .alloc(workbuf_size(key.sig_alg))
        .map_err(|_| CryptoError::RsaVerifyWorkbuf)?;
    let words = <[u32]>::mut_from_bytes(scratch).map_err(|_| CryptoError::RsaVerifyWorkbuf)?;

    let (a, rest) = words.split_at_mut(key.arrsize());
    let (a_r, out) = rest.split_at_mut(key.arrsize());
    mod_pow_f4(key, sig, a, a_r, out);

    let padding = padding_ok(out, sig_size, tail, hash_len);

    let pad_size = sig_size - hash_len;
    let mut digest_match = Choice::from(1);
    for (i, expected) in digest.iter().enumerate() {
        digest_match &= be_byte(out, pad_size + i).ct_eq(expected);
    }

    words.zeroize();

    if !bool::from(digest_match) {
        return Err(CryptoError::RsaVerifyDigest);
    }
    if !bool::from(padding) {
        return Err(CryptoError::RsaPadding);
    }
    Ok(())
}
