// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Core cryptographic traits
//!
//! [`Hash`] is implemented by the software digests in [`crate::hash`].
//! [`HwCrypto`] is the seam a platform uses to offer a hashing engine; its
//! default methods decline every request, so hosts without an engine just
//! implement nothing.

use vb_common::{Error, HashAlgorithm, Result};

/// Incremental hash function
pub trait Hash: Sized {
    /// Algorithm identifier for this hash function
    const ALGORITHM: HashAlgorithm;
    /// Output size in bytes
    const OUTPUT_SIZE: usize;

    /// Output type
    type Output: AsRef<[u8]> + Clone;

    /// Hash a message in one shot
    fn hash(message: &[u8]) -> Self::Output;

    /// Create a new incremental hasher
    fn new() -> Self;

    /// Update the hasher with data
    fn update(&mut self, data: &[u8]);

    /// Finalize and return the hash
    fn finalize(self) -> Self::Output;
}

/// Platform hashing engine
///
/// Returning [`Error::ExHwCryptoUnsupported`] from `digest_init` makes the
/// caller fall back to software. Any other error aborts the operation.
pub trait HwCrypto {
    /// Start hashing `data_size` bytes with `alg`
    ///
    /// # Errors
    ///
    /// [`Error::ExHwCryptoUnsupported`] to decline; anything else is fatal.
    fn hwcrypto_digest_init(&mut self, alg: HashAlgorithm, data_size: u32) -> Result<()> {
        let _ = (alg, data_size);
        Err(Error::ExHwCryptoUnsupported)
    }

    /// Feed more data to the engine
    ///
    /// # Errors
    ///
    /// Any host failure.
    fn hwcrypto_digest_extend(&mut self, data: &[u8]) -> Result<()> {
        let _ = data;
        Err(Error::ExHwCryptoUnsupported)
    }

    /// Write the final digest into `digest`
    ///
    /// # Errors
    ///
    /// Any host failure.
    fn hwcrypto_digest_finalize(&mut self, digest: &mut [u8]) -> Result<()> {
        let _ = digest;
        Err(Error::ExHwCryptoUnsupported)
    }
}

/// Host with no hashing engine
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHwCrypto;

impl HwCrypto for NoHwCrypto {}

/// Constant-time comparison of two byte slices
///
/// Slices of different length compare unequal.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    use subtle::ConstantTimeEq;
    a.ct_eq(b).into()
}
