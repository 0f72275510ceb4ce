// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Digest engine
//!
//! Software SHA-1, SHA-256 and SHA-512 behind the [`Hash`] trait, a
//! runtime-selected [`DigestContext`] for code that learns the algorithm
//! from a key, and [`StreamingDigest`], which prefers the platform hashing
//! engine when one is offered.

use digest::Digest;
use vb_common::{Error, HashAlgorithm, Result};

use crate::error::{CryptoError, CryptoResult};
use crate::traits::{Hash, HwCrypto};

macro_rules! sha_hasher {
    ($name:ident, $output:ident, $inner:ty, $alg:expr, $size:expr, $doc:expr) => {
        #[doc = concat!($doc, " output")]
        #[derive(Clone, Copy, PartialEq, Eq)]
        pub struct $output([u8; $size]);

        impl AsRef<[u8]> for $output {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl core::fmt::Debug for $output {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                for byte in &self.0 {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }

        #[doc = concat!($doc, " hasher")]
        #[derive(Clone)]
        pub struct $name {
            inner: $inner,
        }

        impl Hash for $name {
            const ALGORITHM: HashAlgorithm = $alg;
            const OUTPUT_SIZE: usize = $size;

            type Output = $output;

            fn hash(message: &[u8]) -> Self::Output {
                let mut output = [0u8; $size];
                output.copy_from_slice(&<$inner>::digest(message));
                $output(output)
            }

            fn new() -> Self {
                Self {
                    inner: <$inner>::new(),
                }
            }

            fn update(&mut self, data: &[u8]) {
                Digest::update(&mut self.inner, data);
            }

            fn finalize(self) -> Self::Output {
                let mut output = [0u8; $size];
                output.copy_from_slice(&self.inner.finalize());
                $output(output)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                <Self as Hash>::new()
            }
        }
    };
}

sha_hasher!(Sha1, Sha1Output, sha1::Sha1, HashAlgorithm::Sha1, 20, "SHA-1");
sha_hasher!(Sha256, Sha256Output, sha2::Sha256, HashAlgorithm::Sha256, 32, "SHA-256");
sha_hasher!(Sha512, Sha512Output, sha2::Sha512, HashAlgorithm::Sha512, 64, "SHA-512");

// =============================================================================
// Runtime-selected digest
// =============================================================================

/// Software digest whose algorithm is chosen at runtime
#[derive(Clone)]
pub enum DigestContext {
    /// SHA-1 in progress
    Sha1(Sha1),
    /// SHA-256 in progress
    Sha256(Sha256),
    /// SHA-512 in progress
    Sha512(Sha512),
}

impl DigestContext {
    /// Start a digest
    ///
    /// # Errors
    ///
    /// [`CryptoError::ShaInitAlgorithm`] for [`HashAlgorithm::None`].
    pub fn new(alg: HashAlgorithm) -> CryptoResult<Self> {
        match alg {
            HashAlgorithm::Sha1 => Ok(Self::Sha1(Sha1::new())),
            HashAlgorithm::Sha256 => Ok(Self::Sha256(Sha256::new())),
            HashAlgorithm::Sha512 => Ok(Self::Sha512(Sha512::new())),
            HashAlgorithm::None => Err(CryptoError::ShaInitAlgorithm),
        }
    }

    /// Algorithm of this digest
    #[must_use]
    pub const fn algorithm(&self) -> HashAlgorithm {
        match self {
            Self::Sha1(_) => Sha1::ALGORITHM,
            Self::Sha256(_) => Sha256::ALGORITHM,
            Self::Sha512(_) => Sha512::ALGORITHM,
        }
    }

    /// Digest size in bytes
    #[must_use]
    pub const fn digest_size(&self) -> usize {
        match self {
            Self::Sha1(_) => Sha1::OUTPUT_SIZE,
            Self::Sha256(_) => Sha256::OUTPUT_SIZE,
            Self::Sha512(_) => Sha512::OUTPUT_SIZE,
        }
    }

    /// Feed data
    pub fn extend(&mut self, data: &[u8]) {
        match self {
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    /// Write the digest into the front of `out`
    ///
    /// # Errors
    ///
    /// [`CryptoError::ShaFinalizeDigestSize`] if `out` is too small.
    pub fn finalize(self, out: &mut [u8]) -> CryptoResult<usize> {
        let size = self.digest_size();
        let dest = out.get_mut(..size).ok_or(CryptoError::ShaFinalizeDigestSize)?;
        match self {
            Self::Sha1(h) => dest.copy_from_slice(h.finalize().as_ref()),
            Self::Sha256(h) => dest.copy_from_slice(h.finalize().as_ref()),
            Self::Sha512(h) => dest.copy_from_slice(h.finalize().as_ref()),
        }
        Ok(size)
    }
}

/// Hash `data` in one call
///
/// # Errors
///
/// Same as [`DigestContext::new`] and [`DigestContext::finalize`].
pub fn digest_buffer(alg: HashAlgorithm, data: &[u8], out: &mut [u8]) -> CryptoResult<usize> {
    fn write<H: Hash>(data: &[u8], out: &mut [u8]) -> CryptoResult<usize> {
        let dest = out.get_mut(..H::OUTPUT_SIZE).ok_or(CryptoError::ShaFinalizeDigestSize)?;
        dest.copy_from_slice(H::hash(data).as_ref());
        Ok(H::OUTPUT_SIZE)
    }

    match alg {
        HashAlgorithm::Sha1 => write::<Sha1>(data, out),
        HashAlgorithm::Sha256 => write::<Sha256>(data, out),
        HashAlgorithm::Sha512 => write::<Sha512>(data, out),
        HashAlgorithm::None => Err(CryptoError::ShaInitAlgorithm),
    }
}

// =============================================================================
// Streaming digest with optional hardware offload
// =============================================================================

/// Digest of a body that arrives in pieces
///
/// Hardware state lives in the host; only the algorithm is remembered here.
#[derive(Clone)]
pub enum StreamingDigest {
    /// Hashing in software
    Software(DigestContext),
    /// Hashing in the host's engine
    Hardware(HashAlgorithm),
}

impl StreamingDigest {
    /// Start hashing `data_size` bytes
    ///
    /// With `allow_hw` the host engine is asked first. Only
    /// [`Error::ExHwCryptoUnsupported`] selects the software path; any other
    /// host error is returned.
    ///
    /// # Errors
    ///
    /// Host errors, or [`Error::ShaInitAlgorithm`].
    pub fn start<H: HwCrypto + ?Sized>(
        hw: &mut H,
        allow_hw: bool,
        alg: HashAlgorithm,
        data_size: u32,
    ) -> Result<Self> {
        if allow_hw {
            match hw.hwcrypto_digest_init(alg, data_size) {
                Ok(()) => return Ok(Self::Hardware(alg)),
                Err(Error::ExHwCryptoUnsupported) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(Self::Software(DigestContext::new(alg)?))
    }

    /// Whether the host engine is doing the work
    #[must_use]
    pub const fn is_hardware(&self) -> bool {
        matches!(self, Self::Hardware(_))
    }

    /// Algorithm being computed
    #[must_use]
    pub const fn algorithm(&self) -> HashAlgorithm {
        match self {
            Self::Software(ctx) => ctx.algorithm(),
            Self::Hardware(alg) => *alg,
        }
    }

    /// Feed data
    ///
    /// # Errors
    ///
    /// Host errors when hashing in hardware.
    pub fn extend<H: HwCrypto + ?Sized>(&mut self, hw: &mut H, data: &[u8]) -> Result<()> {
        match self {
            Self::Software(ctx) => {
                ctx.extend(data);
                Ok(())
            }
            Self::Hardware(_) => hw.hwcrypto_digest_extend(data),
        }
    }

    /// Write the digest into the front of `out`
    ///
    /// # Errors
    ///
    /// Host errors, or [`Error::ShaFinalizeDigestSize`].
    pub fn finalize<H: HwCrypto + ?Sized>(self, hw: &mut H, out: &mut [u8]) -> Result<usize> {
        match self {
            Self::Software(ctx) => Ok(ctx.finalize(out)?),
            Self::Hardware(alg) => {
                let size = alg.digest_size();
                let dest = out.get_mut(..size).ok_or(Error::ShaFinalizeDigestSize)?;
                hw.hwcrypto_digest_finalize(dest)?;
                Ok(size)
            }
        }
    }
}
