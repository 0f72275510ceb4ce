// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Cryptographic error types

use core::fmt;

/// Error type for digest and RSA operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// Hash algorithm has no implementation
    ShaInitAlgorithm,
    /// Digest output buffer is smaller than the digest
    ShaFinalizeDigestSize,
    /// Key is not an RSA key
    RsaVerifyAlgorithm,
    /// Key array size or signature length does not match the algorithm
    RsaVerifySigLen,
    /// Work buffer too small for the exponentiation scratch
    RsaVerifyWorkbuf,
    /// Decrypted signature does not carry the expected digest
    RsaVerifyDigest,
    /// PKCS#1 v1.5 padding is malformed
    RsaPadding,
}

impl CryptoError {
    /// Get error description
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::ShaInitAlgorithm => "unsupported hash algorithm",
            Self::ShaFinalizeDigestSize => "digest buffer too small",
            Self::RsaVerifyAlgorithm => "not an RSA key",
            Self::RsaVerifySigLen => "signature length mismatch",
            Self::RsaVerifyWorkbuf => "work buffer too small",
            Self::RsaVerifyDigest => "digest mismatch",
            Self::RsaPadding => "bad padding",
        }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = vb_common::Error::from(*self).code();
        write!(f, "[0x{:08X}] {}", code, self.description())
    }
}

impl From<CryptoError> for vb_common::Error {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::ShaInitAlgorithm => Self::ShaInitAlgorithm,
            CryptoError::ShaFinalizeDigestSize => Self::ShaFinalizeDigestSize,
            CryptoError::RsaVerifyAlgorithm => Self::RsaVerifyAlgorithm,
            CryptoError::RsaVerifySigLen => Self::RsaVerifySigLen,
            CryptoError::RsaVerifyWorkbuf => Self::RsaVerifyWorkbuf,
            CryptoError::RsaVerifyDigest => Self::RsaVerifyDigest,
            CryptoError::RsaPadding => Self::RsaPadding,
        }
    }
}

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;
