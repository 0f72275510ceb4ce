// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Algorithm identifiers and key ids
//!
//! Wire structures carry algorithms as raw integers. They are converted
//! into these types exactly once, at the point where the containing
//! structure is validated; anything out of range is rejected there.

use core::fmt;

use crate::constants::{ID_SIZE, SHA1_DIGEST_SIZE, SHA256_DIGEST_SIZE, SHA512_DIGEST_SIZE};

// =============================================================================
// Hash Algorithms
// =============================================================================

/// Hash algorithm identifiers, as stored on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum HashAlgorithm {
    /// No hash; never valid for verification
    None = 0,
    /// SHA-1
    Sha1 = 1,
    /// SHA-256
    Sha256 = 2,
    /// SHA-512
    Sha512 = 3,
}

impl HashAlgorithm {
    /// Convert from the wire value
    #[must_use]
    pub const fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Sha1),
            2 => Some(Self::Sha256),
            3 => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Wire value
    #[must_use]
    pub const fn as_raw(self) -> u16 {
        self as u16
    }

    /// Digest size in bytes, or 0 if the algorithm has no digest
    #[must_use]
    pub const fn digest_size(self) -> usize {
        match self {
            Self::None => 0,
            Self::Sha1 => SHA1_DIGEST_SIZE,
            Self::Sha256 => SHA256_DIGEST_SIZE,
            Self::Sha512 => SHA512_DIGEST_SIZE,
        }
    }

    /// Algorithm name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Signature Algorithms
// =============================================================================

/// Signature algorithm identifiers, as stored on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum SignatureAlgorithm {
    /// Bare hash, no signature
    None = 0,
    /// RSA-1024, e = 65537
    Rsa1024 = 1,
    /// RSA-2048, e = 65537
    Rsa2048 = 2,
    /// RSA-4096, e = 65537
    Rsa4096 = 3,
    /// RSA-8192, e = 65537
    Rsa8192 = 4,
}

impl SignatureAlgorithm {
    /// Convert from the wire value
    #[must_use]
    pub const fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Rsa1024),
            2 => Some(Self::Rsa2048),
            3 => Some(Self::Rsa4096),
            4 => Some(Self::Rsa8192),
            _ => None,
        }
    }

    /// Wire value
    #[must_use]
    pub const fn as_raw(self) -> u16 {
        self as u16
    }

    /// Check whether this is an RSA algorithm
    #[must_use]
    pub const fn is_rsa(self) -> bool {
        !matches!(self, Self::None)
    }

    /// RSA modulus size in bytes, or 0 for a bare hash
    #[must_use]
    pub const fn rsa_sig_size(self) -> usize {
        match self {
            Self::None => 0,
            Self::Rsa1024 => 128,
            Self::Rsa2048 => 256,
            Self::Rsa4096 => 512,
            Self::Rsa8192 => 1024,
        }
    }

    /// Size of the packed key data: `arrsize`, `n0inv`, `n[]` and `rr[]`
    #[must_use]
    pub const fn packed_key_size(self) -> usize {
        match self {
            Self::None => 0,
            _ => 2 * 4 + 2 * self.rsa_sig_size(),
        }
    }
}

/// Expected signature size for an algorithm pair
///
/// A bare-hash signature is the digest itself. Returns 0 when the hash has
/// no digest.
#[must_use]
pub const fn sig_size(sig_alg: SignatureAlgorithm, hash_alg: HashAlgorithm) -> usize {
    let digest_size = hash_alg.digest_size();
    if digest_size == 0 {
        return 0;
    }
    match sig_alg {
        SignatureAlgorithm::None => digest_size,
        _ => sig_alg.rsa_sig_size(),
    }
}

// =============================================================================
// Legacy Combined Algorithms
// =============================================================================

/// Legacy combined algorithm number (`0..12`)
///
/// Encodes four RSA sizes times three hashes: `sig = n / 3 + 1` and
/// `hash = n % 3 + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CryptoAlgorithm(u8);

impl CryptoAlgorithm {
    /// Number of legacy algorithms
    pub const COUNT: u32 = 12;

    /// RSA-1024 with SHA-1
    pub const RSA1024_SHA1: Self = Self(0);
    /// RSA-1024 with SHA-256
    pub const RSA1024_SHA256: Self = Self(1);
    /// RSA-1024 with SHA-512
    pub const RSA1024_SHA512: Self = Self(2);
    /// RSA-2048 with SHA-1
    pub const RSA2048_SHA1: Self = Self(3);
    /// RSA-2048 with SHA-256
    pub const RSA2048_SHA256: Self = Self(4);
    /// RSA-2048 with SHA-512
    pub const RSA2048_SHA512: Self = Self(5);
    /// RSA-4096 with SHA-1
    pub const RSA4096_SHA1: Self = Self(6);
    /// RSA-4096 with SHA-256
    pub const RSA4096_SHA256: Self = Self(7);
    /// RSA-4096 with SHA-512
    pub const RSA4096_SHA512: Self = Self(8);
    /// RSA-8192 with SHA-1
    pub const RSA8192_SHA1: Self = Self(9);
    /// RSA-8192 with SHA-256
    pub const RSA8192_SHA256: Self = Self(10);
    /// RSA-8192 with SHA-512
    pub const RSA8192_SHA512: Self = Self(11);

    /// Convert from the wire value
    #[must_use]
    pub const fn from_raw(value: u32) -> Option<Self> {
        if value < Self::COUNT {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    /// Build from an algorithm pair, if the pair has a legacy number
    #[must_use]
    pub const fn from_pair(sig_alg: SignatureAlgorithm, hash_alg: HashAlgorithm) -> Option<Self> {
        if !sig_alg.is_rsa() || matches!(hash_alg, HashAlgorithm::None) {
            return None;
        }
        Some(Self((sig_alg as u8 - 1) * 3 + (hash_alg as u8 - 1)))
    }

    /// Wire value
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0 as u32
    }

    /// Signature half of the pair
    #[must_use]
    pub const fn signature(self) -> SignatureAlgorithm {
        match self.0 / 3 {
            0 => SignatureAlgorithm::Rsa1024,
            1 => SignatureAlgorithm::Rsa2048,
            2 => SignatureAlgorithm::Rsa4096,
            _ => SignatureAlgorithm::Rsa8192,
        }
    }

    /// Hash half of the pair
    #[must_use]
    pub const fn hash(self) -> HashAlgorithm {
        match self.0 % 3 {
            0 => HashAlgorithm::Sha1,
            1 => HashAlgorithm::Sha256,
            _ => HashAlgorithm::Sha512,
        }
    }
}

// =============================================================================
// Key Ids
// =============================================================================

/// 16-byte identifier shared by a key and the signatures it makes
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct KeyId([u8; ID_SIZE]);

impl KeyId {
    /// Size of a key id in bytes
    pub const SIZE: usize = ID_SIZE;

    /// Id used by SHA-1 bare-hash keys
    pub const NONE_SHA1: Self = Self::prefixed(0x00, 0x01);
    /// Id used by SHA-256 bare-hash keys
    pub const NONE_SHA256: Self = Self::prefixed(0x02, 0x56);
    /// Id used by SHA-512 bare-hash keys
    pub const NONE_SHA512: Self = Self::prefixed(0x05, 0x12);

    const fn prefixed(a: u8, b: u8) -> Self {
        let mut bytes = [0u8; ID_SIZE];
        bytes[0] = a;
        bytes[1] = b;
        Self(bytes)
    }

    /// Create a key id from bytes
    #[must_use]
    pub const fn new(bytes: [u8; ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create a key id from a slice
    ///
    /// Returns `None` if the slice is not exactly 16 bytes.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; ID_SIZE] = slice.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Id of the bare-hash key for `hash_alg`
    #[must_use]
    pub const fn for_hash(hash_alg: HashAlgorithm) -> Option<Self> {
        match hash_alg {
            HashAlgorithm::None => None,
            HashAlgorithm::Sha1 => Some(Self::NONE_SHA1),
            HashAlgorithm::Sha256 => Some(Self::NONE_SHA256),
            HashAlgorithm::Sha512 => Some(Self::NONE_SHA512),
        }
    }

    /// Get the id bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }
}

impl AsRef<[u8]> for KeyId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId(")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}
