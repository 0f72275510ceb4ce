// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Library-wide constants

// =============================================================================
// Work Buffer
// =============================================================================

/// Alignment of every work buffer allocation, in bytes
pub const WORKBUF_ALIGN: usize = 16;

/// Smallest work buffer a boot context accepts
pub const WORKBUF_MIN_SIZE: usize = 256;

/// Work buffer size that comfortably fits firmware verification
/// with an RSA-8192 key
pub const WORKBUF_RECOMMENDED_SIZE: usize = 12 * 1024;

// =============================================================================
// Cryptographic Sizes
// =============================================================================

/// SHA-1 digest size in bytes
pub const SHA1_DIGEST_SIZE: usize = 20;

/// SHA-256 digest size in bytes
pub const SHA256_DIGEST_SIZE: usize = 32;

/// SHA-512 digest size in bytes
pub const SHA512_DIGEST_SIZE: usize = 64;

/// Largest digest produced by any supported hash
pub const MAX_DIGEST_SIZE: usize = SHA512_DIGEST_SIZE;

/// Largest RSA signature (RSA-8192) in bytes
pub const RSA_MAX_SIG_SIZE: usize = 1024;

/// Size of a key or signature id
pub const ID_SIZE: usize = 16;

// =============================================================================
// Versions
// =============================================================================

/// Largest key version that fits the combined version encoding
pub const MAX_KEY_VERSION: u32 = 0xffff;

/// Largest preamble version that fits the combined version encoding
pub const MAX_PREAMBLE_VERSION: u32 = 0xffff;

