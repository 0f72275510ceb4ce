// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! vb-rs Cryptographic Engine
//!
//! Everything the verifiers need from cryptography, and nothing else:
//!
//! - SHA-1, SHA-256 and SHA-512 digests, with optional hardware offload
//! - RSA-1024 through RSA-8192 PKCS#1 v1.5 verification (e = 65537)
//! - Constant-time comparison of bare hashes
//!
//! There is no signing, no key generation and no randomness. All scratch
//! memory comes from the caller's work buffer.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::needless_range_loop)]

pub mod error;
pub mod hash;
pub mod rsa;
pub mod traits;

pub use error::{CryptoError, CryptoResult};
pub use hash::{digest_buffer, DigestContext, StreamingDigest};
pub use rsa::{RsaPublicKey, RSA_MAX_SIG_SIZE};
pub use traits::{constant_time_eq, Hash, HwCrypto, NoHwCrypto};
