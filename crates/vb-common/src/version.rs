// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Combined rollback versions
//!
//! Anti-rollback state stores one 32-bit value per image type: the signing
//! key version in the upper 16 bits and the image (preamble) version in the
//! lower 16 bits. Comparing combined values orders first by key version and
//! then by image version, so a key rotation always moves forward even if
//! the image version resets.

use core::cmp::Ordering;
use core::fmt;

use crate::constants::{MAX_KEY_VERSION, MAX_PREAMBLE_VERSION};

/// Key version and image version packed as `(key << 16) | image`
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Version {
    /// Signing key version
    pub key: u16,
    /// Image version from the preamble
    pub image: u16,
}

impl Version {
    /// Version 0.0
    pub const ZERO: Self = Self::new(0, 0);

    /// Create a new version
    #[must_use]
    pub const fn new(key: u16, image: u16) -> Self {
        Self { key, image }
    }

    /// Build from raw 32-bit wire fields
    ///
    /// Returns `None` if either half does not fit in 16 bits.
    #[must_use]
    pub const fn from_parts(key_version: u32, image_version: u32) -> Option<Self> {
        if key_version > MAX_KEY_VERSION || image_version > MAX_PREAMBLE_VERSION {
            return None;
        }
        Some(Self::new(key_version as u16, image_version as u16))
    }

    /// Check that a raw key version fits in the combined encoding
    #[must_use]
    pub const fn key_in_range(key_version: u32) -> bool {
        key_version <= MAX_KEY_VERSION
    }

    /// Check that a raw image version fits in the combined encoding
    #[must_use]
    pub const fn image_in_range(image_version: u32) -> bool {
        image_version <= MAX_PREAMBLE_VERSION
    }

    /// Combined 32-bit value as stored in secure data
    #[must_use]
    pub const fn combined(&self) -> u32 {
        ((self.key as u32) << 16) | (self.image as u32)
    }

    /// Split a stored combined value
    #[must_use]
    pub const fn from_combined(value: u32) -> Self {
        Self {
            key: (value >> 16) as u16,
            image: (value & 0xffff) as u16,
        }
    }

    /// Key version half of a stored combined value
    #[must_use]
    pub const fn key_of(combined: u32) -> u32 {
        combined >> 16
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.combined().cmp(&other.combined())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({}.{} = 0x{:08x})", self.key, self.image, self.combined())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.key, self.image)
    }
}
