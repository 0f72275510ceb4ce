// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! On-wire structure layouts
//!
//! All fields are native-endian. Structures are read by copying them out of
//! the source buffer, so a structure header itself has no alignment
//! requirement; only RSA key arrays, which are borrowed in place, must be
//! 32-bit aligned.
//!
//! # Legacy layout
//!
//! Fixed structures with explicit reserved words. Signatures and packed
//! keys embedded in a parent locate their data relative to their own start.
//!
//! # v2.1 layout
//!
//! Self-describing structures beginning with a [`CommonHeader`]. Member
//! offsets are relative to the start of the containing object.

use vb_common::{Error, KeyId};
use zerocopy::byteorder::native_endian::U64;
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};

use crate::common::{CommonHeader, HasCommonHeader, HeaderErrors};

// ============================================================================
// Magics and Versions
// ============================================================================

/// v2.1 packed key magic ("pkey")
pub const MAGIC_PACKED_KEY: u32 = 0x7965_6b70;
/// v2.1 private key magic ("vprk"); host-side only, never accepted here
pub const MAGIC_PRIVATE_KEY: u32 = 0x6b72_7076;
/// v2.1 signature magic ("sign")
pub const MAGIC_SIGNATURE: u32 = 0x6e67_6973;
/// v2.1 key block magic ("bkcb")
pub const MAGIC_KEYBLOCK: u32 = 0x6b63_6b62;
/// v2.1 firmware preamble magic ("pram")
pub const MAGIC_FW_PREAMBLE: u32 = 0x6d61_7270;

/// Major version of every v2.1 structure
pub const V21_VERSION_MAJOR: u16 = 3;
/// Minor version written by this library
pub const V21_VERSION_MINOR: u16 = 0;

/// Legacy key block magic
pub const KEYBLOCK_MAGIC: [u8; 8] = *b"CHROMEOS";
/// Legacy key block major version
pub const KEYBLOCK_VERSION_MAJOR: u32 = 2;
/// Legacy key block minor version
pub const KEYBLOCK_VERSION_MINOR: u32 = 1;

/// Legacy firmware preamble major version
pub const FW_PREAMBLE_VERSION_MAJOR: u32 = 2;
/// Legacy firmware preamble minor version
pub const FW_PREAMBLE_VERSION_MINOR: u32 = 1;

/// Legacy kernel preamble major version
pub const KERNEL_PREAMBLE_VERSION_MAJOR: u32 = 2;
/// Legacy kernel preamble minor version
pub const KERNEL_PREAMBLE_VERSION_MINOR: u32 = 2;

/// GBB magic
pub const GBB_MAGIC: [u8; 4] = *b"$GBB";
/// GBB major version
pub const GBB_VERSION_MAJOR: u16 = 1;
/// Lowest GBB minor version with the fields read here
pub const GBB_VERSION_MINOR_MIN: u16 = 1;

/// Key block flags
pub mod keyblock_flags {
    /// Valid when the developer switch is off
    pub const DEVELOPER_0: u32 = 0x0000_0001;
    /// Valid when the developer switch is on
    pub const DEVELOPER_1: u32 = 0x0000_0002;
    /// Valid in normal boot
    pub const RECOVERY_0: u32 = 0x0000_0004;
    /// Valid in recovery boot
    pub const RECOVERY_1: u32 = 0x0000_0008;
}

/// Firmware preamble flags
pub mod preamble_flags {
    /// Hash the body in software even if the host has an engine
    pub const DISALLOW_HWCRYPTO: u32 = 0x0000_0001;
}

/// GBB flags
pub mod gbb_flags {
    /// Treat the developer switch as on
    pub const FORCE_DEV_SWITCH_ON: u32 = 1 << 3;
    /// Do not enforce firmware rollback
    pub const DISABLE_FW_ROLLBACK_CHECK: u32 = 1 << 5;
}

// ============================================================================
// Legacy Structures
// ============================================================================

/// Legacy packed key header
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct PackedKey {
    /// Key data offset, relative to this header
    pub key_offset: u32,
    /// Reserved
    pub reserved0: u32,
    /// Key data size
    pub key_size: u32,
    /// Reserved
    pub reserved1: u32,
    /// Combined crypto algorithm
    pub algorithm: u32,
    /// Reserved
    pub reserved2: u32,
    /// Key version
    pub key_version: u32,
    /// Reserved
    pub reserved3: u32,
}

impl PackedKey {
    /// Size on the wire
    pub const SIZE: usize = 32;
}

/// Legacy signature header
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct Signature {
    /// Signature data offset, relative to this header
    pub sig_offset: u32,
    /// Reserved
    pub reserved0: u32,
    /// Signature size
    pub sig_size: u32,
    /// Reserved
    pub reserved1: u32,
    /// Number of bytes covered, from the start of the parent
    pub data_size: u32,
    /// Reserved
    pub reserved2: u32,
}

impl Signature {
    /// Size on the wire
    pub const SIZE: usize = 24;
}

/// Legacy key block header
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct Keyblock {
    /// `"CHROMEOS"`
    pub magic: [u8; 8],
    /// Major version
    pub header_version_major: u32,
    /// Minor version
    pub header_version_minor: u32,
    /// Size of the whole key block
    pub keyblock_size: u32,
    /// Reserved
    pub reserved0: u32,
    /// RSA signature by the parent key
    pub keyblock_signature: Signature,
    /// SHA-512 of the same range, for self-signed images
    pub keyblock_hash: Signature,
    /// Boot-mode flags
    pub keyblock_flags: u32,
    /// Reserved
    pub reserved1: u32,
    /// Key this block vouches for
    pub data_key: PackedKey,
}

impl Keyblock {
    /// Size on the wire
    pub const SIZE: usize = 112;
    /// Offset of `keyblock_signature`
    pub const SIGNATURE_OFFSET: usize = 24;
    /// Offset of `keyblock_hash`
    pub const HASH_OFFSET: usize = 48;
    /// Offset of `data_key`
    pub const DATA_KEY_OFFSET: usize = 80;
}

/// Legacy firmware preamble header
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct FwPreamble {
    /// Size of the whole preamble
    pub preamble_size: u32,
    /// Reserved
    pub reserved0: u32,
    /// Signature over the preamble
    pub preamble_signature: Signature,
    /// Major version
    pub header_version_major: u32,
    /// Minor version
    pub header_version_minor: u32,
    /// Firmware version
    pub firmware_version: u32,
    /// Reserved
    pub reserved1: u32,
    /// Key for verifying kernel key blocks
    pub kernel_subkey: PackedKey,
    /// Signature over the firmware body
    pub body_signature: Signature,
    /// Flags; present from minor 1
    pub raw_flags: u32,
}

impl FwPreamble {
    /// Size on the wire
    pub const SIZE: usize = 108;
    /// Offset of `preamble_signature`
    pub const SIGNATURE_OFFSET: usize = 8;
    /// Offset of `kernel_subkey`
    pub const KERNEL_SUBKEY_OFFSET: usize = 48;
    /// Offset of `body_signature`
    pub const BODY_SIGNATURE_OFFSET: usize = 80;

    /// Preamble flags, or 0 for headers older than 2.1
    #[must_use]
    pub const fn flags(&self) -> u32 {
        if self.header_version_minor < 1 {
            0
        } else {
            self.raw_flags
        }
    }
}

/// Legacy kernel preamble header
///
/// Version 2.0 ends after `body_signature`, 2.1 adds the vmlinuz header and
/// 2.2 adds flags. Read the optional fields through the accessors.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct KernelPreamble {
    /// Size of the whole preamble
    pub preamble_size: u32,
    /// Reserved
    pub reserved0: u32,
    /// Signature over the preamble
    pub preamble_signature: Signature,
    /// Major version
    pub header_version_major: u32,
    /// Minor version
    pub header_version_minor: u32,
    /// Kernel version
    pub kernel_version: u32,
    /// Reserved
    pub reserved1: u32,
    /// Where the body is loaded
    pub body_load_address: U64,
    /// Where the bootloader sits once the body is loaded
    pub bootloader_address: U64,
    /// Bootloader size
    pub bootloader_size: u32,
    /// Reserved
    pub reserved2: u32,
    /// Signature over the kernel body
    pub body_signature: Signature,
    /// vmlinuz header address; present from minor 1
    pub raw_vmlinuz_header_address: U64,
    /// vmlinuz header size; present from minor 1
    pub raw_vmlinuz_header_size: u32,
    /// Reserved
    pub reserved3: u32,
    /// Flags; present from minor 2
    pub raw_flags: u32,
}

impl KernelPreamble {
    /// Size of a 2.0 header
    pub const SIZE_2_0: usize = 96;
    /// Size of a 2.1 header
    pub const SIZE_2_1: usize = 112;
    /// Size of a 2.2 header
    pub const SIZE: usize = 116;
    /// Offset of `preamble_signature`
    pub const SIGNATURE_OFFSET: usize = 8;
    /// Offset of `body_signature`
    pub const BODY_SIGNATURE_OFFSET: usize = 72;

    /// Header size required for a given minor version
    #[must_use]
    pub const fn min_size(minor: u32) -> usize {
        match minor {
            0 => Self::SIZE_2_0,
            1 => Self::SIZE_2_1,
            _ => Self::SIZE,
        }
    }

    /// Read a header of any minor version
    ///
    /// Fields past the end of `buf` read as zero.
    #[must_use]
    pub fn read_partial(buf: &[u8]) -> Self {
        let mut value = Self::new_zeroed();
        let len = buf.len().min(Self::SIZE);
        value.as_mut_bytes()[..len].copy_from_slice(&buf[..len]);
        value
    }

    /// Body load address
    #[must_use]
    pub fn body_load_address(&self) -> u64 {
        self.body_load_address.get()
    }

    /// Bootloader address
    #[must_use]
    pub fn bootloader_address(&self) -> u64 {
        self.bootloader_address.get()
    }

    /// vmlinuz header address and size, or zeros before 2.1
    #[must_use]
    pub fn vmlinuz_header(&self) -> (u64, u32) {
        if self.header_version_minor < 1 {
            (0, 0)
        } else {
            (self.raw_vmlinuz_header_address.get(), self.raw_vmlinuz_header_size)
        }
    }

    /// Flags, or 0 before 2.2
    #[must_use]
    pub const fn flags(&self) -> u32 {
        if self.header_version_minor < 2 {
            0
        } else {
            self.raw_flags
        }
    }
}

/// Google Binary Block header
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct GbbHeader {
    /// `"$GBB"`
    pub signature: [u8; 4],
    /// Major version
    pub major_version: u16,
    /// Minor version
    pub minor_version: u16,
    /// Header size
    pub header_size: u32,
    /// Flags
    pub flags: u32,
    /// Hardware id offset
    pub hwid_offset: u32,
    /// Hardware id size
    pub hwid_size: u32,
    /// Root key offset
    pub rootkey_offset: u32,
    /// Root key size
    pub rootkey_size: u32,
    /// Bitmap volume offset
    pub bmpfv_offset: u32,
    /// Bitmap volume size
    pub bmpfv_size: u32,
    /// Recovery key offset
    pub recovery_key_offset: u32,
    /// Recovery key size
    pub recovery_key_size: u32,
    /// Reserved
    pub pad: [u8; 80],
}

impl GbbHeader {
    /// Size on the wire
    pub const SIZE: usize = 128;
}

// ============================================================================
// v2.1 Structures
// ============================================================================

/// v2.1 packed key
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct V21PackedKey {
    /// Common header
    pub c: CommonHeader,
    /// Key data offset
    pub key_offset: u32,
    /// Key data size
    pub key_size: u32,
    /// Signature algorithm
    pub sig_alg: u16,
    /// Hash algorithm
    pub hash_alg: u16,
    /// Key version
    pub key_version: u32,
    /// Key id
    pub id: [u8; 16],
}

impl V21PackedKey {
    /// Size on the wire
    pub const SIZE: usize = 52;

    /// Key id
    #[must_use]
    pub const fn key_id(&self) -> KeyId {
        KeyId::new(self.id)
    }
}

/// v2.1 signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct V21Signature {
    /// Common header
    pub c: CommonHeader,
    /// Signature data offset
    pub sig_offset: u32,
    /// Signature data size
    pub sig_size: u32,
    /// Number of bytes covered
    pub data_size: u32,
    /// Signature algorithm
    pub sig_alg: u16,
    /// Hash algorithm
    pub hash_alg: u16,
    /// Id of the signing key, or of the bare hash
    pub id: [u8; 16],
}

impl V21Signature {
    /// Size on the wire
    pub const SIZE: usize = 52;

    /// Signer id
    #[must_use]
    pub const fn key_id(&self) -> KeyId {
        KeyId::new(self.id)
    }
}

/// v2.1 key block
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct V21Keyblock {
    /// Common header
    pub c: CommonHeader,
    /// Boot-mode flags
    pub flags: u32,
    /// Offset of the data key
    pub key_offset: u32,
    /// Number of signatures
    pub sig_count: u32,
    /// Offset of the first signature; also the signed size
    pub sig_offset: u32,
}

impl V21Keyblock {
    /// Size on the wire
    pub const SIZE: usize = 36;
}

/// v2.1 firmware preamble
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct V21FwPreamble {
    /// Common header
    pub c: CommonHeader,
    /// Preamble flags
    pub flags: u32,
    /// Firmware version
    pub fw_version: u32,
    /// Number of body hashes
    pub hash_count: u32,
    /// Offset of the first body hash
    pub hash_offset: u32,
    /// Offset of the preamble signature; also the signed size
    pub sig_offset: u32,
}

impl V21FwPreamble {
    /// Size on the wire
    pub const SIZE: usize = 40;
}

impl HasCommonHeader for V21PackedKey {
    const MAGIC: u32 = MAGIC_PACKED_KEY;
    const VERSION_MAJOR: u16 = V21_VERSION_MAJOR;
    const ERRORS: HeaderErrors = HeaderErrors {
        magic: Error::UnpackKeyStructVersion,
        version: Error::UnpackKeyStructVersion,
        fixed_size: Error::UnpackKeyFixedSize,
    };

    fn common(&self) -> &CommonHeader {
        &self.c
    }
}

impl HasCommonHeader for V21Signature {
    const MAGIC: u32 = MAGIC_SIGNATURE;
    const VERSION_MAJOR: u16 = V21_VERSION_MAJOR;
    const ERRORS: HeaderErrors = HeaderErrors {
        magic: Error::SigMagic,
        version: Error::SigVersion,
        fixed_size: Error::SigHeaderSize,
    };

    fn common(&self) -> &CommonHeader {
        &self.c
    }
}

impl HasCommonHeader for V21Keyblock {
    const MAGIC: u32 = MAGIC_KEYBLOCK;
    const VERSION_MAJOR: u16 = V21_VERSION_MAJOR;
    const ERRORS: HeaderErrors = HeaderErrors {
        magic: Error::KeyblockMagic,
        version: Error::KeyblockHeaderVersion,
        fixed_size: Error::KeyblockSize,
    };

    fn common(&self) -> &CommonHeader {
        &self.c
    }
}

impl HasCommonHeader for V21FwPreamble {
    const MAGIC: u32 = MAGIC_FW_PREAMBLE;
    const VERSION_MAJOR: u16 = V21_VERSION_MAJOR;
    const ERRORS: HeaderErrors = HeaderErrors {
        magic: Error::PreambleMagic,
        version: Error::PreambleHeaderVersion,
        fixed_size: Error::PreambleSize,
    };

    fn common(&self) -> &CommonHeader {
        &self.c
    }
}

/// Wire format of an object, decided once from its first bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WireFormat {
    /// Fixed-layout structures
    #[default]
    Legacy,
    /// Common-header structures
    V21,
}

impl WireFormat {
    /// Detect the format of an object from its leading bytes
    ///
    /// Anything that does not start with `v21_magic` is treated as legacy.
    #[must_use]
    pub fn detect(buf: &[u8], v21_magic: u32) -> Self {
        match buf.get(..4).and_then(|b| u32::read_from_bytes(b).ok()) {
            Some(magic) if magic == v21_magic => Self::V21,
            _ => Self::Legacy,
        }
    }
}
