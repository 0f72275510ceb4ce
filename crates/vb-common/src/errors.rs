// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Error types for the verified-boot library
//!
//! Every failure has a stable 32-bit code. Codes are grouped into families
//! so that a recovery subcode (the low byte of the code) together with the
//! family identifies the exact check that rejected an image.

use core::fmt;

/// Result type alias for verified-boot operations
pub type Result<T> = core::result::Result<T, Error>;

/// Base value shared by every error code
pub const ERROR_BASE: u32 = 0x1000_0000;

/// Error code families
pub mod family {
    use super::ERROR_BASE;

    /// SHA digest engine
    pub const SHA: u32 = ERROR_BASE + 0x01_0000;
    /// RSA verification
    pub const RSA: u32 = ERROR_BASE + 0x02_0000;
    /// Common header and member containment checks
    pub const COMMON: u32 = ERROR_BASE + 0x05_0000;
    /// Key unpacking
    pub const UNPACK_KEY: u32 = ERROR_BASE + 0x06_0000;
    /// Key block verification
    pub const KEYBLOCK: u32 = ERROR_BASE + 0x07_0000;
    /// Preamble verification
    pub const PREAMBLE: u32 = ERROR_BASE + 0x08_0000;
    /// Miscellaneous boot-flow checks
    pub const MISC: u32 = ERROR_BASE + 0x09_0000;
    /// Public API misuse
    pub const API: u32 = ERROR_BASE + 0x0a_0000;
    /// Signature and data verification
    pub const SIG: u32 = ERROR_BASE + 0x0b_0000;
    /// Errors raised by host callbacks
    pub const EX: u32 = ERROR_BASE + 0x0c_0000;
}

/// Unified error type for the verified-boot library
///
/// Variants are ordered by family. Within a family the discriminant order
/// matches the numeric code order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Error {
    /// Unclassified failure
    Unknown,

    // =========================================================================
    // SHA Errors
    // =========================================================================
    /// Digest init with an unsupported hash algorithm
    ShaInitAlgorithm,
    /// Digest extend on a context with an unsupported algorithm
    ShaExtendAlgorithm,
    /// Digest finalize on a context with an unsupported algorithm
    ShaFinalizeAlgorithm,
    /// Digest output buffer too small
    ShaFinalizeDigestSize,

    // =========================================================================
    // RSA Errors
    // =========================================================================
    /// Key signature algorithm is not an RSA algorithm
    RsaVerifyAlgorithm,
    /// Key array size does not match the signature size
    RsaVerifySigLen,
    /// Not enough work buffer for the modular exponentiation
    RsaVerifyWorkbuf,
    /// Decrypted signature does not match the digest
    RsaVerifyDigest,
    /// PKCS#1 v1.5 padding is wrong
    RsaPadding,

    // =========================================================================
    // Containment Errors
    // =========================================================================
    /// Parent size wraps
    InsideParentWraps,
    /// Member offset plus size wraps
    InsideMemberWraps,
    /// Member lies outside the parent
    InsideMemberOutside,
    /// Member data offset plus size wraps
    InsideDataWraps,
    /// Member data lies outside the parent
    InsideDataOutside,
    /// Total size of a common-header object exceeds the buffer
    CommonTotalSize,
    /// Fixed size is smaller than the header or larger than the total
    CommonFixedSize,
    /// Total size is not 32-bit aligned
    CommonTotalUnaligned,
    /// Fixed size is not 32-bit aligned
    CommonFixedUnaligned,
    /// Description size is not 32-bit aligned
    CommonDescUnaligned,
    /// Description end wraps
    CommonDescWraps,
    /// Description extends past the total size
    CommonDescSize,
    /// Description is not NUL-terminated
    CommonDescTerminator,
    /// Member offset plus size wraps
    CommonMemberWraps,
    /// Member offset or size is not 32-bit aligned
    CommonMemberUnaligned,
    /// Member overlaps the fixed header, description or a previous member
    CommonMemberOverlap,
    /// Member extends past the total size
    CommonMemberSize,

    // =========================================================================
    // Key Unpacking Errors
    // =========================================================================
    /// Key data size does not match the signature algorithm
    UnpackKeySize,
    /// Key data is not 32-bit aligned
    UnpackKeyAlign,
    /// Key array size does not match the signature algorithm
    UnpackKeyArraySize,
    /// Unsupported packed key major version
    UnpackKeyStructVersion,
    /// Unsupported hash algorithm
    UnpackKeyHashAlgorithm,
    /// Unsupported signature algorithm
    UnpackKeySigAlgorithm,
    /// Fixed part of a packed key is too small
    UnpackKeyFixedSize,
    /// Legacy key algorithm out of range
    UnpackKeyBadAlgorithm,
    /// Legacy key data is malformed
    UnpackKeyBadKey,
    /// Legacy key data is not 32-bit aligned
    UnpackKeyBufferUnaligned,

    // =========================================================================
    // Key Block Errors
    // =========================================================================
    /// Buffer too small for the fixed key block header
    KeyblockTooSmallForHeader,
    /// Bad key block magic
    KeyblockMagic,
    /// Unsupported key block major version
    KeyblockHeaderVersion,
    /// Not enough data for the key block
    KeyblockSize,
    /// Signature lies outside the key block
    KeyblockSigOutside,
    /// Signature covers more than the key block
    KeyblockSignedTooMuch,
    /// Data key lies outside the key block or the signed data
    KeyblockDataKeyOutside,
    /// Key block signature did not verify
    KeyblockSigInvalid,
    /// Signature does not cover the fixed key block header
    KeyblockSignedTooLittle,
    /// Signed size does not stop at the signature table
    KeyblockSignedSize,
    /// No signature matches the verification key id
    KeyblockSigId,

    // =========================================================================
    // Preamble Errors
    // =========================================================================
    /// Buffer too small for the fixed preamble header
    PreambleTooSmallForHeader,
    /// Unsupported preamble major version
    PreambleHeaderVersion,
    /// Preamble minor version too old
    PreambleHeaderOld,
    /// Not enough data for the preamble
    PreambleSize,
    /// Signature lies outside the preamble
    PreambleSigOutside,
    /// Signature covers more than the preamble
    PreambleSignedTooMuch,
    /// Preamble signature did not verify
    PreambleSigInvalid,
    /// Signature does not cover the fixed preamble header
    PreambleSignedTooLittle,
    /// Body signature lies outside the signed preamble
    PreambleBodySigOutside,
    /// Kernel subkey lies outside the signed preamble
    PreambleKernelSubkeyOutside,
    /// Bootloader lies outside the kernel body
    PreambleBootloaderOutside,
    /// Vmlinuz header lies outside the kernel body
    PreambleVmlinuzHeaderOutside,
    /// Bad preamble magic
    PreambleMagic,
    /// A body hash entry is signed instead of a bare hash
    PreambleHashSigned,

    // =========================================================================
    // Miscellaneous Errors
    // =========================================================================
    /// Work buffer too small to create a context
    InitctxWorkbufSmall,
    /// Work buffer not aligned for a context
    InitctxWorkbufAlign,
    /// Work buffer allocation failed
    WorkbufTooSmall,
    /// Bad GBB magic
    GbbMagic,
    /// Unsupported GBB major version
    GbbVersion,
    /// GBB minor version too old
    GbbTooOld,
    /// GBB header size too small
    GbbHeaderSize,
    /// Not enough work buffer for the GBB header
    GbbWorkbuf,
    /// Not enough work buffer for the root key
    FwKeyblockWorkbufRootKey,
    /// Not enough work buffer for a vblock object
    ReadResourceObjectBuf,
    /// Firmware key block key version out of range
    FwKeyblockVersionRange,
    /// Firmware key block key version rolled back
    FwKeyblockVersionRollback,
    /// No firmware data key in the work buffer
    FwPreambleDataKey,
    /// Firmware version out of range
    FwPreambleVersionRange,
    /// Firmware version rolled back
    FwPreambleVersionRollback,
    /// Kernel key block dev flag does not match the boot mode
    KernelKeyblockDevFlag,
    /// Kernel key block recovery flag does not match the boot mode
    KernelKeyblockRecFlag,
    /// Kernel key block key version out of range
    KernelKeyblockVersionRange,
    /// Kernel key block key version rolled back
    KernelKeyblockVersionRollback,
    /// No kernel data key in the work buffer
    KernelPreambleDataKey,
    /// Kernel version out of range
    KernelPreambleVersionRange,
    /// Kernel version rolled back
    KernelPreambleVersionRollback,
    /// No kernel preamble in the work buffer
    KernelDataPreamble,
    /// Kernel body size differs from the signed size
    KernelDataSize,
    /// No kernel data key in the work buffer
    KernelDataKey,

    // =========================================================================
    // API Errors
    // =========================================================================
    /// Phase 1 decided to boot recovery
    ApiPhase1Recovery,
    /// Unsupported hash tag
    ApiInitHashTag,
    /// No firmware preamble loaded
    ApiInitHashPreamble,
    /// No data key loaded
    ApiInitHashDataKey,
    /// No preamble hash matches the requested id
    ApiInitHashId,
    /// Extend called without an active hash
    ApiExtendHashWorkbuf,
    /// Extend size is zero or exceeds the remaining size
    ApiExtendHashSize,
    /// No firmware preamble loaded
    ApiCheckHashPreamble,
    /// Check called without an active hash
    ApiCheckHashWorkbuf,
    /// Not all body data has been hashed
    ApiCheckHashSize,
    /// Not enough work buffer for the body digest
    ApiCheckHashWorkbufDigest,
    /// Unsupported hash tag
    ApiCheckHashTag,
    /// No data key loaded
    ApiCheckHashDataKey,
    /// Body digest does not match the preamble hash
    ApiCheckHashSig,
    /// No firmware preamble loaded for the kernel subkey
    ApiKphase1Preamble,
    /// Not enough work buffer for the kernel key
    ApiKphase1Workbuf,

    // =========================================================================
    // Signature Errors
    // =========================================================================
    /// Bad signature magic
    SigMagic,
    /// Unsupported signature major version
    SigVersion,
    /// Fixed part of a signature is too small
    SigHeaderSize,
    /// Unsupported signature algorithm pair
    SigAlgorithm,
    /// Signature size does not match the algorithm pair
    SigSize,
    /// Key has no usable algorithm
    VdataAlgorithm,
    /// Signature and key algorithms differ
    VdataAlgorithmMismatch,
    /// Signature size does not match the key
    VdataSigSize,
    /// Signature covers more data than was supplied
    VdataNotEnoughData,
    /// Signed size differs from the supplied data size
    VdataSize,
    /// Key hash algorithm has no digest size
    VdataDigestSize,
    /// Not enough work buffer for the digest
    VdataWorkbufDigest,
    /// Bare hash does not match
    VdataVerifyDigest,

    // =========================================================================
    // Host Callback Errors
    // =========================================================================
    /// Unknown resource index
    ExReadResourceIndex,
    /// Resource read out of range
    ExReadResourceSize,
    /// Hardware crypto cannot handle the request; use software
    ExHwCryptoUnsupported,
    /// TPM owner clear failed
    ExTpmClearOwner,
}

impl Error {
    /// Get the numeric code for this error
    ///
    /// Codes are `ERROR_BASE + family + index`. See [`family`].
    #[must_use]
    pub const fn code(&self) -> u32 {
        use family::{API, COMMON, EX, KEYBLOCK, MISC, PREAMBLE, RSA, SHA, SIG, UNPACK_KEY};
        match self {
            Self::Unknown => ERROR_BASE + 1,

            Self::ShaInitAlgorithm => SHA + 1,
            Self::ShaExtendAlgorithm => SHA + 2,
            Self::ShaFinalizeAlgorithm => SHA + 3,
            Self::ShaFinalizeDigestSize => SHA + 4,

            Self::RsaVerifyAlgorithm => RSA + 1,
            Self::RsaVerifySigLen => RSA + 2,
            Self::RsaVerifyWorkbuf => RSA + 3,
            Self::RsaVerifyDigest => RSA + 4,
            Self::RsaPadding => RSA + 5,

            Self::InsideParentWraps => COMMON + 1,
            Self::InsideMemberWraps => COMMON + 2,
            Self::InsideMemberOutside => COMMON + 3,
            Self::InsideDataWraps => COMMON + 4,
            Self::InsideDataOutside => COMMON + 5,
            Self::CommonTotalSize => COMMON + 0x10,
            Self::CommonFixedSize => COMMON + 0x11,
            Self::CommonTotalUnaligned => COMMON + 0x12,
            Self::CommonFixedUnaligned => COMMON + 0x13,
            Self::CommonDescUnaligned => COMMON + 0x14,
            Self::CommonDescWraps => COMMON + 0x15,
            Self::CommonDescSize => COMMON + 0x16,
            Self::CommonDescTerminator => COMMON + 0x17,
            Self::CommonMemberWraps => COMMON + 0x18,
            Self::CommonMemberUnaligned => COMMON + 0x19,
            Self::CommonMemberOverlap => COMMON + 0x1a,
            Self::CommonMemberSize => COMMON + 0x1b,

            Self::UnpackKeySize => UNPACK_KEY + 1,
            Self::UnpackKeyAlign => UNPACK_KEY + 2,
            Self::UnpackKeyArraySize => UNPACK_KEY + 3,
            Self::UnpackKeyStructVersion => UNPACK_KEY + 4,
            Self::UnpackKeyHashAlgorithm => UNPACK_KEY + 5,
            Self::UnpackKeySigAlgorithm => UNPACK_KEY + 6,
            Self::UnpackKeyFixedSize => UNPACK_KEY + 7,
            Self::UnpackKeyBadAlgorithm => UNPACK_KEY + 8,
            Self::UnpackKeyBadKey => UNPACK_KEY + 9,
            Self::UnpackKeyBufferUnaligned => UNPACK_KEY + 0xa,

            Self::KeyblockTooSmallForHeader => KEYBLOCK + 1,
            Self::KeyblockMagic => KEYBLOCK + 2,
            Self::KeyblockHeaderVersion => KEYBLOCK + 3,
            Self::KeyblockSize => KEYBLOCK + 4,
            Self::KeyblockSigOutside => KEYBLOCK + 5,
            Self::KeyblockSignedTooMuch => KEYBLOCK + 6,
            Self::KeyblockDataKeyOutside => KEYBLOCK + 7,
            Self::KeyblockSigInvalid => KEYBLOCK + 8,
            Self::KeyblockSignedTooLittle => KEYBLOCK + 9,
            Self::KeyblockSignedSize => KEYBLOCK + 0xa,
            Self::KeyblockSigId => KEYBLOCK + 0xb,

            Self::PreambleTooSmallForHeader => PREAMBLE + 1,
            Self::PreambleHeaderVersion => PREAMBLE + 2,
            Self::PreambleHeaderOld => PREAMBLE + 3,
            Self::PreambleSize => PREAMBLE + 4,
            Self::PreambleSigOutside => PREAMBLE + 5,
            Self::PreambleSignedTooMuch => PREAMBLE + 6,
            Self::PreambleSigInvalid => PREAMBLE + 7,
            Self::PreambleSignedTooLittle => PREAMBLE + 8,
            Self::PreambleBodySigOutside => PREAMBLE + 9,
            Self::PreambleKernelSubkeyOutside => PREAMBLE + 0xa,
            Self::PreambleBootloaderOutside => PREAMBLE + 0xb,
            Self::PreambleVmlinuzHeaderOutside => PREAMBLE + 0xc,
            Self::PreambleMagic => PREAMBLE + 0xd,
            Self::PreambleHashSigned => PREAMBLE + 0xe,

            Self::InitctxWorkbufSmall => MISC + 1,
            Self::InitctxWorkbufAlign => MISC + 2,
            Self::WorkbufTooSmall => MISC + 3,
            Self::GbbMagic => MISC + 4,
            Self::GbbVersion => MISC + 5,
            Self::GbbTooOld => MISC + 6,
            Self::GbbHeaderSize => MISC + 7,
            Self::GbbWorkbuf => MISC + 8,
            Self::FwKeyblockWorkbufRootKey => MISC + 9,
            Self::ReadResourceObjectBuf => MISC + 0xa,
            Self::FwKeyblockVersionRange => MISC + 0xb,
            Self::FwKeyblockVersionRollback => MISC + 0xc,
            Self::FwPreambleDataKey => MISC + 0xd,
            Self::FwPreambleVersionRange => MISC + 0xe,
            Self::FwPreambleVersionRollback => MISC + 0xf,
            Self::KernelKeyblockDevFlag => MISC + 0x10,
            Self::KernelKeyblockRecFlag => MISC + 0x11,
            Self::KernelKeyblockVersionRange => MISC + 0x12,
            Self::KernelKeyblockVersionRollback => MISC + 0x13,
            Self::KernelPreambleDataKey => MISC + 0x14,
            Self::KernelPreambleVersionRange => MISC + 0x15,
            Self::KernelPreambleVersionRollback => MISC + 0x16,
            Self::KernelDataPreamble => MISC + 0x17,
            Self::KernelDataSize => MISC + 0x18,
            Self::KernelDataKey => MISC + 0x19,

            Self::ApiPhase1Recovery => API + 1,
            Self::ApiInitHashTag => API + 2,
            Self::ApiInitHashPreamble => API + 3,
            Self::ApiInitHashDataKey => API + 4,
            Self::ApiInitHashId => API + 5,
            Self::ApiExtendHashWorkbuf => API + 6,
            Self::ApiExtendHashSize => API + 7,
            Self::ApiCheckHashPreamble => API + 8,
            Self::ApiCheckHashWorkbuf => API + 9,
            Self::ApiCheckHashSize => API + 0xa,
            Self::ApiCheckHashWorkbufDigest => API + 0xb,
            Self::ApiCheckHashTag => API + 0xc,
            Self::ApiCheckHashDataKey => API + 0xd,
            Self::ApiCheckHashSig => API + 0xe,
            Self::ApiKphase1Preamble => API + 0xf,
            Self::ApiKphase1Workbuf => API + 0x10,

            Self::SigMagic => SIG + 1,
            Self::SigVersion => SIG + 2,
            Self::SigHeaderSize => SIG + 3,
            Self::SigAlgorithm => SIG + 4,
            Self::SigSize => SIG + 5,
            Self::VdataAlgorithm => SIG + 0x10,
            Self::VdataAlgorithmMismatch => SIG + 0x11,
            Self::VdataSigSize => SIG + 0x12,
            Self::VdataNotEnoughData => SIG + 0x13,
            Self::VdataSize => SIG + 0x14,
            Self::VdataDigestSize => SIG + 0x15,
            Self::VdataWorkbufDigest => SIG + 0x16,
            Self::VdataVerifyDigest => SIG + 0x17,

            Self::ExReadResourceIndex => EX + 1,
            Self::ExReadResourceSize => EX + 2,
            Self::ExHwCryptoUnsupported => EX + 3,
            Self::ExTpmClearOwner => EX + 4,
        }
    }

    /// Family base of this error's code
    #[must_use]
    pub const fn family(&self) -> u32 {
        self.code() & 0xffff_0000
    }

    /// Subcode recorded alongside a recovery reason
    #[must_use]
    pub const fn recovery_subcode(&self) -> u8 {
        (self.code() & 0xff) as u8
    }

    /// Check if the error means the host should fall back to software
    #[must_use]
    pub const fn is_hwcrypto_unsupported(&self) -> bool {
        matches!(self, Self::ExHwCryptoUnsupported)
    }

    /// Get a short description of the error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown error",
            Self::ShaInitAlgorithm => "digest init: bad algorithm",
            Self::ShaExtendAlgorithm => "digest extend: bad algorithm",
            Self::ShaFinalizeAlgorithm => "digest finalize: bad algorithm",
            Self::ShaFinalizeDigestSize => "digest finalize: output too small",
            Self::RsaVerifyAlgorithm => "RSA verify: bad algorithm",
            Self::RsaVerifySigLen => "RSA verify: key size mismatch",
            Self::RsaVerifyWorkbuf => "RSA verify: work buffer too small",
            Self::RsaVerifyDigest => "RSA verify: digest mismatch",
            Self::RsaPadding => "RSA verify: bad padding",
            Self::InsideParentWraps => "parent size wraps",
            Self::InsideMemberWraps => "member wraps",
            Self::InsideMemberOutside => "member outside parent",
            Self::InsideDataWraps => "member data wraps",
            Self::InsideDataOutside => "member data outside parent",
            Self::CommonTotalSize => "total size exceeds buffer",
            Self::CommonFixedSize => "bad fixed size",
            Self::CommonTotalUnaligned => "total size unaligned",
            Self::CommonFixedUnaligned => "fixed size unaligned",
            Self::CommonDescUnaligned => "description size unaligned",
            Self::CommonDescWraps => "description wraps",
            Self::CommonDescSize => "description outside object",
            Self::CommonDescTerminator => "description not terminated",
            Self::CommonMemberWraps => "member wraps",
            Self::CommonMemberUnaligned => "member unaligned",
            Self::CommonMemberOverlap => "member overlaps",
            Self::CommonMemberSize => "member outside object",
            Self::UnpackKeySize => "unpack key: bad key size",
            Self::UnpackKeyAlign => "unpack key: key data unaligned",
            Self::UnpackKeyArraySize => "unpack key: bad array size",
            Self::UnpackKeyStructVersion => "unpack key: bad struct version",
            Self::UnpackKeyHashAlgorithm => "unpack key: bad hash algorithm",
            Self::UnpackKeySigAlgorithm => "unpack key: bad signature algorithm",
            Self::UnpackKeyFixedSize => "unpack key: fixed size too small",
            Self::UnpackKeyBadAlgorithm => "unpack key: algorithm out of range",
            Self::UnpackKeyBadKey => "unpack key: malformed key",
            Self::UnpackKeyBufferUnaligned => "unpack key: buffer unaligned",
            Self::KeyblockTooSmallForHeader => "key block: too small for header",
            Self::KeyblockMagic => "key block: bad magic",
            Self::KeyblockHeaderVersion => "key block: bad header version",
            Self::KeyblockSize => "key block: not enough data",
            Self::KeyblockSigOutside => "key block: signature outside",
            Self::KeyblockSignedTooMuch => "key block: signed too much",
            Self::KeyblockDataKeyOutside => "key block: data key outside",
            Self::KeyblockSigInvalid => "key block: signature invalid",
            Self::KeyblockSignedTooLittle => "key block: signed too little",
            Self::KeyblockSignedSize => "key block: bad signed size",
            Self::KeyblockSigId => "key block: no matching signature",
            Self::PreambleTooSmallForHeader => "preamble: too small for header",
            Self::PreambleHeaderVersion => "preamble: bad header version",
            Self::PreambleHeaderOld => "preamble: header too old",
            Self::PreambleSize => "preamble: not enough data",
            Self::PreambleSigOutside => "preamble: signature outside",
            Self::PreambleSignedTooMuch => "preamble: signed too much",
            Self::PreambleSigInvalid => "preamble: signature invalid",
            Self::PreambleSignedTooLittle => "preamble: signed too little",
            Self::PreambleBodySigOutside => "preamble: body signature outside",
            Self::PreambleKernelSubkeyOutside => "preamble: kernel subkey outside",
            Self::PreambleBootloaderOutside => "preamble: bootloader outside body",
            Self::PreambleVmlinuzHeaderOutside => "preamble: vmlinuz header outside body",
            Self::PreambleMagic => "preamble: bad magic",
            Self::PreambleHashSigned => "preamble: body hash is signed",
            Self::InitctxWorkbufSmall => "context: work buffer too small",
            Self::InitctxWorkbufAlign => "context: work buffer unaligned",
            Self::WorkbufTooSmall => "work buffer too small",
            Self::GbbMagic => "GBB: bad magic",
            Self::GbbVersion => "GBB: bad major version",
            Self::GbbTooOld => "GBB: minor version too old",
            Self::GbbHeaderSize => "GBB: header size too small",
            Self::GbbWorkbuf => "GBB: work buffer too small",
            Self::FwKeyblockWorkbufRootKey => "fw key block: no room for root key",
            Self::ReadResourceObjectBuf => "no room for vblock object",
            Self::FwKeyblockVersionRange => "fw key block: key version out of range",
            Self::FwKeyblockVersionRollback => "fw key block: key version rollback",
            Self::FwPreambleDataKey => "fw preamble: no data key",
            Self::FwPreambleVersionRange => "fw preamble: version out of range",
            Self::FwPreambleVersionRollback => "fw preamble: version rollback",
            Self::KernelKeyblockDevFlag => "kernel key block: dev flag mismatch",
            Self::KernelKeyblockRecFlag => "kernel key block: recovery flag mismatch",
            Self::KernelKeyblockVersionRange => "kernel key block: key version out of range",
            Self::KernelKeyblockVersionRollback => "kernel key block: key version rollback",
            Self::KernelPreambleDataKey => "kernel preamble: no data key",
            Self::KernelPreambleVersionRange => "kernel preamble: version out of range",
            Self::KernelPreambleVersionRollback => "kernel preamble: version rollback",
            Self::KernelDataPreamble => "kernel data: no preamble",
            Self::KernelDataSize => "kernel data: wrong size",
            Self::KernelDataKey => "kernel data: no data key",
            Self::ApiPhase1Recovery => "phase 1: recovery required",
            Self::ApiInitHashTag => "init hash: bad tag",
            Self::ApiInitHashPreamble => "init hash: no preamble",
            Self::ApiInitHashDataKey => "init hash: no data key",
            Self::ApiInitHashId => "init hash: no matching hash id",
            Self::ApiExtendHashWorkbuf => "extend hash: no active hash",
            Self::ApiExtendHashSize => "extend hash: bad size",
            Self::ApiCheckHashPreamble => "check hash: no preamble",
            Self::ApiCheckHashWorkbuf => "check hash: no active hash",
            Self::ApiCheckHashSize => "check hash: data remaining",
            Self::ApiCheckHashWorkbufDigest => "check hash: no room for digest",
            Self::ApiCheckHashTag => "check hash: bad tag",
            Self::ApiCheckHashDataKey => "check hash: no data key",
            Self::ApiCheckHashSig => "check hash: digest mismatch",
            Self::ApiKphase1Preamble => "kernel phase 1: no fw preamble",
            Self::ApiKphase1Workbuf => "kernel phase 1: no room for kernel key",
            Self::SigMagic => "signature: bad magic",
            Self::SigVersion => "signature: bad version",
            Self::SigHeaderSize => "signature: fixed size too small",
            Self::SigAlgorithm => "signature: bad algorithm",
            Self::SigSize => "signature: bad size",
            Self::VdataAlgorithm => "verify data: bad key algorithm",
            Self::VdataAlgorithmMismatch => "verify data: algorithm mismatch",
            Self::VdataSigSize => "verify data: bad signature size",
            Self::VdataNotEnoughData => "verify data: not enough data",
            Self::VdataSize => "verify data: size mismatch",
            Self::VdataDigestSize => "verify data: bad digest size",
            Self::VdataWorkbufDigest => "verify data: no room for digest",
            Self::VdataVerifyDigest => "verify data: hash mismatch",
            Self::ExReadResourceIndex => "host: bad resource index",
            Self::ExReadResourceSize => "host: resource read out of range",
            Self::ExHwCryptoUnsupported => "host: hardware crypto unsupported",
            Self::ExTpmClearOwner => "host: TPM clear owner failed",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:08X}] {}", self.code(), self.description())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "[0x{:08X}] {}", self.code(), self.description());
    }
}
