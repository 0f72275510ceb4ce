// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Boot context and shared verification state
//!
//! A [`Context`] lives for one boot. It owns the decision flags, the NV
//! and secure data images the host loaded, the log, and the work buffer.
//!
//! The front of the work buffer holds objects that must survive between
//! phase calls (the data key, then the preamble). Everything past
//! [`Context::workbuf_used`] is scratch for the current call.

use vb_common::constants::{WORKBUF_ALIGN, WORKBUF_MIN_SIZE};
use vb_common::log::LogBuffer;
use vb_common::workbuf::align_up;
use vb_common::{BootConfig, Error, KeyId, Result, WorkBuf};
use vb_crypto::StreamingDigest;

use crate::wire::WireFormat;

// ============================================================================
// Flags
// ============================================================================

/// Context flags, set by the host or by the phase API
pub mod context_flags {
    /// NV data was modified and must be written back
    pub const NVDATA_CHANGED: u32 = 1 << 0;
    /// Secure data was modified and must be written back
    pub const SECDATA_CHANGED: u32 = 1 << 1;
    /// Booting in recovery mode
    pub const RECOVERY_MODE: u32 = 1 << 2;
    /// Booting in developer mode
    pub const DEVELOPER_MODE: u32 = 1 << 3;
    /// Host saw the recovery button
    pub const FORCE_RECOVERY: u32 = 1 << 4;
    /// Host wants developer mode regardless of secure data
    pub const FORCE_DEV: u32 = 1 << 5;
    /// Slot B was chosen
    pub const FW_SLOT_B: u32 = 1 << 6;
    /// Host must clear RAM before handing off
    pub const CLEAR_RAM: u32 = 1 << 7;
}

/// Flags in [`SharedData::flags`]
pub mod shared_flags {
    /// Recovery was requested by the user, not by a failure
    pub const MANUAL_RECOVERY: u32 = 1 << 0;
    /// Developer mode is on for this boot
    pub const DEV_MODE_ENABLED: u32 = 1 << 1;
    /// The kernel key block was signature-verified
    pub const KERNEL_SIGNED: u32 = 1 << 2;
}

/// Progress bits in [`SharedData::status`]
pub mod status {
    /// The GBB header was read and checked
    pub const GBB_PARSED: u32 = 1 << 0;
    /// A firmware slot was chosen in phase 2
    pub const CHOSE_SLOT: u32 = 1 << 1;
}

/// Flags in [`SecData::flags`]
pub mod secdata_flags {
    /// The previous boot was in developer mode
    pub const LAST_BOOT_DEVELOPER: u8 = 1 << 0;
    /// Developer mode is enabled
    pub const DEV_MODE: u8 = 1 << 1;
}

// ============================================================================
// Persistent Storage Images
// ============================================================================

/// Outcome recorded for a firmware slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FwResult {
    /// Nothing recorded
    #[default]
    Unknown = 0,
    /// Slot is being tried this boot
    Trying = 1,
    /// Slot booted to the OS
    Success = 2,
    /// Slot failed verification
    Failure = 3,
}

/// Non-volatile boot flags, loaded and stored by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NvData {
    /// Recovery reason requested for this boot
    pub recovery_request: u8,
    /// Detail for `recovery_request`
    pub recovery_subcode: u8,
    /// Slot to try next
    pub try_next: u8,
    /// Tries left on `try_next`
    pub try_count: u8,
    /// Slot tried this boot
    pub fw_tried: u8,
    /// Result for `fw_tried`
    pub fw_result: FwResult,
    /// Slot tried last boot
    pub fw_prev_tried: u8,
    /// Result for `fw_prev_tried`
    pub fw_prev_result: FwResult,
    /// Allow booting from USB in developer mode
    pub dev_boot_usb: bool,
    /// Allow legacy boot in developer mode
    pub dev_boot_legacy: bool,
    /// Only boot signed kernels in developer mode
    pub dev_boot_signed_only: bool,
    /// Leave developer mode on the next boot
    pub disable_dev_request: bool,
    /// Clear the TPM owner on the next boot
    pub clear_tpm_owner_request: bool,
    /// The last clear request was carried out
    pub clear_tpm_owner_done: bool,
}

/// Rollback-protected data, loaded and stored by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SecData {
    /// See [`secdata_flags`]
    pub flags: u8,
    /// Lowest acceptable combined firmware version
    pub fw_versions: u32,
    /// Lowest acceptable combined kernel version
    pub kernel_versions: u32,
}

// ============================================================================
// Shared Verification State
// ============================================================================

/// Location of a persistent object in the work buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkbufRegion {
    /// Offset from the start of the work buffer
    pub offset: usize,
    /// Size in bytes
    pub size: usize,
}

impl WorkbufRegion {
    /// Nothing stored
    pub const EMPTY: Self = Self { offset: 0, size: 0 };

    /// Whether the region holds anything
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// What the body hash in progress will be compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashTag {
    /// No hash started
    #[default]
    Invalid,
    /// Legacy firmware body signature
    FirmwareBody,
    /// v2.1 preamble hash with this id
    Id(KeyId),
}

/// Decisions and locations shared between the phase calls
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedData {
    /// See [`shared_flags`]
    pub flags: u32,
    /// See [`status`]
    pub status: u32,
    /// Recovery reason decided this boot, 0 if none
    pub recovery_reason: u8,
    /// Slot tried last boot
    pub last_fw_slot: u8,
    /// Result of last boot's slot
    pub last_fw_result: FwResult,
    /// Slot being tried
    pub fw_slot: u8,
    /// Combined firmware version from the vblock
    pub fw_version: u32,
    /// Combined firmware version from secure data
    pub fw_version_secdata: u32,
    /// Combined kernel version from the vblock
    pub kernel_version: u32,
    /// Combined kernel version from secure data
    pub kernel_version_secdata: u32,
    /// Flags word from the GBB header
    pub gbb_flags: u32,
    /// Root key offset in the GBB
    pub gbb_rootkey_offset: u32,
    /// Root key size in the GBB
    pub gbb_rootkey_size: u32,
    /// Recovery key offset in the GBB
    pub gbb_recovery_key_offset: u32,
    /// Recovery key size in the GBB
    pub gbb_recovery_key_size: u32,
    /// Format of the stored preamble
    pub preamble_format: WireFormat,
    /// Packed data key in the work buffer
    pub data_key: WorkbufRegion,
    /// Preamble in the work buffer
    pub preamble: WorkbufRegion,
    /// Packed kernel key in the work buffer
    pub kernel_key: WorkbufRegion,
    /// Offset of the preamble within its vblock
    pub vblock_preamble_offset: u32,
    /// Target of the body hash in progress
    pub hash_tag: HashTag,
    /// Body bytes still expected by the hash in progress
    pub hash_remaining_size: u32,
}

// ============================================================================
// Context
// ============================================================================

/// State of one verified boot
pub struct Context<'a> {
    /// See [`context_flags`]
    pub flags: u32,
    /// Shared verification state
    pub shared: SharedData,
    /// Fixed configuration
    pub config: BootConfig,
    /// Boot decision log
    pub log: LogBuffer,
    nv: NvData,
    secdata: SecData,
    workbuf: &'a mut [u8],
    workbuf_used: usize,
    pub(crate) digest: Option<StreamingDigest>,
}

impl<'a> Context<'a> {
    /// Create a context over `workbuf`
    ///
    /// # Errors
    ///
    /// - [`Error::InitctxWorkbufAlign`]: `workbuf` does not start on a
    ///   16-byte boundary
    /// - [`Error::InitctxWorkbufSmall`]: `workbuf` is too small to be useful
    pub fn new(workbuf: &'a mut [u8], config: BootConfig) -> Result<Self> {
        if workbuf.as_ptr().align_offset(WORKBUF_ALIGN) != 0 {
            return Err(Error::InitctxWorkbufAlign);
        }
        if workbuf.len() < WORKBUF_MIN_SIZE {
            return Err(Error::InitctxWorkbufSmall);
        }

        let mut log = LogBuffer::new();
        log.set_min_level(config.log_level);

        Ok(Self {
            flags: 0,
            shared: SharedData::default(),
            config,
            log,
            nv: NvData::default(),
            secdata: SecData::default(),
            workbuf,
            workbuf_used: 0,
            digest: None,
        })
    }

    /// Use NV data loaded by the host
    #[must_use]
    pub fn with_nv(mut self, nv: NvData) -> Self {
        self.nv = nv;
        self
    }

    /// Use secure data loaded by the host
    #[must_use]
    pub fn with_secdata(mut self, secdata: SecData) -> Self {
        self.secdata = secdata;
        self
    }

    /// Current NV data
    #[must_use]
    pub const fn nv(&self) -> &NvData {
        &self.nv
    }

    /// Current secure data
    #[must_use]
    pub const fn secdata(&self) -> &SecData {
        &self.secdata
    }

    /// Modify NV data, raising `NVDATA_CHANGED` if anything changed
    pub fn update_nv(&mut self, f: impl FnOnce(&mut NvData)) {
        let before = self.nv;
        f(&mut self.nv);
        if self.nv != before {
            self.flags |= context_flags::NVDATA_CHANGED;
        }
    }

    /// Modify secure data, raising `SECDATA_CHANGED` if anything changed
    pub fn update_secdata(&mut self, f: impl FnOnce(&mut SecData)) {
        let before = self.secdata;
        f(&mut self.secdata);
        if self.secdata != before {
            self.flags |= context_flags::SECDATA_CHANGED;
        }
    }

    /// Test a context flag
    #[must_use]
    pub const fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    /// Bytes held by persistent objects
    #[must_use]
    pub const fn workbuf_used(&self) -> usize {
        self.workbuf_used
    }

    /// Bytes of a stored object, `None` if the region is empty
    #[must_use]
    pub fn stored(&self, region: WorkbufRegion) -> Option<&[u8]> {
        if region.is_empty() {
            return None;
        }
        self.workbuf.get(region.offset..region.offset.checked_add(region.size)?)
    }

    /// Persistent objects and a scratch allocator over the rest
    pub(crate) fn split_workbuf(&mut self) -> (&[u8], WorkBuf<'_>) {
        let (head, tail) = self.workbuf.split_at_mut(self.workbuf_used);
        (head, WorkBuf::new(tail))
    }

    /// Move `size` bytes at `src` down to `dest` and make them persistent
    ///
    /// Everything stored at or after `dest` is discarded.
    pub(crate) fn keep(&mut self, src: usize, size: usize, dest: usize) -> Result<WorkbufRegion> {
        let src_end = src.checked_add(size).ok_or(Error::WorkbufTooSmall)?;
        let used = align_up(size)
            .and_then(|s| dest.checked_add(s))
            .ok_or(Error::WorkbufTooSmall)?;
        if src_end > self.workbuf.len() || used > self.workbuf.len() || dest % WORKBUF_ALIGN != 0 {
            return Err(Error::WorkbufTooSmall);
        }

        self.workbuf.copy_within(src..src_end, dest);
        self.workbuf_used = used;
        Ok(WorkbufRegion { offset: dest, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(align(16))]
    struct Aligned([u8; 512]);

    #[test]
    fn test_rejects_misaligned_workbuf() {
        let mut buf = Aligned([0; 512]);
        assert!(matches!(
            Context::new(&mut buf.0[1..], BootConfig::DEFAULT),
            Err(Error::InitctxWorkbufAlign)
        ));
    }

    #[test]
    fn test_rejects_small_workbuf() {
        let mut buf = Aligned([0; 512]);
        assert!(matches!(
            Context::new(&mut buf.0[..WORKBUF_MIN_SIZE - 16], BootConfig::DEFAULT),
            Err(Error::InitctxWorkbufSmall)
        ));
    }

    #[test]
    fn test_update_nv_flags_only_on_change() {
        let mut buf = Aligned([0; 512]);
        let mut ctx = Context::new(&mut buf.0, BootConfig::DEFAULT).unwrap();

        ctx.update_nv(|nv| nv.try_count = 0);
        assert!(!ctx.has_flag(context_flags::NVDATA_CHANGED));

        ctx.update_nv(|nv| nv.try_count = 3);
        assert!(ctx.has_flag(context_flags::NVDATA_CHANGED));
        assert!(!ctx.has_flag(context_flags::SECDATA_CHANGED));

        ctx.update_secdata(|sd| sd.fw_versions = 0x0001_0001);
        assert!(ctx.has_flag(context_flags::SECDATA_CHANGED));
    }

    #[test]
    fn test_keep_moves_and_reserves() {
        let mut buf = Aligned([0; 512]);
        let mut ctx = Context::new(&mut buf.0, BootConfig::DEFAULT).unwrap();
        {
            let (head, mut wb) = ctx.split_workbuf();
            assert!(head.is_empty());
            let block = wb.alloc(64).unwrap();
            block[40..45].copy_from_slice(b"hello");
        }

        let region = ctx.keep(40, 5, 0).unwrap();
        assert_eq!(ctx.workbuf_used(), WORKBUF_ALIGN);
        assert_eq!(ctx.stored(region), Some(&b"hello"[..]));
        assert_eq!(ctx.stored(WorkbufRegion::EMPTY), None);

        assert_eq!(ctx.keep(0, 600, 0), Err(Error::WorkbufTooSmall));
    }
}
