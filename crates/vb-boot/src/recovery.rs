// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Boot mode decisions
//!
//! Everything that turns stored state and host flags into a boot mode:
//!
//! 1. [`fail`] records a failure, falling back to the other firmware slot
//!    before asking for recovery
//! 2. [`check_dev_switch`] decides developer mode and clears the TPM owner
//!    on a transition
//! 3. [`check_recovery`] decides recovery mode
//! 4. [`check_tpm_clear`] services an explicit TPM clear request
//! 5. [`select_fw_slot`] picks the firmware slot to try
//!
//! None of these read flash; they only look at the context and, for the
//! TPM, call the host.

use vb_common::{log_error, log_info, log_warn, Error, Result};

use crate::context::{context_flags, secdata_flags, shared_flags, status, Context, FwResult};
use crate::host::BootHost;
use crate::wire::gbb_flags;

const MODULE: &str = "recovery";

/// The firmware slot that is not `slot`
const fn other_slot(slot: u8) -> u8 {
    if slot == 0 {
        1
    } else {
        0
    }
}

// ============================================================================
// Recovery Reason
// ============================================================================

/// Reason for entering recovery mode, as stored in NV data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RecoveryReason {
    /// No recovery needed
    NotRequested = 0x00,
    /// Requested by an older boot stage
    Legacy = 0x01,
    /// User pressed the recovery button
    RoManual = 0x02,
    /// Neither firmware slot verified
    RoInvalidRw = 0x03,
    /// Shared data was unusable
    RoSharedData = 0x06,
    /// Secure data could not be initialized
    SecdataInit = 0x17,
    /// GBB header is bad
    GbbHeader = 0x18,
    /// TPM owner could not be cleared
    TpmClearOwner = 0x19,
    /// Developer switch handling failed
    DevSwitch = 0x1a,
    /// Firmware slot selection failed
    FwSlot = 0x1b,
    /// Unspecified read-only firmware failure
    RoUnspecified = 0x3f,
    /// Developer screen requested recovery
    RwDevScreen = 0x41,
    /// No bootable kernel found
    RwNoOs = 0x42,
    /// Kernel failed verification
    RwInvalidOs = 0x43,
}

impl RecoveryReason {
    /// Value stored in NV data
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode a stored reason; `None` for codes this library does not name
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0x00 => Self::NotRequested,
            0x01 => Self::Legacy,
            0x02 => Self::RoManual,
            0x03 => Self::RoInvalidRw,
            0x06 => Self::RoSharedData,
            0x17 => Self::SecdataInit,
            0x18 => Self::GbbHeader,
            0x19 => Self::TpmClearOwner,
            0x1a => Self::DevSwitch,
            0x1b => Self::FwSlot,
            0x3f => Self::RoUnspecified,
            0x41 => Self::RwDevScreen,
            0x42 => Self::RwNoOs,
            0x43 => Self::RwInvalidOs,
            _ => return None,
        })
    }
}

// ============================================================================
// Failure Handling
// ============================================================================

/// Record a boot failure
///
/// Once a slot has been chosen, the failure is charged to that slot and
/// the other slot is tried next boot. Recovery is requested only when no
/// slot was chosen yet or the other slot also failed last boot. A
/// recovery request already in NV data is never overwritten.
pub fn fail(ctx: &mut Context<'_>, ts: u64, reason: RecoveryReason, subcode: u8) {
    if ctx.shared.status & status::CHOSE_SLOT != 0 {
        let slot = ctx.shared.fw_slot;
        let other = other_slot(slot);
        ctx.update_nv(|nv| {
            nv.fw_result = FwResult::Failure;
            nv.try_count = 0;
            nv.try_next = other;
        });

        if ctx.shared.last_fw_slot != other || ctx.shared.last_fw_result != FwResult::Failure {
            log_warn!(
                ctx.log,
                ts,
                MODULE,
                "slot {} failed ({:?}, 0x{:02x}); trying slot {} next boot",
                slot,
                reason,
                subcode,
                other
            );
            return;
        }
    }

    if ctx.nv().recovery_request == RecoveryReason::NotRequested.as_u8() {
        ctx.update_nv(|nv| {
            nv.recovery_request = reason.as_u8();
            nv.recovery_subcode = subcode;
        });
        log_error!(ctx.log, ts, MODULE, "recovery requested: {:?} 0x{:02x}", reason, subcode);
    }
}

/// [`fail`] with the subcode taken from `err`
pub fn fail_with(ctx: &mut Context<'_>, ts: u64, reason: RecoveryReason, err: Error) {
    fail(ctx, ts, reason, err.recovery_subcode());
}

// ============================================================================
// Mode Decisions
// ============================================================================

/// Decide whether this boot is a recovery boot
///
/// The NV request is consumed so the device does not stay stuck in
/// recovery. A reason decided earlier this boot takes priority over the
/// request, and the recovery button overrides both.
pub fn check_recovery(ctx: &mut Context<'_>, ts: u64) {
    let request = ctx.nv().recovery_request;
    if request != RecoveryReason::NotRequested.as_u8() {
        ctx.update_nv(|nv| nv.recovery_request = RecoveryReason::NotRequested.as_u8());
    }

    if ctx.shared.recovery_reason == 0 {
        ctx.shared.recovery_reason = request;
    }

    if ctx.has_flag(context_flags::FORCE_RECOVERY) {
        ctx.shared.recovery_reason = RecoveryReason::RoManual.as_u8();
        ctx.shared.flags |= shared_flags::MANUAL_RECOVERY;
    }

    if ctx.shared.recovery_reason != 0 {
        ctx.flags |= context_flags::RECOVERY_MODE;
        log_info!(ctx.log, ts, MODULE, "recovery mode, reason 0x{:02x}", ctx.shared.recovery_reason);
    }
}

/// Decide developer mode
///
/// Developer mode is on when secure data says so (after honoring a
/// disable request), when the host forces it, or when the GBB forces the
/// switch on. Normal mode clears the developer boot options. Any change
/// to the secure data flags clears the TPM owner first; if that fails the
/// new flags are not saved.
///
/// # Errors
///
/// The host's TPM error, after recovery has been requested with
/// [`RecoveryReason::TpmClearOwner`].
pub fn check_dev_switch<H: BootHost + ?Sized>(ctx: &mut Context<'_>, host: &mut H) -> Result<()> {
    let ts = host.timestamp();
    let old_flags = ctx.secdata().flags;
    let mut flags = old_flags;

    if ctx.nv().disable_dev_request {
        flags &= !secdata_flags::DEV_MODE;
        ctx.update_nv(|nv| nv.disable_dev_request = false);
        log_info!(ctx.log, ts, MODULE, "developer mode disabled by request");
    }

    let is_dev = flags & secdata_flags::DEV_MODE != 0
        || ctx.has_flag(context_flags::FORCE_DEV)
        || ctx.shared.gbb_flags & gbb_flags::FORCE_DEV_SWITCH_ON != 0;

    if is_dev {
        ctx.shared.flags |= shared_flags::DEV_MODE_ENABLED;
        ctx.flags |= context_flags::DEVELOPER_MODE;
        flags |= secdata_flags::LAST_BOOT_DEVELOPER;
    } else {
        flags &= !secdata_flags::LAST_BOOT_DEVELOPER;
        ctx.update_nv(|nv| {
            nv.dev_boot_usb = false;
            nv.dev_boot_legacy = false;
            nv.dev_boot_signed_only = false;
        });
    }

    if flags != old_flags {
        log_info!(
            ctx.log,
            ts,
            MODULE,
            "developer mode {}; clearing TPM owner",
            if is_dev { "entered" } else { "left" }
        );
        if let Err(e) = host.tpm_clear_owner() {
            fail_with(ctx, ts, RecoveryReason::TpmClearOwner, e);
            return Err(e);
        }
        ctx.update_secdata(|sd| sd.flags = flags);
    }

    Ok(())
}

/// Clear the TPM owner if NV data asks for it
///
/// The request is consumed whether or not the clear succeeds.
///
/// # Errors
///
/// The host's TPM error, after recovery has been requested.
pub fn check_tpm_clear<H: BootHost + ?Sized>(ctx: &mut Context<'_>, host: &mut H) -> Result<()> {
    if !ctx.nv().clear_tpm_owner_request {
        return Ok(());
    }
    let ts = host.timestamp();

    ctx.update_nv(|nv| nv.clear_tpm_owner_request = false);

    if let Err(e) = host.tpm_clear_owner() {
        fail_with(ctx, ts, RecoveryReason::TpmClearOwner, e);
        return Err(e);
    }

    ctx.update_nv(|nv| nv.clear_tpm_owner_done = true);
    log_info!(ctx.log, ts, MODULE, "TPM owner cleared on request");
    Ok(())
}

/// Choose the firmware slot to try this boot
///
/// Last boot's slot and result are copied to the previous-boot fields.
/// If last boot spent the final try on the slot we would pick, the other
/// slot is used instead.
pub fn select_fw_slot(ctx: &mut Context<'_>, ts: u64) {
    let nv = *ctx.nv();
    ctx.shared.last_fw_slot = nv.fw_tried;
    ctx.shared.last_fw_result = nv.fw_result;

    let mut slot = u8::from(nv.try_next != 0);
    let tries = nv.try_count;
    if nv.fw_result == FwResult::Trying && nv.fw_tried == slot && tries == 0 {
        log_warn!(ctx.log, ts, MODULE, "slot {} out of tries", slot);
        slot = other_slot(slot);
    }

    ctx.update_nv(|nv| {
        nv.fw_prev_tried = nv.fw_tried;
        nv.fw_prev_result = nv.fw_result;
        nv.fw_result = FwResult::Unknown;
        nv.try_next = slot;
        if tries > 0 {
            nv.fw_result = FwResult::Trying;
            nv.try_count = tries - 1;
        }
        nv.fw_tried = slot;
    });

    ctx.shared.fw_slot = slot;
    if slot != 0 {
        ctx.flags |= context_flags::FW_SLOT_B;
    }
    ctx.shared.status |= status::CHOSE_SLOT;

    log_info!(ctx.log, ts, MODULE, "trying firmware slot {}", if slot == 0 { 'A' } else { 'B' });
}
