// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Anti-rollback policy
//!
//! Secure data keeps one combined version per image kind (see
//! [`vb_common::Version`]). A key block's key version is checked against
//! the upper half as soon as the key block verifies; the preamble's image
//! version completes the combined value, which is then checked as a whole.
//!
//! After a good boot the stored value is moved forward so older images
//! stop verifying.

use vb_common::{log_info, log_warn, Error, Result, Version};

use crate::context::{Context, FwResult};
use crate::wire::gbb_flags;

const MODULE: &str = "rollback";

/// Which stored version a check applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImageKind {
    /// Read-write firmware
    Firmware,
    /// Kernel
    Kernel,
}

impl ImageKind {
    const fn key_range_error(self) -> Error {
        match self {
            Self::Firmware => Error::FwKeyblockVersionRange,
            Self::Kernel => Error::KernelKeyblockVersionRange,
        }
    }

    const fn key_rollback_error(self) -> Error {
        match self {
            Self::Firmware => Error::FwKeyblockVersionRollback,
            Self::Kernel => Error::KernelKeyblockVersionRollback,
        }
    }

    const fn image_range_error(self) -> Error {
        match self {
            Self::Firmware => Error::FwPreambleVersionRange,
            Self::Kernel => Error::KernelPreambleVersionRange,
        }
    }

    const fn image_rollback_error(self) -> Error {
        match self {
            Self::Firmware => Error::FwPreambleVersionRollback,
            Self::Kernel => Error::KernelPreambleVersionRollback,
        }
    }

    /// Whether `err` is a rollback failure for this kind
    #[must_use]
    pub fn is_rollback(self, err: Error) -> bool {
        err == self.key_rollback_error() || err == self.image_rollback_error()
    }
}

/// Check a key block's key version against the stored combined version
///
/// # Errors
///
/// The kind's key block range error if the version does not fit in 16
/// bits, or its rollback error if it is older than the stored key version.
pub fn check_key_version(kind: ImageKind, key_version: u32, stored: u32) -> Result<()> {
    if !Version::key_in_range(key_version) {
        return Err(kind.key_range_error());
    }
    if key_version < Version::key_of(stored) {
        return Err(kind.key_rollback_error());
    }
    Ok(())
}

/// Add a preamble's image version to the key half
///
/// # Errors
///
/// The kind's preamble range error if the version does not fit in 16 bits.
pub fn combine_version(kind: ImageKind, key_half: u32, image_version: u32) -> Result<u32> {
    if !Version::image_in_range(image_version) {
        return Err(kind.image_range_error());
    }
    Ok(key_half | image_version)
}

/// Check a combined version against the stored one
///
/// # Errors
///
/// The kind's preamble rollback error if `combined` is older.
pub fn check_combined_version(kind: ImageKind, combined: u32, stored: u32) -> Result<()> {
    if combined < stored {
        return Err(kind.image_rollback_error());
    }
    Ok(())
}

/// Apply the GBB firmware rollback bypass to a check result
///
/// A firmware rollback failure becomes a logged warning when the GBB
/// disables the check. Every other result passes through unchanged.
pub(crate) fn fw_rollback_policy(ctx: &mut Context<'_>, ts: u64, result: Result<()>) -> Result<()> {
    match result {
        Err(e)
            if ImageKind::Firmware.is_rollback(e)
                && ctx.shared.gbb_flags & gbb_flags::DISABLE_FW_ROLLBACK_CHECK != 0 =>
        {
            log_warn!(ctx.log, ts, MODULE, "ignoring firmware rollback due to GBB flag: {}", e.description());
            Ok(())
        }
        other => other,
    }
}

/// Move the stored firmware version forward after a good boot of this slot
///
/// Only done when the same slot booted successfully last time, so a
/// broken update can still fall back to the other slot.
pub(crate) fn roll_forward_fw(ctx: &mut Context<'_>, ts: u64) {
    let sd = ctx.shared;
    if !ctx.config.roll_forward_fw_versions
        || sd.fw_version <= sd.fw_version_secdata
        || sd.last_fw_slot != sd.fw_slot
        || sd.last_fw_result != FwResult::Success
    {
        return;
    }

    ctx.shared.fw_version_secdata = sd.fw_version;
    ctx.update_secdata(|s| s.fw_versions = sd.fw_version);
    log_info!(
        ctx.log,
        ts,
        MODULE,
        "firmware version rolled forward to {}",
        Version::from_combined(sd.fw_version)
    );
}

/// Move the stored kernel version forward after a signed kernel verified
pub(crate) fn roll_forward_kernel(ctx: &mut Context<'_>, ts: u64) {
    let sd = ctx.shared;
    if !ctx.config.roll_forward_kernel_versions || sd.kernel_version <= sd.kernel_version_secdata {
        return;
    }

    ctx.shared.kernel_version_secdata = sd.kernel_version;
    ctx.update_secdata(|s| s.kernel_versions = sd.kernel_version);
    log_info!(
        ctx.log,
        ts,
        MODULE,
        "kernel version rolled forward to {}",
        Version::from_combined(sd.kernel_version)
    );
}
