// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Host callbacks
//!
//! The library never touches flash, NV storage or the TPM itself. The
//! platform implements [`BootHost`] and passes it into every phase call.

use vb_common::Result;
use vb_crypto::HwCrypto;

/// Regions the library asks the host to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResourceIndex {
    /// Google binary block in read-only flash
    Gbb,
    /// Verification block of the firmware slot chosen in phase 2
    FwVblock,
    /// Verification block at the start of the kernel partition
    KernelVblock,
}

/// Platform services needed during verified boot
pub trait BootHost: HwCrypto {
    /// Fill `buf` with bytes of `index` starting at `offset`
    ///
    /// # Errors
    ///
    /// [`vb_common::Error::ExReadResourceIndex`] for a region the platform
    /// does not have, [`vb_common::Error::ExReadResourceSize`] if the read
    /// runs past its end, or any storage failure.
    fn read_resource(&mut self, index: ResourceIndex, offset: u32, buf: &mut [u8]) -> Result<()>;

    /// Clear the TPM owner
    ///
    /// # Errors
    ///
    /// Any TPM failure; the caller requests recovery.
    fn tpm_clear_owner(&mut self) -> Result<()>;

    /// Microseconds since reset, used to stamp log entries
    fn timestamp(&self) -> u64 {
        0
    }
}
