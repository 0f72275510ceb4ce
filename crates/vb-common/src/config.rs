// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Boot configuration
//!
//! Configuration is fixed when the host builds its context. Nothing read
//! from flash or NV storage can change it.

use crate::log::LogLevel;

/// Verified-boot configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootConfig {
    /// Lowest level recorded in the context log
    pub log_level: LogLevel,
    /// Offer body hashing to the host's hardware crypto hooks
    pub allow_hwcrypto: bool,
    /// Require signed kernels even in developer mode
    pub require_signed_kernel: bool,
    /// Advance stored firmware versions after a verified boot
    pub roll_forward_fw_versions: bool,
    /// Advance stored kernel versions after a verified boot
    pub roll_forward_kernel_versions: bool,
}

impl BootConfig {
    /// Default boot configuration
    pub const DEFAULT: Self = Self {
        log_level: LogLevel::Info,
        allow_hwcrypto: true,
        require_signed_kernel: false,
        roll_forward_fw_versions: true,
        roll_forward_kernel_versions: true,
    };
}

impl Default for BootConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
