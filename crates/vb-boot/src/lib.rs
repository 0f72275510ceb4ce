// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! vb-rs Verified Boot
//!
//! Verification of the structures firmware meets on the way to a kernel,
//! and the boot phase API that drives it:
//!
//! - **Structures**: v2.1 common headers, legacy and v2.1 key blocks,
//!   firmware and kernel preambles, signatures and packed keys
//! - **Keys**: unpacking packed keys into borrowed [`PublicKey`] views
//! - **Phases**: GBB, developer switch, recovery decision, slot selection,
//!   firmware vblock and body hash ([`api`])
//! - **Kernel**: kernel key, key block, preamble and body ([`kernel`])
//! - **Rollback**: version checks and roll-forward ([`rollback`])
//!
//! All storage comes from the caller's work buffer inside [`Context`];
//! flash, NV storage and the TPM are reached through [`BootHost`].

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

#[cfg(feature = "std")]
extern crate std;

pub mod bounds;
pub mod common;
pub mod key;
pub mod keyblock;
pub mod preamble;
pub mod signature;
pub mod wire;

pub mod api;
pub mod context;
pub mod firmware;
pub mod gbb;
pub mod host;
pub mod kernel;
pub mod recovery;
pub mod rollback;

pub use api::{check_hash, extend_hash, fw_phase1, fw_phase2, fw_phase3, init_hash, init_hash_by_id};
pub use context::{Context, FwResult, HashTag, NvData, SecData, SharedData};
pub use host::{BootHost, ResourceIndex};
pub use kernel::{kernel_phase1, kernel_phase3, load_kernel_keyblock, load_kernel_preamble, verify_kernel_data};
pub use key::{unpack_key, PublicKey};
pub use recovery::{fail, RecoveryReason};
pub use wire::WireFormat;
