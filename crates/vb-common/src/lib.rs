// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! vb-rs Common Library
//!
//! Types shared by every verified-boot crate: the error enum and its stable
//! numeric codes, the boot decision log, configuration, algorithm
//! identifiers, combined rollback versions and the work buffer allocator.
//!
//! # Features
//!
//! - `std`: Enable standard library support (disabled by default for firmware)
//! - `defmt`: Enable defmt formatting of errors
//!
//! Nothing in this crate allocates; all storage is fixed-size or borrowed.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod constants;
pub mod errors;
pub mod log;
pub mod types;
pub mod version;
pub mod workbuf;

// Re-export commonly used items
pub use config::BootConfig;
pub use errors::{Error, Result};
pub use types::*;
pub use version::Version;
pub use workbuf::WorkBuf;
