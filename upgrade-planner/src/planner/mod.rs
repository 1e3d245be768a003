// SPDX-License-Identifier: GPL-3.0-only

//! Upgrade decision procedures
//!
//! Two independent planners: [`system::plan_system_upgrade`] decides if and
//! how the system partition can be upgraded, [`efi::plan_efi_upgrade`]
//! decides how the EFI partition gets to its needed size. Both consume the
//! classified roles of a [`crate::StorageDevice`] plus collaborator-measured
//! sizes and never touch the device themselves.

pub mod efi;
pub mod system;

pub use efi::plan_efi_upgrade;
pub use system::{destructive_fallback, plan_system_upgrade};
