// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for live-system upgrade planning
//!
//! This crate defines the single source of truth for the planner's domain
//! types. These models are used throughout the stack:
//!
//! - **upgrade-contracts**: References them in the collaborator probe traits
//! - **upgrade-planner**: Consumes descriptors, produces plans
//! - **upgrade-testing**: Builds fixture descriptors for tests
//!
//! The descriptors (`DeviceInfo`, `PartitionInfo`) are populated once by an
//! external discovery layer and are plain data afterwards; everything derived
//! from them (roles, plans) lives in `upgrade-planner`.

pub mod common;
pub mod config;
pub mod device;
pub mod partition;
pub mod plan;

pub use common::{bytes_to_pretty, pretty_to_bytes};
pub use config::{DEFAULT_EFI_SIZE_TOLERANCE_BYTES, DEFAULT_OVERHEAD_FACTOR, PlannerConfig};
pub use device::{DeviceInfo, DeviceType};
pub use partition::{
    EFI_LABEL, LEGACY_EFI_LABELS, LEGACY_PERSISTENCE_LABELS, PERSISTENCE_LABEL, PartitionInfo,
};
pub use plan::{EfiUpgradePlan, NoUpgradeReason, Role, RoleMap, SystemUpgradePlan};
