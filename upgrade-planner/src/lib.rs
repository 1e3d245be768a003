// SPDX-License-Identifier: GPL-3.0-only

//! Partition-role classifier and upgrade decision engine
//!
//! Given a snapshot of a device's partition descriptors, this crate decides
//! whether and how the live system on the device can be upgraded in place:
//!
//! 1. [`StorageDevice::classify`] assigns each partition at most one
//!    [`upgrade_types::Role`] using a fixed, cost-ordered predicate list.
//! 2. [`planner::plan_system_upgrade`] and [`planner::plan_efi_upgrade`]
//!    turn the classified roles plus measured sizes into a plan.
//!
//! All platform access (mounting, measuring) goes through the
//! [`upgrade_contracts::PartitionProbe`] collaborator; expensive probe
//! results are computed at most once per [`Partition`] instance. A new
//! platform snapshot yields new objects, there is no refresh.

pub mod cell;
pub mod classifier;
pub mod device;
pub mod partition;
pub mod planner;

pub use cell::ProbeCell;
pub use classifier::{PredicateCost, RolePredicate, ROLE_PREDICATES};
pub use device::StorageDevice;
pub use partition::Partition;
pub use planner::{plan_efi_upgrade, plan_system_upgrade};
