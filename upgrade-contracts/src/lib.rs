// SPDX-License-Identifier: GPL-3.0-only

//! Contracts between the upgrade planner and its platform collaborators
//!
//! The planner never touches the platform itself: mounting, unmounting,
//! overlay assembly and size measurement are performed by an external
//! implementation of [`PartitionProbe`]. This crate defines that contract
//! and the shared error taxonomy.

pub mod error;
pub mod probe;

pub use error::{PlanError, ProbeError};
pub use probe::{FsUsage, MountedPartition, PartitionProbe, PartitionRef};
