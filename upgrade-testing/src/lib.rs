// SPDX-License-Identifier: GPL-3.0-only

//! Test support for the upgrade planner
//!
//! [`FakeProbe`] is an in-memory, scripted implementation of the
//! [`upgrade_contracts::PartitionProbe`] collaborator: tests register
//! virtual filesystems and directory sizes up front and can assert on the
//! mount traffic afterwards. The [`fixtures`] module builds the partition
//! descriptors of the common device layouts.

pub mod fixtures;
pub mod probe;

pub use probe::{FakeFilesystem, FakeProbe};
