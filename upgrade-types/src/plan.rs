// SPDX-License-Identifier: GPL-3.0-only

//! Partition roles and upgrade plan outcomes

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::bytes_to_pretty;

/// The role a partition plays in the live-system layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Matches no known role and is ignored by the planner
    #[default]
    None,

    /// Read-write persistence overlay (user data and configuration)
    Data,

    /// EFI/boot partition holding the bootloader
    Efi,

    /// User-accessible FAT/exFAT/NTFS area for host interoperability
    Exchange,

    /// Read-only partition holding the compressed OS image layers
    System,
}

/// Role references produced by classification.
///
/// Each entry is an index into the classified device's ordered partition
/// list, never a separate object; at most one partition per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMap {
    pub data: Option<usize>,
    pub efi: Option<usize>,
    pub exchange: Option<usize>,
    pub system: Option<usize>,
}

impl RoleMap {
    /// Look up the partition index recorded for a role
    pub fn get(&self, role: Role) -> Option<usize> {
        match role {
            Role::None => None,
            Role::Data => self.data,
            Role::Efi => self.efi,
            Role::Exchange => self.exchange,
            Role::System => self.system,
        }
    }

    /// Record a partition index for a role; ignored for `Role::None`
    pub fn set(&mut self, role: Role, index: usize) {
        match role {
            Role::None => {}
            Role::Data => self.data = Some(index),
            Role::Efi => self.efi = Some(index),
            Role::Exchange => self.exchange = Some(index),
            Role::System => self.system = Some(index),
        }
    }

    /// The role assigned to a partition index, if any
    pub fn role_of(&self, index: usize) -> Role {
        if self.data == Some(index) {
            Role::Data
        } else if self.efi == Some(index) {
            Role::Efi
        } else if self.exchange == Some(index) {
            Role::Exchange
        } else if self.system == Some(index) {
            Role::System
        } else {
            Role::None
        }
    }
}

/// Why a system upgrade is impossible on a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoUpgradeReason {
    /// No system partition was found on the device
    NoSystemPartition,

    /// No data partition was found on the device
    NoDataPartition,

    /// The data partition is smaller than the preserved user data
    /// (including the filesystem overhead margin)
    DataPartitionTooSmall { required_bytes: u64 },

    /// The system partition is too small and the preceding partition
    /// cannot yield enough space
    SystemPartitionTooSmall,
}

impl fmt::Display for NoUpgradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoUpgradeReason::NoSystemPartition => f.write_str("no system partition found"),
            NoUpgradeReason::NoDataPartition => f.write_str("no data partition found"),
            NoUpgradeReason::DataPartitionTooSmall { required_bytes } => write!(
                f,
                "data partition too small, {} required",
                bytes_to_pretty(required_bytes, false)
            ),
            NoUpgradeReason::SystemPartitionTooSmall => f.write_str("system partition too small"),
        }
    }
}

/// All known variants of upgrading the system partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemUpgradePlan {
    /// The persistence partition is cleaned (keeping the user's home
    /// directory and printing configuration) and the old content on the
    /// system partition is replaced with the current version.
    Regular,

    /// The system partition must be enlarged before upgrading, by
    /// shrinking the preceding partition.
    Repartition,

    /// Personal data and configuration are backed up, the device gets a
    /// clean installation, then the backup is restored.
    Backup,

    /// Upgrading is done by a clean default installation.
    Installation,

    /// The system partition cannot be upgraded.
    Impossible(NoUpgradeReason),
}

impl SystemUpgradePlan {
    /// The reason attached to an `Impossible` outcome
    pub fn no_upgrade_reason(&self) -> Option<&NoUpgradeReason> {
        match self {
            SystemUpgradePlan::Impossible(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for SystemUpgradePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemUpgradePlan::Regular => f.write_str("regular"),
            SystemUpgradePlan::Repartition => f.write_str("repartition"),
            SystemUpgradePlan::Backup => f.write_str("backup"),
            SystemUpgradePlan::Installation => f.write_str("installation"),
            SystemUpgradePlan::Impossible(reason) => write!(f, "impossible ({reason})"),
        }
    }
}

/// All known variants of upgrading the EFI partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EfiUpgradePlan {
    /// The EFI partition is either newly created or its old content is
    /// replaced with the current version.
    Regular,

    /// The EFI partition must be enlarged before upgrading, by shrinking
    /// the following partition.
    EnlargeRepartition,

    /// The EFI partition must be enlarged before upgrading, by backing up
    /// the following partition, repartitioning and restoring the backup.
    EnlargeBackup,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_map_round_trips_indices() {
        let mut roles = RoleMap::default();
        roles.set(Role::Efi, 0);
        roles.set(Role::System, 2);
        roles.set(Role::None, 7);

        assert_eq!(roles.get(Role::Efi), Some(0));
        assert_eq!(roles.get(Role::System), Some(2));
        assert_eq!(roles.get(Role::Data), None);
        assert_eq!(roles.get(Role::None), None);

        assert_eq!(roles.role_of(0), Role::Efi);
        assert_eq!(roles.role_of(2), Role::System);
        assert_eq!(roles.role_of(7), Role::None);
    }

    #[test]
    fn impossible_reason_is_exposed() {
        let plan = SystemUpgradePlan::Impossible(NoUpgradeReason::NoDataPartition);
        assert_eq!(
            plan.no_upgrade_reason(),
            Some(&NoUpgradeReason::NoDataPartition)
        );
        assert_eq!(SystemUpgradePlan::Regular.no_upgrade_reason(), None);
    }

    #[test]
    fn too_small_reason_renders_required_size() {
        let reason = NoUpgradeReason::DataPartitionTooSmall {
            required_bytes: 2_097_152,
        };
        assert_eq!(reason.to_string(), "data partition too small, 2.00 MB required");
    }

    #[test]
    fn plans_serialize_as_snake_case() {
        let json = serde_json::to_string(&SystemUpgradePlan::Regular).expect("serialize plan");
        assert_eq!(json, "\"regular\"");

        let plan: SystemUpgradePlan = serde_json::from_str(
            "{\"impossible\":{\"data_partition_too_small\":{\"required_bytes\":42}}}",
        )
        .expect("deserialize plan");
        assert_eq!(
            plan,
            SystemUpgradePlan::Impossible(NoUpgradeReason::DataPartitionTooSmall {
                required_bytes: 42
            })
        );
    }
}
