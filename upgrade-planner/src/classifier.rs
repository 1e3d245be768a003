// SPDX-License-Identifier: GPL-3.0-only

//! Partition-role classification
//!
//! Classification walks the partitions of a device in ascending number
//! order and evaluates a fixed, cost-ordered predicate list for each one.
//! First match wins, both across predicates for a given partition and
//! across partitions for a given role. The order is part of the contract:
//!
//! 1. Data — label check
//! 2. EFI — label check; before Exchange because it is the more specific
//!    predicate
//! 3. Exchange — partition number plus table/filesystem type
//! 4. System — needs a mount round trip, so it runs only if none of the
//!    cheaper predicates matched
//!
//! The table is public so the ordering is independently testable.

use upgrade_contracts::{PartitionProbe, ProbeError};
use upgrade_types::{Role, RoleMap};

use crate::partition::Partition;

/// Relative cost of evaluating a role predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PredicateCost {
    /// Pure function of the partition descriptor
    Cheap,

    /// Requires mounting the partition
    MountRoundTrip,
}

/// One entry of the classification sequence
pub struct RolePredicate {
    /// Role assigned when the predicate matches
    pub role: Role,

    /// Relative evaluation cost
    pub cost: PredicateCost,

    matches: fn(&Partition, &dyn PartitionProbe) -> Result<bool, ProbeError>,
}

impl RolePredicate {
    /// Evaluate this predicate for a partition
    pub fn matches(
        &self,
        partition: &Partition,
        probe: &dyn PartitionProbe,
    ) -> Result<bool, ProbeError> {
        (self.matches)(partition, probe)
    }
}

/// The classification sequence, in evaluation order
pub const ROLE_PREDICATES: &[RolePredicate] = &[
    RolePredicate {
        role: Role::Data,
        cost: PredicateCost::Cheap,
        matches: |partition, _| Ok(partition.info().has_persistence_label()),
    },
    RolePredicate {
        role: Role::Efi,
        cost: PredicateCost::Cheap,
        matches: |partition, _| Ok(partition.info().has_efi_label()),
    },
    RolePredicate {
        role: Role::Exchange,
        cost: PredicateCost::Cheap,
        matches: |partition, _| Ok(partition.info().matches_exchange_convention()),
    },
    RolePredicate {
        role: Role::System,
        cost: PredicateCost::MountRoundTrip,
        matches: |partition, probe| partition.is_system(probe),
    },
];

/// Assign roles to a device's partitions.
///
/// `partitions` must be ordered by ascending partition number. A probe
/// failure while evaluating one partition leaves that partition at
/// `Role::None` and does not abort classification of the rest.
pub fn classify(partitions: &[Partition], probe: &dyn PartitionProbe) -> RoleMap {
    let mut roles = RoleMap::default();

    for (index, partition) in partitions.iter().enumerate() {
        for predicate in ROLE_PREDICATES {
            if roles.get(predicate.role).is_some() {
                // only the first partition matching a role gets it
                continue;
            }

            match predicate.matches(partition, probe) {
                Ok(true) => {
                    tracing::info!(
                        "{} partition: {}",
                        role_name(predicate.role),
                        partition.info()
                    );
                    roles.set(predicate.role, index);
                    break;
                }
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(
                        "probing {} for role {} failed: {}",
                        partition.info().device_and_number(),
                        role_name(predicate.role),
                        error
                    );
                }
            }
        }
    }

    roles
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::None => "none",
        Role::Data => "data",
        Role::Efi => "efi",
        Role::Exchange => "exchange",
        Role::System => "system",
    }
}
