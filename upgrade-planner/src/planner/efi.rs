// SPDX-License-Identifier: GPL-3.0-only

//! EFI-upgrade planning

use upgrade_contracts::PartitionProbe;
use upgrade_types::{EfiUpgradePlan, PlannerConfig};

use crate::device::StorageDevice;

/// Decide how the EFI partition of `device` gets to `needed_efi_size`.
///
/// Without an EFI partition the plan is regular (a fresh one will be
/// created). An existing partition is acceptable when it misses at most
/// [`PlannerConfig::efi_size_tolerance_bytes`], which absorbs the slack
/// partitioning tools introduce with "optimal" alignment. A larger
/// shortfall means enlarging towards the following partition: shrinking
/// it when it carries an ext[234] filesystem, backing it up otherwise.
pub fn plan_efi_upgrade(
    device: &StorageDevice,
    needed_efi_size: u64,
    probe: &dyn PartitionProbe,
    config: &PlannerConfig,
) -> EfiUpgradePlan {
    let roles = device.classify(probe);
    let partitions = device.partitions();

    let plan = match roles.efi {
        None => EfiUpgradePlan::Regular,
        Some(efi_index) => {
            let efi = &partitions[efi_index];
            let missing = needed_efi_size as i64 - efi.size() as i64;
            if missing <= config.efi_size_tolerance_bytes as i64 {
                EfiUpgradePlan::Regular
            } else {
                match partitions.get(efi_index + 1) {
                    Some(next) if next.info().has_extended_filesystem() => {
                        EfiUpgradePlan::EnlargeRepartition
                    }
                    // nothing to shrink behind the EFI partition
                    _ => EfiUpgradePlan::EnlargeBackup,
                }
            }
        }
    };

    tracing::info!("efi upgrade variant of {}: {:?}", device.info().device, plan);
    plan
}
