// SPDX-License-Identifier: GPL-3.0-only

//! System-upgrade planning
//!
//! The decision tree is evaluated top to bottom, first applicable rule
//! wins:
//!
//! 1. No system partition → impossible
//! 2. No data partition → impossible
//! 3. Preserved user data (inflated by the overhead factor) does not fit
//!    the data partition → impossible
//! 4. Unrecognized partition geometry → destructive fallback
//! 5. New system fits the system partition → regular; otherwise the
//!    partition preceding the system partition may yield space → repartition
//! 6. Neither fits nor shrinkable → impossible

use std::path::Path;

use upgrade_contracts::{PartitionProbe, PlanError, ProbeError};
use upgrade_types::{
    NoUpgradeReason, PlannerConfig, RoleMap, SystemUpgradePlan, bytes_to_pretty,
};

use crate::device::StorageDevice;
use crate::partition::Partition;

/// Subtrees measured on the merged overlay view to size the preserved
/// user data: the home directories and the printing configuration
const OVERLAY_MEASURED_SUBTREES: &[&str] = &["home", "etc/cups"];

/// Decide if and how the system partition of `device` can be upgraded.
///
/// `enlarged_system_size` is the size of the new system image in bytes,
/// already inflated by [`PlannerConfig::enlarge_system_size`]. A probe
/// failure aborts planning with [`PlanError::Probe`]; it is never treated
/// as zero usage, since that could wrongly approve a repartitioning.
pub fn plan_system_upgrade(
    device: &StorageDevice,
    enlarged_system_size: u64,
    probe: &dyn PartitionProbe,
    config: &PlannerConfig,
) -> Result<SystemUpgradePlan, PlanError> {
    let roles = device.classify(probe);
    let partitions = device.partitions();

    let Some(system_index) = roles.system else {
        return finish(device, SystemUpgradePlan::Impossible(NoUpgradeReason::NoSystemPartition));
    };
    let Some(data_index) = roles.data else {
        return finish(device, SystemUpgradePlan::Impossible(NoUpgradeReason::NoDataPartition));
    };

    let system = &partitions[system_index];
    let data = &partitions[data_index];

    // Size of the data to keep, as it appears when the read-only system
    // layers are merged with the data partition's writable overlay. One
    // overlay round trip per device instance; failures are memoized too.
    let old_data_size = device
        .overlay_size_cell()
        .get_or_probe(|| measure_old_data_size(system, data, probe))?;
    let old_data_size_enlarged = config.enlarge_data_size(old_data_size);
    tracing::info!(
        "old data size: {}, with overhead margin: {}, data partition: {}",
        bytes_to_pretty(&old_data_size, true),
        bytes_to_pretty(&old_data_size_enlarged, true),
        bytes_to_pretty(&data.size(), true)
    );
    if old_data_size_enlarged > data.size() {
        return finish(
            device,
            SystemUpgradePlan::Impossible(NoUpgradeReason::DataPartitionTooSmall {
                required_bytes: old_data_size_enlarged,
            }),
        );
    }

    if !schema_supported(&roles, partitions) {
        return finish(device, destructive_fallback(&roles));
    }

    let remaining = system.size() as i64 - enlarged_system_size as i64;
    tracing::debug!(
        "enlarged system size: {}, size of {}: {}, remaining: {}",
        enlarged_system_size,
        system.info().device_and_number(),
        system.size(),
        remaining
    );
    if remaining >= 0 {
        // the new system fits into the current system partition
        return finish(device, SystemUpgradePlan::Regular);
    }

    // The new system is larger than the current system partition. Check if
    // the partition right before it can be shrunk to make room.
    //
    // TODO: also handle devices with partition gaps and expansion in both
    // directions.
    if system_index > 0 {
        let previous = &partitions[system_index - 1];
        if !previous.info().is_extended() && previous.info().has_extended_filesystem() {
            // only ext[234] partitions can be resized
            let previous_used_space = if roles.data == Some(system_index - 1) {
                previous.preserved_data_size(probe)?
            } else {
                previous.used_space(probe)?
            };
            let usable_space = previous.size().saturating_sub(previous_used_space);
            if usable_space > remaining.unsigned_abs() {
                return finish(device, SystemUpgradePlan::Repartition);
            }
        }
    }

    finish(
        device,
        SystemUpgradePlan::Impossible(NoUpgradeReason::SystemPartitionTooSmall),
    )
}

/// The destructive path: without user data worth keeping the device gets a
/// clean installation, otherwise existing data is backed up and restored
/// around one.
pub fn destructive_fallback(roles: &RoleMap) -> SystemUpgradePlan {
    if roles.data.is_none() && roles.exchange.is_none() {
        SystemUpgradePlan::Installation
    } else {
        SystemUpgradePlan::Backup
    }
}

/// Check the partition geometry against the known layouts: the EFI
/// partition first, or second behind an exchange partition (the layout of
/// older removable drives).
fn schema_supported(roles: &RoleMap, partitions: &[Partition]) -> bool {
    let Some(efi_index) = roles.efi else {
        // old layout without any EFI partition
        return false;
    };

    match partitions[efi_index].number() {
        1 => true,
        2 => roles
            .exchange
            .is_some_and(|index| partitions[index].number() == 1),
        _ => false,
    }
}

fn measure_old_data_size(
    system: &Partition,
    data: &Partition,
    probe: &dyn PartitionProbe,
) -> Result<u64, ProbeError> {
    system.with_mount(probe, |system_path| {
        data.with_mount(probe, |data_path| {
            measure_merged_view(probe, data_path, system_path)
        })
    })
}

fn measure_merged_view(
    probe: &dyn PartitionProbe,
    data_path: &Path,
    system_path: &Path,
) -> Result<u64, ProbeError> {
    let merged = probe.mount_overlay(data_path, &[system_path.to_path_buf()])?;

    let measured = (|| {
        let mut total = 0;
        for subtree in OVERLAY_MEASURED_SUBTREES {
            total += probe.measure_directory_size(&merged.join(subtree))?;
        }
        Ok(total)
    })();

    if let Err(error) = probe.unmount_overlay(&merged) {
        tracing::warn!(
            "could not tear down overlay at {}: {}",
            merged.display(),
            error
        );
    }

    measured
}

fn finish(
    device: &StorageDevice,
    plan: SystemUpgradePlan,
) -> Result<SystemUpgradePlan, PlanError> {
    tracing::info!("system upgrade variant of {}: {}", device.info().device, plan);
    Ok(plan)
}
