// SPDX-License-Identifier: GPL-3.0-only

//! Storage device runtime object

use upgrade_contracts::PartitionProbe;
use upgrade_types::{DeviceInfo, PartitionInfo, RoleMap};

use crate::cell::ProbeCell;
use crate::classifier;
use crate::partition::Partition;

/// A storage device with its partitions and classified roles.
///
/// Constructed once per platform probe from plain descriptors and
/// read-mostly afterwards. The role map is classified on first use and
/// memoized; the role references are indices into this device's own
/// partition list, kept ordered by ascending partition number.
#[derive(Debug)]
pub struct StorageDevice {
    info: DeviceInfo,
    partitions: Vec<Partition>,
    roles: ProbeCell<RoleMap>,
    overlay_size: ProbeCell<u64>,
}

impl StorageDevice {
    pub fn new(info: DeviceInfo, mut partition_infos: Vec<PartitionInfo>) -> Self {
        partition_infos.sort_by_key(|partition| partition.number);
        let partitions = partition_infos.into_iter().map(Partition::new).collect();
        Self {
            info,
            partitions,
            roles: ProbeCell::new(),
            overlay_size: ProbeCell::new(),
        }
    }

    /// Memoization cell for the preserved-data measurement on the merged
    /// overlay view; the measurement itself lives in the system planner.
    pub(crate) fn overlay_size_cell(&self) -> &ProbeCell<u64> {
        &self.overlay_size
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// The partitions of this device, ordered by ascending number
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Classify the partitions of this device.
    ///
    /// Runs the classification sequence once per instance and memoizes the
    /// result; per-partition probe failures leave the affected partition
    /// unclassified instead of failing the device.
    pub fn classify(&self, probe: &dyn PartitionProbe) -> RoleMap {
        self.roles.get_or_init(|| {
            let roles = classifier::classify(&self.partitions, probe);
            tracing::info!(
                "classified {} ({}): {:?}",
                self.info.device,
                self.info.display_name(),
                roles
            );
            roles
        })
    }

    /// The classified data partition, if any
    pub fn data_partition(&self, probe: &dyn PartitionProbe) -> Option<&Partition> {
        self.classify(probe).data.map(|index| &self.partitions[index])
    }

    /// The classified EFI partition, if any
    pub fn efi_partition(&self, probe: &dyn PartitionProbe) -> Option<&Partition> {
        self.classify(probe).efi.map(|index| &self.partitions[index])
    }

    /// The classified exchange partition, if any
    pub fn exchange_partition(&self, probe: &dyn PartitionProbe) -> Option<&Partition> {
        self.classify(probe)
            .exchange
            .map(|index| &self.partitions[index])
    }

    /// The classified system partition, if any
    pub fn system_partition(&self, probe: &dyn PartitionProbe) -> Option<&Partition> {
        self.classify(probe)
            .system
            .map(|index| &self.partitions[index])
    }
}
