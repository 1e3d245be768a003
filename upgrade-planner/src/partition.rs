// SPDX-License-Identifier: GPL-3.0-only

//! Partition runtime object with memoized probe results

use std::path::Path;

use upgrade_contracts::{PartitionProbe, PartitionRef, ProbeError};
use upgrade_types::{PartitionInfo, bytes_to_pretty};

use crate::cell::ProbeCell;

/// Subtrees on the data partition that survive a regular upgrade
const PRESERVED_SUBTREES: &[&str] = &["home/user", "etc/cups"];

/// A partition on a classified storage device.
///
/// Wraps the immutable [`PartitionInfo`] descriptor and memoizes the two
/// facts that need a mount round trip: whether the partition carries a
/// live system layout, and how much space is used on it. Both are computed
/// at most once per instance.
#[derive(Debug)]
pub struct Partition {
    info: PartitionInfo,
    system_flag: ProbeCell<bool>,
    used_space: ProbeCell<u64>,
    preserved_data: ProbeCell<u64>,
}

impl Partition {
    pub fn new(info: PartitionInfo) -> Self {
        Self {
            info,
            system_flag: ProbeCell::new(),
            used_space: ProbeCell::new(),
            preserved_data: ProbeCell::new(),
        }
    }

    /// The immutable descriptor of this partition
    pub fn info(&self) -> &PartitionInfo {
        &self.info
    }

    /// 1-based partition number
    pub fn number(&self) -> u32 {
        self.info.number
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.info.size
    }

    /// Identity handed to the probe
    pub fn probe_ref(&self) -> PartitionRef {
        PartitionRef::from(&self.info)
    }

    /// Check if this partition holds a live system image (a "live"
    /// directory containing at least one squashfs).
    ///
    /// Needs a mount round trip; the answer is memoized, a probe failure
    /// included.
    pub fn is_system(&self, probe: &dyn PartitionProbe) -> Result<bool, ProbeError> {
        self.system_flag.get_or_probe(|| {
            self.with_mount(probe, |path| probe.has_squashfs_system_layout(path))
        })
    }

    /// Used space on this partition's filesystem (total minus free).
    ///
    /// Memoized; a measurement failure stays a failure on repeat calls.
    pub fn used_space(&self, probe: &dyn PartitionProbe) -> Result<u64, ProbeError> {
        self.used_space.get_or_probe(|| {
            let used = self.with_mount(probe, |path| {
                probe.filesystem_usage(path).map(|usage| usage.used_bytes())
            })?;
            tracing::info!(
                "used space on {}: {}",
                self.info.device_and_number(),
                bytes_to_pretty(&used, true)
            );
            Ok(used)
        })
    }

    /// Size of the subtrees a regular upgrade keeps (the user's home
    /// directory and the printing configuration), measured directly on
    /// this partition. Memoized.
    pub fn preserved_data_size(&self, probe: &dyn PartitionProbe) -> Result<u64, ProbeError> {
        self.preserved_data.get_or_probe(|| {
            let preserved = self.with_mount(probe, |path| {
                let mut total = 0;
                for subtree in PRESERVED_SUBTREES {
                    total += probe.measure_directory_size(&path.join(subtree))?;
                }
                Ok(total)
            })?;
            tracing::info!(
                "preserved data on {}: {}",
                self.info.device_and_number(),
                bytes_to_pretty(&preserved, true)
            );
            Ok(preserved)
        })
    }

    /// Mount this partition, run `action` against the mount path and
    /// unmount again unless the partition was already mounted.
    pub fn with_mount<T>(
        &self,
        probe: &dyn PartitionProbe,
        action: impl FnOnce(&Path) -> Result<T, ProbeError>,
    ) -> Result<T, ProbeError> {
        let partition_ref = self.probe_ref();
        let mounted = probe.mount(&partition_ref)?;
        let result = action(&mounted.path);
        if !mounted.was_already_mounted
            && let Err(error) = probe.unmount(&partition_ref)
        {
            tracing::warn!(
                "could not unmount {}: {}",
                partition_ref.device_and_number(),
                error
            );
        }
        result
    }
}
