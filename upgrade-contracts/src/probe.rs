// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use upgrade_types::PartitionInfo;

use crate::ProbeError;

/// Identity of a partition handed to the probe.
///
/// The probe owns all platform access, so identity is all it needs; the
/// full descriptor stays with the planner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionRef {
    /// Kernel device name of the parent device (e.g. "sdb")
    pub device: String,

    /// 1-based partition number
    pub number: u32,
}

impl PartitionRef {
    /// The device and number of this partition, e.g. "sdb1" or "nvme0n1p1"
    pub fn device_and_number(&self) -> String {
        if self.device.starts_with("mmcblk") || self.device.starts_with("nvme") {
            format!("{}p{}", self.device, self.number)
        } else {
            format!("{}{}", self.device, self.number)
        }
    }
}

impl From<&PartitionInfo> for PartitionRef {
    fn from(info: &PartitionInfo) -> Self {
        Self {
            device: info.device.clone(),
            number: info.number,
        }
    }
}

/// Result of mounting a partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedPartition {
    /// Where the partition is mounted
    pub path: PathBuf,

    /// Whether the partition was already mounted before the call; if so,
    /// the caller must not unmount it again
    pub was_already_mounted: bool,
}

/// Filesystem usage figures of a mounted filesystem.
///
/// The partition size is not usable here: the filesystem is a little
/// smaller than its partition because of filesystem overhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsUsage {
    /// Total filesystem size in bytes
    pub total_bytes: u64,

    /// Free bytes
    pub free_bytes: u64,
}

impl FsUsage {
    /// Used bytes (total minus free)
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.free_bytes)
    }
}

/// Blocking platform collaborator for mounting and size measurement.
///
/// All calls are synchronous: classification and planning are strictly
/// staged, so the only suspension points are these blocking round trips.
/// A timeout imposed by the implementation surfaces as
/// [`ProbeError::Timeout`].
pub trait PartitionProbe: Send + Sync {
    /// Mount a partition (or report its existing mount point)
    fn mount(&self, partition: &PartitionRef) -> Result<MountedPartition, ProbeError>;

    /// Unmount a partition previously mounted by [`Self::mount`]
    fn unmount(&self, partition: &PartitionRef) -> Result<(), ProbeError>;

    /// Check for a "live" directory containing at least one "*.squashfs"
    /// file below the given mount path
    fn has_squashfs_system_layout(&self, mount_path: &Path) -> Result<bool, ProbeError>;

    /// Recursively measure the size of a directory in bytes; a missing
    /// directory measures zero
    fn measure_directory_size(&self, path: &Path) -> Result<u64, ProbeError>;

    /// Report total/free bytes of the filesystem mounted at the given path
    fn filesystem_usage(&self, mount_path: &Path) -> Result<FsUsage, ProbeError>;

    /// Merge read-only layers with a writable layer and return the merged
    /// view's path; used solely to measure the user-changed data footprint
    fn mount_overlay(
        &self,
        rw_path: &Path,
        ro_layers: &[PathBuf],
    ) -> Result<PathBuf, ProbeError>;

    /// Tear down an overlay previously assembled by [`Self::mount_overlay`]
    fn unmount_overlay(&self, merged_path: &Path) -> Result<(), ProbeError>;
}
