// SPDX-License-Identifier: GPL-3.0-only

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use upgrade_contracts::{FsUsage, MountedPartition, PartitionProbe, PartitionRef, ProbeError};
use upgrade_types::PartitionInfo;

/// A virtual filesystem scripted onto a partition
#[derive(Debug, Clone, Default)]
pub struct FakeFilesystem {
    /// Whether the partition counts as mounted before the first probe call
    pub already_mounted: bool,

    /// Whether the mount path shows a "live" dir with squashfs images
    pub has_squashfs_layout: bool,

    /// Total/free figures reported for the mounted filesystem
    pub usage: Option<FsUsage>,

    /// Make mount attempts fail
    pub fail_mount: bool,
}

#[derive(Default)]
struct State {
    filesystems: HashMap<String, FakeFilesystem>,
    mounted: HashSet<String>,
    mount_counts: HashMap<String, u32>,
    directory_sizes: HashMap<PathBuf, u64>,
    failing_measurements: HashSet<PathBuf>,
    active_overlays: HashSet<PathBuf>,
}

/// In-memory scripted [`PartitionProbe`].
///
/// Mount paths are deterministic (`/probe/<device_and_number>`), overlay
/// merge paths are derived from the writable layer's mount path
/// ([`FakeProbe::merged_path`]), so tests can script directory sizes for
/// both before planning runs.
#[derive(Default)]
pub struct FakeProbe {
    state: Mutex<State>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a partition with a default (empty, unmounted) filesystem
    /// and return its future mount path
    pub fn add_partition(&self, info: &PartitionInfo) -> PathBuf {
        self.add_partition_with(info, FakeFilesystem::default())
    }

    /// Register a partition with a scripted filesystem and return its
    /// future mount path
    pub fn add_partition_with(&self, info: &PartitionInfo, filesystem: FakeFilesystem) -> PathBuf {
        let key = Self::key(info);
        let mut state = self.lock();
        if filesystem.already_mounted {
            state.mounted.insert(key.clone());
        }
        state.filesystems.insert(key, filesystem);
        Self::mount_path(info)
    }

    /// Script the recursive size of a directory
    pub fn set_directory_size(&self, path: impl Into<PathBuf>, bytes: u64) {
        self.lock().directory_sizes.insert(path.into(), bytes);
    }

    /// Make measuring a directory fail
    pub fn fail_measurement(&self, path: impl Into<PathBuf>) {
        self.lock().failing_measurements.insert(path.into());
    }

    /// How often a partition has been mounted so far
    pub fn mount_count(&self, info: &PartitionInfo) -> u32 {
        *self
            .lock()
            .mount_counts
            .get(&Self::key(info))
            .unwrap_or(&0)
    }

    /// Whether any partition or overlay is still mounted
    pub fn has_leftover_mounts(&self) -> bool {
        let state = self.lock();
        let externally_mounted = state
            .mounted
            .iter()
            .filter(|key| {
                state
                    .filesystems
                    .get(*key)
                    .is_some_and(|filesystem| filesystem.already_mounted)
            })
            .count();
        state.mounted.len() > externally_mounted || !state.active_overlays.is_empty()
    }

    /// The deterministic mount path of a registered partition
    pub fn mount_path(info: &PartitionInfo) -> PathBuf {
        PathBuf::from(format!("/probe/{}", PartitionRef::from(info).device_and_number()))
    }

    /// The merge path an overlay over the given writable layer gets
    pub fn merged_path(rw_mount: &Path) -> PathBuf {
        rw_mount.join("merged")
    }

    fn key(info: &PartitionInfo) -> String {
        PartitionRef::from(info).device_and_number()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn path_key(partition: &PartitionRef) -> String {
        partition.device_and_number()
    }
}

impl PartitionProbe for FakeProbe {
    fn mount(&self, partition: &PartitionRef) -> Result<MountedPartition, ProbeError> {
        let key = Self::path_key(partition);
        let mut state = self.lock();

        let filesystem =
            state
                .filesystems
                .get(&key)
                .cloned()
                .ok_or_else(|| ProbeError::Mount {
                    device: key.clone(),
                    reason: "unknown partition".to_string(),
                })?;
        if filesystem.fail_mount {
            return Err(ProbeError::Mount {
                device: key,
                reason: "scripted mount failure".to_string(),
            });
        }

        *state.mount_counts.entry(key.clone()).or_insert(0) += 1;
        let was_already_mounted = state.mounted.contains(&key);
        if !was_already_mounted {
            state.mounted.insert(key.clone());
        }

        Ok(MountedPartition {
            path: PathBuf::from(format!("/probe/{key}")),
            was_already_mounted,
        })
    }

    fn unmount(&self, partition: &PartitionRef) -> Result<(), ProbeError> {
        let key = Self::path_key(partition);
        let mut state = self.lock();
        if state.mounted.remove(&key) {
            Ok(())
        } else {
            Err(ProbeError::Unmount {
                device: key,
                reason: "not mounted".to_string(),
            })
        }
    }

    fn has_squashfs_system_layout(&self, mount_path: &Path) -> Result<bool, ProbeError> {
        let state = self.lock();
        let layout = mount_path
            .strip_prefix("/probe")
            .ok()
            .and_then(|key| state.filesystems.get(&key.to_string_lossy().to_string()))
            .is_some_and(|filesystem| filesystem.has_squashfs_layout);
        Ok(layout)
    }

    fn measure_directory_size(&self, path: &Path) -> Result<u64, ProbeError> {
        let state = self.lock();
        if state.failing_measurements.contains(path) {
            return Err(ProbeError::Measure {
                path: path.to_path_buf(),
                reason: "scripted measurement failure".to_string(),
            });
        }
        // unscripted directories do not exist and measure zero
        Ok(*state.directory_sizes.get(path).unwrap_or(&0))
    }

    fn filesystem_usage(&self, mount_path: &Path) -> Result<FsUsage, ProbeError> {
        let state = self.lock();
        mount_path
            .strip_prefix("/probe")
            .ok()
            .and_then(|key| state.filesystems.get(&key.to_string_lossy().to_string()))
            .and_then(|filesystem| filesystem.usage)
            .ok_or_else(|| ProbeError::Usage {
                path: mount_path.to_path_buf(),
                reason: "no usage scripted".to_string(),
            })
    }

    fn mount_overlay(&self, rw_path: &Path, ro_layers: &[PathBuf]) -> Result<PathBuf, ProbeError> {
        if ro_layers.is_empty() {
            return Err(ProbeError::Overlay {
                rw_path: rw_path.to_path_buf(),
                reason: "no read-only layers".to_string(),
            });
        }
        let merged = Self::merged_path(rw_path);
        self.lock().active_overlays.insert(merged.clone());
        Ok(merged)
    }

    fn unmount_overlay(&self, merged_path: &Path) -> Result<(), ProbeError> {
        if self.lock().active_overlays.remove(merged_path) {
            Ok(())
        } else {
            Err(ProbeError::Overlay {
                rw_path: merged_path.to_path_buf(),
                reason: "no overlay mounted here".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn mount_round_trip_tracks_state() {
        let probe = FakeProbe::new();
        let info = fixtures::data_partition("sdb", 3, 1_000_000);
        probe.add_partition(&info);

        let partition_ref = PartitionRef::from(&info);
        let mounted = probe.mount(&partition_ref).expect("mount");
        assert_eq!(mounted.path, PathBuf::from("/probe/sdb3"));
        assert!(!mounted.was_already_mounted);
        assert!(probe.has_leftover_mounts());

        probe.unmount(&partition_ref).expect("unmount");
        assert!(!probe.has_leftover_mounts());
        assert_eq!(probe.mount_count(&info), 1);
    }

    #[test]
    fn already_mounted_partitions_stay_mounted() {
        let probe = FakeProbe::new();
        let info = fixtures::data_partition("sdb", 3, 1_000_000);
        probe.add_partition_with(
            &info,
            FakeFilesystem {
                already_mounted: true,
                ..FakeFilesystem::default()
            },
        );

        let mounted = probe.mount(&PartitionRef::from(&info)).expect("mount");
        assert!(mounted.was_already_mounted);
        assert!(!probe.has_leftover_mounts());
    }

    #[test]
    fn unknown_partition_fails_to_mount() {
        let probe = FakeProbe::new();
        let info = fixtures::data_partition("sdb", 3, 1_000_000);
        assert!(probe.mount(&PartitionRef::from(&info)).is_err());
    }

    #[test]
    fn overlay_round_trip() {
        let probe = FakeProbe::new();
        let rw = PathBuf::from("/probe/sdb3");
        let merged = probe
            .mount_overlay(&rw, &[PathBuf::from("/probe/sdb4")])
            .expect("overlay");
        assert_eq!(merged, PathBuf::from("/probe/sdb3/merged"));
        probe.unmount_overlay(&merged).expect("teardown");
        assert!(probe.unmount_overlay(&merged).is_err());
    }
}
