// SPDX-License-Identifier: GPL-3.0-only

//! Partition descriptor model
//!
//! A `PartitionInfo` is a strongly-typed snapshot of the raw partition
//! properties the discovery layer reads from the platform. All label and
//! type checks on it are pure; anything that needs a mount lives in
//! `upgrade-planner`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The label used for EFI partitions
pub const EFI_LABEL: &str = "EFI";

/// The label used for persistence partitions
pub const PERSISTENCE_LABEL: &str = "persistence";

/// Labels older releases used for the EFI partition
pub const LEGACY_EFI_LABELS: &[&str] = &["boot"];

/// Labels older releases used for the persistence partition
pub const LEGACY_PERSISTENCE_LABELS: &[&str] = &["live-rw"];

/// Partition table type codes for DOS extended/container partitions
const EXTENDED_TYPE_CODES: &[&str] = &["0x05", "0x0f"];

/// A partition as reported by the external discovery layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionInfo {
    /// Kernel device name of the parent device (e.g. "sda" or "nvme0n1")
    pub device: String,

    /// 1-based partition number; defines ordering on the device
    pub number: u32,

    /// Byte offset (start) of the partition on the device
    pub offset: u64,

    /// Size in bytes
    pub size: u64,

    /// Partition table type code (e.g. "0x83" for Linux partitions)
    pub type_code: String,

    /// Filesystem label (empty if unset)
    pub label: String,

    /// Filesystem type (e.g. "vfat", "ext4")
    pub fs_type: String,
}

impl PartitionInfo {
    /// The device and number of this partition, e.g. "sda1" or "nvme0n1p1"
    pub fn device_and_number(&self) -> String {
        if self.device.starts_with("mmcblk") || self.device.starts_with("nvme") {
            format!("{}p{}", self.device, self.number)
        } else {
            format!("{}{}", self.device, self.number)
        }
    }

    /// Check if the partition is a DOS extended/container partition
    pub fn is_extended(&self) -> bool {
        EXTENDED_TYPE_CODES
            .iter()
            .any(|code| self.type_code == *code)
    }

    /// Check if the filesystem on the partition is ext[2|3|4]
    pub fn has_extended_filesystem(&self) -> bool {
        matches!(self.fs_type.as_str(), "ext2" | "ext3" | "ext4")
    }

    /// Check if the label marks this as an EFI/boot partition
    pub fn has_efi_label(&self) -> bool {
        self.label == EFI_LABEL || LEGACY_EFI_LABELS.iter().any(|label| self.label == *label)
    }

    /// Check if the label marks this as a persistence partition
    pub fn has_persistence_label(&self) -> bool {
        self.label == PERSISTENCE_LABEL
            || LEGACY_PERSISTENCE_LABELS
                .iter()
                .any(|label| self.label == *label)
    }

    /// Check if partition number, table type and filesystem type match the
    /// exchange partition convention.
    ///
    /// The exchange partition is either the first partition (legacy layout
    /// where the boot partition was not first) or the second partition
    /// (current layout where the boot partition must be first). Type 0x07
    /// carries exFAT or NTFS, types 0x0c/0x0e carry FAT32.
    pub fn matches_exchange_convention(&self) -> bool {
        if self.number != 1 && self.number != 2 {
            return false;
        }

        match self.type_code.as_str() {
            "0x07" => matches!(self.fs_type.as_str(), "exfat" | "ntfs"),
            "0x0c" | "0x0e" => self.fs_type == "vfat",
            _ => false,
        }
    }
}

impl fmt::Display for PartitionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/dev/{}, offset: {}, size: {}",
            self.device_and_number(),
            self.offset,
            self.size
        )?;
        if !self.label.is_empty() {
            write!(f, ", label: \"{}\"", self.label)?;
        }
        if !self.fs_type.is_empty() {
            write!(f, ", fs type: \"{}\"", self.fs_type)?;
        }
        if !self.type_code.is_empty() {
            write!(f, ", type: \"{}\"", self.type_code)?;
        }
        Ok(())
    }
}
