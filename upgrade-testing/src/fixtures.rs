// SPDX-License-Identifier: GPL-3.0-only

//! Descriptor builders for the common device layouts

use upgrade_types::{DeviceInfo, DeviceType, PartitionInfo};

/// A removable USB flash drive descriptor
pub fn usb_device(device: &str, size: u64) -> DeviceInfo {
    DeviceInfo {
        device: device.to_string(),
        vendor: "Test".to_string(),
        model: "Flash Drive".to_string(),
        revision: "1.0".to_string(),
        serial: "0000".to_string(),
        size,
        removable: true,
        device_type: DeviceType::UsbFlashDrive,
    }
}

/// A bare partition descriptor; customize via the struct fields
pub fn partition(device: &str, number: u32, size: u64) -> PartitionInfo {
    PartitionInfo {
        device: device.to_string(),
        number,
        offset: u64::from(number) * 1_000_000_000,
        size,
        type_code: "0x83".to_string(),
        label: String::new(),
        fs_type: "ext4".to_string(),
    }
}

/// An EFI partition (label "EFI", FAT32)
pub fn efi_partition(device: &str, number: u32, size: u64) -> PartitionInfo {
    PartitionInfo {
        type_code: "0xef".to_string(),
        label: "EFI".to_string(),
        fs_type: "vfat".to_string(),
        ..partition(device, number, size)
    }
}

/// An exchange partition (exFAT on table type 0x07)
pub fn exchange_partition(device: &str, number: u32, size: u64) -> PartitionInfo {
    PartitionInfo {
        type_code: "0x07".to_string(),
        fs_type: "exfat".to_string(),
        ..partition(device, number, size)
    }
}

/// A persistence partition (label "persistence", ext4)
pub fn data_partition(device: &str, number: u32, size: u64) -> PartitionInfo {
    PartitionInfo {
        label: "persistence".to_string(),
        ..partition(device, number, size)
    }
}

/// A system partition descriptor (unlabeled ext4; pair it with a scripted
/// squashfs layout so classification can discover it)
pub fn system_partition(device: &str, number: u32, size: u64) -> PartitionInfo {
    partition(device, number, size)
}
