// SPDX-License-Identifier: GPL-3.0-only

//! Storage device data model

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::common::bytes_to_pretty;

/// All known types of storage devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    /// A CD or DVD
    OpticalDisc,

    /// A hard drive (internal disks and anything unrecognized)
    HardDrive,

    /// A USB flash drive
    UsbFlashDrive,

    /// A secure digital memory card
    SdMemoryCard,

    /// An NVM Express device
    Nvme,
}

impl DeviceType {
    /// Derive the device type from properties the discovery layer reports.
    ///
    /// Small heuristic: optical media and the kernel device name win over the
    /// connection bus; a non-internal device on the USB bus is a flash drive;
    /// everything else is treated as a hard drive.
    pub fn derive(
        device: &str,
        connection_bus: Option<&str>,
        system_internal: bool,
        optical: bool,
    ) -> Self {
        if optical {
            DeviceType::OpticalDisc
        } else if device.starts_with("mmcblk") {
            DeviceType::SdMemoryCard
        } else if device.starts_with("nvme") {
            DeviceType::Nvme
        } else if !system_internal && connection_bus == Some("usb") {
            DeviceType::UsbFlashDrive
        } else {
            DeviceType::HardDrive
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceType::OpticalDisc => "OpticalDisc",
            DeviceType::HardDrive => "HardDrive",
            DeviceType::UsbFlashDrive => "USBFlashDrive",
            DeviceType::SdMemoryCard => "SDMemoryCard",
            DeviceType::Nvme => "NVMe",
        };
        f.write_str(name)
    }
}

/// A storage device as reported by the external discovery layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Kernel device name (e.g. "sda" or "nvme0n1")
    pub device: String,

    /// Vendor/manufacturer name
    pub vendor: String,

    /// Device model name
    pub model: String,

    /// Firmware revision
    pub revision: String,

    /// Serial number
    pub serial: String,

    /// Total size in bytes
    pub size: u64,

    /// Whether the device is removable (as reported by the kernel)
    pub removable: bool,

    /// Bus-derived device type
    pub device_type: DeviceType,
}

impl DeviceInfo {
    /// Human-readable display name for log and reason messages
    pub fn display_name(&self) -> String {
        if !self.model.is_empty() {
            self.model.clone()
        } else if !self.vendor.is_empty() {
            format!("{} Disk", self.vendor)
        } else {
            self.device.clone()
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}",
            self.device,
            self.device_type,
            bytes_to_pretty(&self.size, false)
        )
    }
}

// Two probes of the same physical device compare equal even when vendor
// strings were reported differently, so identity is device name plus size.
impl PartialEq for DeviceInfo {
    fn eq(&self, other: &Self) -> bool {
        self.device == other.device && self.size == other.size
    }
}

impl Eq for DeviceInfo {}

impl Hash for DeviceInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.device.hash(state);
        self.size.hash(state);
    }
}

impl PartialOrd for DeviceInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DeviceInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.device.cmp(&other.device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(device: &str, size: u64) -> DeviceInfo {
        DeviceInfo {
            device: device.to_string(),
            vendor: String::new(),
            model: String::new(),
            revision: String::new(),
            serial: String::new(),
            size,
            removable: true,
            device_type: DeviceType::UsbFlashDrive,
        }
    }

    #[test]
    fn derives_type_from_name_and_bus() {
        assert_eq!(
            DeviceType::derive("sr0", None, false, true),
            DeviceType::OpticalDisc
        );
        assert_eq!(
            DeviceType::derive("mmcblk0", None, false, false),
            DeviceType::SdMemoryCard
        );
        assert_eq!(
            DeviceType::derive("nvme0n1", Some("nvme"), true, false),
            DeviceType::Nvme
        );
        assert_eq!(
            DeviceType::derive("sdb", Some("usb"), false, false),
            DeviceType::UsbFlashDrive
        );
        assert_eq!(
            DeviceType::derive("sda", Some("ata"), true, false),
            DeviceType::HardDrive
        );
    }

    #[test]
    fn usb_bus_of_internal_device_is_hard_drive() {
        assert_eq!(
            DeviceType::derive("sda", Some("usb"), true, false),
            DeviceType::HardDrive
        );
    }

    #[test]
    fn identity_is_device_and_size() {
        let mut left = info("sdb", 8_000_000_000);
        left.model = "FlashThing".to_string();
        let right = info("sdb", 8_000_000_000);
        assert_eq!(left, right);
        assert_ne!(right, info("sdb", 16_000_000_000));
    }

    #[test]
    fn display_name_prefers_model_over_vendor_over_device() {
        let mut device = info("sdb", 8_000_000_000);
        assert_eq!(device.display_name(), "sdb");

        device.vendor = "Kingston".to_string();
        assert_eq!(device.display_name(), "Kingston Disk");

        device.model = "DataTraveler".to_string();
        assert_eq!(device.display_name(), "DataTraveler");
    }

    #[test]
    fn orders_by_device_name() {
        assert!(info("sda", 1) < info("sdb", 1));
    }
}
