// SPDX-License-Identifier: GPL-3.0-only

// not every test binary uses every helper
#![allow(dead_code)]

use std::sync::Once;

use upgrade_planner::StorageDevice;
use upgrade_testing::{FakeFilesystem, FakeProbe, fixtures};
use upgrade_types::PartitionInfo;

pub const GIB: u64 = 1024 * 1024 * 1024;

/// The current default layout of an installed drive:
/// EFI (1), exchange (2), persistence (3), system (4)
pub fn standard_partitions(device: &str) -> Vec<PartitionInfo> {
    vec![
        fixtures::efi_partition(device, 1, 200_000_000),
        fixtures::exchange_partition(device, 2, 4 * GIB),
        fixtures::data_partition(device, 3, 2_000_000_000),
        fixtures::system_partition(device, 4, 4_000_000_000),
    ]
}

/// Register every partition with the probe; the system partition gets the
/// squashfs layout so classification can discover it.
pub fn script_probe(probe: &FakeProbe, partitions: &[PartitionInfo], system_number: u32) {
    init_tracing();
    for partition in partitions {
        if partition.number == system_number {
            probe.add_partition_with(
                partition,
                FakeFilesystem {
                    has_squashfs_layout: true,
                    ..FakeFilesystem::default()
                },
            );
        } else {
            probe.add_partition(partition);
        }
    }
}

/// Route planner logs to the test output when RUST_LOG is set
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn device_with(partitions: Vec<PartitionInfo>) -> (StorageDevice, FakeProbe) {
    init_tracing();
    let probe = FakeProbe::new();
    script_probe(&probe, &partitions, 4);
    let device = StorageDevice::new(fixtures::usb_device("sdb", 16 * GIB), partitions);
    (device, probe)
}
