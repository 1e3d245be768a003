// SPDX-License-Identifier: GPL-3.0-only

//! Classification against scripted devices

mod common;

use common::{device_with, standard_partitions};
use upgrade_planner::StorageDevice;
use upgrade_testing::{FakeFilesystem, FakeProbe, fixtures};
use upgrade_types::{PartitionInfo, Role};

#[test]
fn standard_layout_assigns_all_four_roles() {
    let (device, probe) = device_with(standard_partitions("sdb"));
    let roles = device.classify(&probe);

    assert_eq!(roles.efi, Some(0));
    assert_eq!(roles.exchange, Some(1));
    assert_eq!(roles.data, Some(2));
    assert_eq!(roles.system, Some(3));
    assert_eq!(roles.role_of(0), Role::Efi);
}

#[test]
fn partitions_are_ordered_by_number_regardless_of_input_order() {
    let mut partitions = standard_partitions("sdb");
    partitions.reverse();
    let (device, _probe) = device_with(partitions);

    let numbers: Vec<u32> = device
        .partitions()
        .iter()
        .map(|partition| partition.number())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
}

#[test]
fn only_the_lowest_numbered_persistence_partition_becomes_data() {
    let probe = FakeProbe::new();
    let first = fixtures::data_partition("sdb", 1, 1_000_000);
    let second = fixtures::data_partition("sdb", 2, 1_000_000);
    probe.add_partition(&first);
    probe.add_partition(&second);

    let device = StorageDevice::new(
        fixtures::usb_device("sdb", 8_000_000_000),
        vec![second.clone(), first.clone()],
    );
    let roles = device.classify(&probe);

    assert_eq!(roles.data, Some(0), "partition 1 takes the data role");
    assert_eq!(roles.role_of(1), Role::None);
}

#[test]
fn efi_label_wins_over_exchange_convention() {
    // label "EFI" on a partition that also satisfies the exchange
    // predicate; the more specific predicate runs first
    let probe = FakeProbe::new();
    let partition = PartitionInfo {
        label: "EFI".to_string(),
        type_code: "0x0c".to_string(),
        fs_type: "vfat".to_string(),
        ..fixtures::partition("sdb", 1, 200_000_000)
    };
    probe.add_partition(&partition);

    let device = StorageDevice::new(fixtures::usb_device("sdb", 8_000_000_000), vec![partition]);
    let roles = device.classify(&probe);

    assert_eq!(roles.efi, Some(0));
    assert_eq!(roles.exchange, None);
}

#[test]
fn persistence_label_wins_over_exchange_convention() {
    let probe = FakeProbe::new();
    let partition = PartitionInfo {
        label: "persistence".to_string(),
        type_code: "0x0c".to_string(),
        fs_type: "vfat".to_string(),
        ..fixtures::partition("sdb", 1, 1_000_000_000)
    };
    probe.add_partition(&partition);

    let device = StorageDevice::new(fixtures::usb_device("sdb", 8_000_000_000), vec![partition]);
    let roles = device.classify(&probe);

    assert_eq!(roles.data, Some(0));
    assert_eq!(roles.exchange, None);
}

#[test]
fn legacy_boot_label_is_an_efi_partition() {
    let probe = FakeProbe::new();
    let partition = PartitionInfo {
        label: "boot".to_string(),
        fs_type: "vfat".to_string(),
        ..fixtures::partition("sdb", 2, 200_000_000)
    };
    probe.add_partition(&partition);

    let device = StorageDevice::new(fixtures::usb_device("sdb", 8_000_000_000), vec![partition]);
    assert_eq!(device.classify(&probe).efi, Some(0));
}

#[test]
fn cheap_matches_are_never_mounted() {
    let partitions = standard_partitions("sdb");
    let (device, probe) = device_with(partitions.clone());
    device.classify(&probe);

    // only the system candidate needed a mount round trip
    assert_eq!(probe.mount_count(&partitions[0]), 0);
    assert_eq!(probe.mount_count(&partitions[1]), 0);
    assert_eq!(probe.mount_count(&partitions[2]), 0);
    assert_eq!(probe.mount_count(&partitions[3]), 1);
    assert!(!probe.has_leftover_mounts());
}

#[test]
fn classification_is_memoized_per_device() {
    let partitions = standard_partitions("sdb");
    let (device, probe) = device_with(partitions.clone());

    let first = device.classify(&probe);
    let second = device.classify(&probe);

    assert_eq!(first, second);
    assert_eq!(probe.mount_count(&partitions[3]), 1);
}

#[test]
fn probe_failure_leaves_partition_unclassified_but_continues() {
    let probe = FakeProbe::new();
    let broken = fixtures::partition("sdb", 1, 1_000_000_000);
    let data = fixtures::data_partition("sdb", 2, 1_000_000_000);
    let system = fixtures::system_partition("sdb", 3, 4_000_000_000);
    probe.add_partition_with(
        &broken,
        FakeFilesystem {
            fail_mount: true,
            ..FakeFilesystem::default()
        },
    );
    probe.add_partition(&data);
    probe.add_partition_with(
        &system,
        FakeFilesystem {
            has_squashfs_layout: true,
            ..FakeFilesystem::default()
        },
    );

    let device = StorageDevice::new(
        fixtures::usb_device("sdb", 8_000_000_000),
        vec![broken, data, system],
    );
    let roles = device.classify(&probe);

    assert_eq!(roles.role_of(0), Role::None);
    assert_eq!(roles.data, Some(1));
    assert_eq!(roles.system, Some(2));
}
