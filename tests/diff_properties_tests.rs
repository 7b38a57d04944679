use media_device_monitor::device::{DeviceDescriptor, DeviceKind, SnapshotStore, diff};
use std::collections::HashSet;

mod test_utils;
use test_utils::{DeviceDescriptorBuilder, SnapshotBuilder};

fn keys(devices: &[DeviceDescriptor]) -> HashSet<(DeviceKind, String)> {
    devices
        .iter()
        .map(|d| (d.kind, d.device_id.clone()))
        .collect()
}

#[test]
fn test_diff_of_snapshot_with_itself_is_empty() {
    let snapshot = SnapshotBuilder::new()
        .with(DeviceDescriptorBuilder::audio_input("id1"))
        .with(DeviceDescriptorBuilder::audio_output("id2"))
        .with(DeviceDescriptorBuilder::video_input("id3"))
        .build();

    assert!(diff(&snapshot, &snapshot).is_empty());
}

#[test]
fn test_added_and_reverse_removed_have_equal_keys() {
    let a = SnapshotBuilder::new()
        .with(DeviceDescriptorBuilder::audio_input("id1"))
        .with(DeviceDescriptorBuilder::audio_output("id2"))
        .build();
    let b = SnapshotBuilder::new()
        .with(DeviceDescriptorBuilder::audio_input("id1"))
        .with(DeviceDescriptorBuilder::audio_input("id3"))
        .with(DeviceDescriptorBuilder::video_input("id4"))
        .build();

    let forward = diff(&a, &b);
    let backward = diff(&b, &a);

    assert_eq!(keys(&forward.added), keys(&backward.removed));
    assert_eq!(keys(&forward.removed), keys(&backward.added));
}

#[test]
fn test_added_input_scenario() {
    let previous = SnapshotBuilder::new()
        .with(DeviceDescriptorBuilder::audio_input("id1"))
        .with(DeviceDescriptorBuilder::audio_output("id2"))
        .build();
    let current = SnapshotBuilder::new()
        .with(DeviceDescriptorBuilder::audio_input("id1"))
        .with(DeviceDescriptorBuilder::audio_output("id2"))
        .with(DeviceDescriptorBuilder::audio_input("id3"))
        .build();

    let delta = diff(&previous, &current);
    assert_eq!(
        keys(&delta.added),
        HashSet::from([(DeviceKind::AudioInput, "id3".to_string())])
    );
    assert!(delta.removed.is_empty());
}

#[test]
fn test_same_id_under_another_kind_is_a_different_device() {
    let previous = SnapshotBuilder::new()
        .with(DeviceDescriptorBuilder::audio_input("shared"))
        .build();
    let current = SnapshotBuilder::new()
        .with(DeviceDescriptorBuilder::audio_output("shared"))
        .build();

    let delta = diff(&previous, &current);
    assert_eq!(delta.added.len(), 1);
    assert_eq!(delta.removed.len(), 1);
}

#[test]
fn test_group_and_label_do_not_affect_identity() {
    let previous = SnapshotBuilder::new()
        .with(DeviceDescriptorBuilder::audio_input("id1").unlabelled())
        .build();
    let current = SnapshotBuilder::new()
        .with(
            DeviceDescriptorBuilder::audio_input("id1")
                .label("USB Microphone")
                .group("usb-hub"),
        )
        .build();

    assert!(diff(&previous, &current).is_empty());
}

#[test]
fn test_store_keeps_last_replacement() {
    let a = SnapshotBuilder::new()
        .with(DeviceDescriptorBuilder::audio_input("a"))
        .build();
    let b = SnapshotBuilder::new()
        .with(DeviceDescriptorBuilder::audio_input("b"))
        .build();
    let c = SnapshotBuilder::new()
        .with(DeviceDescriptorBuilder::audio_input("c"))
        .build();

    let mut store = SnapshotStore::new();
    assert!(store.current().is_empty());

    store.replace(a);
    store.replace(b.clone());
    let previous = store.replace(c.clone());

    assert_eq!(previous, b);
    assert_eq!(store.current(), &c);
}
