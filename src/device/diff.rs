use std::collections::HashSet;

use super::descriptor::{DeviceDescriptor, DeviceKey};
use super::snapshot::DeviceSnapshot;

/// Added/removed delta between two snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDiff {
    pub added: Vec<DeviceDescriptor>,
    pub removed: Vec<DeviceDescriptor>,
}

impl DeviceDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compare two snapshots by `(kind, device_id)`.
///
/// Label or group changes on an otherwise identical key are not reported.
/// Both lists keep the order of the snapshot they were taken from.
pub fn diff(previous: &DeviceSnapshot, current: &DeviceSnapshot) -> DeviceDiff {
    let previous_keys: HashSet<DeviceKey<'_>> = previous.iter().map(|d| d.key()).collect();
    let current_keys: HashSet<DeviceKey<'_>> = current.iter().map(|d| d.key()).collect();

    let added = current
        .iter()
        .filter(|d| !previous_keys.contains(&d.key()))
        .cloned()
        .collect();
    let removed = previous
        .iter()
        .filter(|d| !current_keys.contains(&d.key()))
        .cloned()
        .collect();

    DeviceDiff { added, removed }
}
