use std::sync::Arc;

use super::descriptor::{DeviceDescriptor, DeviceKind};

/// Ordered device list captured at one instant.
///
/// Cloning is cheap and a snapshot is never mutated after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSnapshot {
    devices: Arc<[DeviceDescriptor]>,
}

impl DeviceSnapshot {
    pub fn new(devices: Vec<DeviceDescriptor>) -> Self {
        Self {
            devices: devices.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceDescriptor> {
        self.devices.iter()
    }

    pub fn of_kind(&self, kind: DeviceKind) -> impl Iterator<Item = &DeviceDescriptor> {
        self.devices.iter().filter(move |d| d.kind == kind)
    }

    pub fn find(&self, kind: DeviceKind, device_id: &str) -> Option<&DeviceDescriptor> {
        self.devices
            .iter()
            .find(|d| d.kind == kind && d.device_id == device_id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl From<Vec<DeviceDescriptor>> for DeviceSnapshot {
    fn from(devices: Vec<DeviceDescriptor>) -> Self {
        Self::new(devices)
    }
}

/// Holds the last known snapshot. Writes go through `&mut self`, so there is
/// exactly one writer at a time.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: DeviceSnapshot,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &DeviceSnapshot {
        &self.current
    }

    /// Install `next` and hand back the snapshot it replaced
    pub fn replace(&mut self, next: DeviceSnapshot) -> DeviceSnapshot {
        std::mem::replace(&mut self.current, next)
    }
}
