//! Builders for device descriptors and snapshots used across integration tests.
//! Individual methods may not be used by all tests, so dead code warnings are suppressed.

#![allow(dead_code)]

use media_device_monitor::device::{DeviceDescriptor, DeviceKind, DeviceSnapshot};

/// Builder for creating test DeviceDescriptor instances
pub struct DeviceDescriptorBuilder {
    kind: DeviceKind,
    device_id: String,
    group_id: Option<String>,
    label: String,
}

impl DeviceDescriptorBuilder {
    pub fn new() -> Self {
        Self {
            kind: DeviceKind::AudioInput,
            device_id: "test_device_1".to_string(),
            group_id: None,
            label: "Test Device".to_string(),
        }
    }

    pub fn audio_input(id: &str) -> Self {
        Self::new().kind(DeviceKind::AudioInput).id(id)
    }

    pub fn audio_output(id: &str) -> Self {
        Self::new().kind(DeviceKind::AudioOutput).id(id)
    }

    pub fn video_input(id: &str) -> Self {
        Self::new().kind(DeviceKind::VideoInput).id(id)
    }

    pub fn kind(mut self, kind: DeviceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn id(mut self, id: &str) -> Self {
        self.device_id = id.to_string();
        self
    }

    pub fn group(mut self, group_id: &str) -> Self {
        self.group_id = Some(group_id.to_string());
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    /// Browsers hide labels until capture permission is granted
    pub fn unlabelled(mut self) -> Self {
        self.label.clear();
        self
    }

    pub fn build(self) -> DeviceDescriptor {
        let group = self.group_id.unwrap_or_else(|| self.device_id.clone());
        DeviceDescriptor::new(self.kind, self.device_id)
            .with_group(group)
            .with_label(self.label)
    }
}

impl Default for DeviceDescriptorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for snapshots, keeping insertion order
#[derive(Default)]
pub struct SnapshotBuilder {
    devices: Vec<DeviceDescriptor>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, device: DeviceDescriptorBuilder) -> Self {
        self.devices.push(device.build());
        self
    }

    pub fn build(self) -> DeviceSnapshot {
        DeviceSnapshot::new(self.devices)
    }
}
