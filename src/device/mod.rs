pub mod descriptor;
pub mod diff;
pub mod snapshot;

pub use descriptor::{DeviceDescriptor, DeviceKey, DeviceKind};
pub use diff::{DeviceDiff, diff};
pub use snapshot::{DeviceSnapshot, SnapshotStore};
