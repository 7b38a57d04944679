pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod notifier;
pub mod reconcile;
pub mod service;
pub mod stream;
pub mod system;
pub mod ui;

pub use config::Config;
pub use device::{DeviceDescriptor, DeviceDiff, DeviceKind, DeviceSnapshot, SnapshotStore, diff};
pub use error::{AcquisitionError, AcquisitionErrorKind, EnumerationError, SinkAttachError};
pub use reconcile::{ControllerState, ReconciliationController, RestartDecision, RestartPolicy};
pub use service::{DeviceHarness, HarnessCommand};
pub use stream::{StreamConstraints, StreamLifecycleManager};
