use anyhow::Result;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use crate::device::DeviceDescriptor;
use crate::error::{AcquisitionError, EnumerationError, SinkAttachError};
use crate::stream::{MediaTrack, StreamConstraints};

/// Callback invoked whenever the device set may have changed
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Trait for the platform media layer - abstracts enumeration and capture
pub trait MediaDevices: Send + Sync {
    /// Enumerate all capture and render endpoints
    fn enumerate(
        &self,
    ) -> impl Future<Output = Result<Vec<DeviceDescriptor>, EnumerationError>> + Send;

    /// Open capture tracks satisfying `constraints`
    fn acquire(
        &self,
        constraints: &StreamConstraints,
    ) -> impl Future<Output = Result<Vec<Box<dyn MediaTrack>>, AcquisitionError>> + Send;
}

/// Trait for native device-change notifications
pub trait DeviceChangeSource: Send {
    /// Whether the platform advertises a device-change notification
    fn supports_device_change(&self) -> bool;

    /// Register `callback` for the lifetime of the process
    fn subscribe(&self, callback: ChangeCallback) -> Result<()>;
}

/// Element that plays back the preview and can route its audio output
pub trait RenderTarget: Send {
    /// False when the platform cannot select an output device
    fn supports_sink_selection(&self) -> bool;

    fn sink_id(&self) -> Option<&str>;

    fn set_sink_id(
        &mut self,
        sink_id: &str,
    ) -> impl Future<Output = Result<(), SinkAttachError>> + Send;
}

/// Trait for file system operations - abstracts std::fs for testability
pub trait FileSystemInterface {
    /// Read the entire contents of a configuration file
    fn read_config_file(&self, path: &Path) -> Result<String>;

    /// Write configuration content to a file
    fn write_config_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Check if a configuration file exists
    fn config_file_exists(&self, path: &Path) -> bool;

    /// Create the directory structure for config files
    fn create_config_dir(&self, path: &Path) -> Result<()>;
}
