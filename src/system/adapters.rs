use anyhow::Result;
use std::path::Path;

use crate::error::UnsupportedCapability;
use crate::system::traits::{ChangeCallback, DeviceChangeSource, FileSystemInterface};

/// Production implementation of FileSystemInterface using std::fs
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardFileSystem;

impl FileSystemInterface for StandardFileSystem {
    fn read_config_file(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))
    }

    fn write_config_file(&self, path: &Path, content: &str) -> Result<()> {
        std::fs::write(path, content)
            .map_err(|e| anyhow::anyhow!("Failed to write config file: {}", e))
    }

    fn config_file_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_config_dir(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .map_err(|e| anyhow::anyhow!("Failed to create config directory: {}", e))
    }
}

/// Change source for platforms without native device notifications
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedDeviceChange;

impl DeviceChangeSource for UnsupportedDeviceChange {
    fn supports_device_change(&self) -> bool {
        false
    }

    fn subscribe(&self, _callback: ChangeCallback) -> Result<()> {
        Err(UnsupportedCapability(std::env::consts::OS.to_string()).into())
    }
}

#[cfg(target_os = "macos")]
pub type PlatformChangeSource = crate::system::coreaudio::CoreAudioDeviceWatcher;

#[cfg(not(target_os = "macos"))]
pub type PlatformChangeSource = UnsupportedDeviceChange;

/// Device change source of the current platform
pub fn platform_change_source() -> PlatformChangeSource {
    PlatformChangeSource::default()
}
