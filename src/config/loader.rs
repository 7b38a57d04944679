use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::system::FileSystemInterface;

use super::types::Config;

/// Loads and saves the TOML config through an injected file system
pub struct ConfigLoader<F: FileSystemInterface> {
    file_system: F,
    config_path: PathBuf,
}

impl<F: FileSystemInterface> ConfigLoader<F> {
    pub fn new(file_system: F, config_path: PathBuf) -> Self {
        Self {
            file_system,
            config_path,
        }
    }

    /// Load the config, writing a default one when the file is missing
    pub fn load_config(&self) -> Result<Config> {
        debug!("Loading configuration from: {}", self.config_path.display());

        if !self.file_system.config_file_exists(&self.config_path) {
            info!("Configuration file not found, creating default configuration");
            return Ok(self.create_default_config());
        }

        let content = self
            .file_system
            .read_config_file(&self.config_path)
            .with_context(|| {
                format!(
                    "Failed to read configuration file: {}",
                    self.config_path.display()
                )
            })?;

        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse configuration file: {}",
                self.config_path.display()
            )
        })?;

        config.validate().with_context(|| {
            format!(
                "Invalid configuration file: {}",
                self.config_path.display()
            )
        })?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    pub fn save_config(&self, config: &Config) -> Result<()> {
        debug!("Saving configuration to: {}", self.config_path.display());

        if let Some(parent) = self.config_path.parent() {
            self.file_system
                .create_config_dir(parent)
                .with_context(|| {
                    format!("Failed to create config directory: {}", parent.display())
                })?;
        }

        let content =
            toml::to_string_pretty(config).context("Failed to serialize configuration")?;

        self.file_system
            .write_config_file(&self.config_path, &content)
            .with_context(|| {
                format!(
                    "Failed to write configuration file: {}",
                    self.config_path.display()
                )
            })?;

        info!("Configuration saved to: {}", self.config_path.display());
        Ok(())
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config_exists(&self) -> bool {
        self.file_system.config_file_exists(&self.config_path)
    }

    /// Saving is best-effort; the default config is returned either way
    fn create_default_config(&self) -> Config {
        let config = Config::default();

        if let Err(e) = self.save_config(&config) {
            warn!(
                "Could not save default config to {}: {:#}. Using default config.",
                self.config_path.display(),
                e
            );
            return config;
        }

        info!(
            "Created default configuration file: {}",
            self.config_path.display()
        );
        config
    }

    #[cfg(any(test, feature = "test-mocks"))]
    pub fn get_file_system(&self) -> &F {
        &self.file_system
    }
}

impl ConfigLoader<crate::system::StandardFileSystem> {
    pub fn new_production(config_path: PathBuf) -> Self {
        Self::new(crate::system::StandardFileSystem, config_path)
    }

    pub fn new_with_default_path() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self::new_production(config_path))
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home_dir.join(".config/media-device-monitor/config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{MockFileSystem, StandardFileSystem};
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_config_creates_default() {
        let mock_fs = MockFileSystem::new();
        let config_path = PathBuf::from("/test/config.toml");
        let loader = ConfigLoader::new(mock_fs.clone(), config_path.clone());

        let config = loader.load_config().unwrap();

        assert_eq!(config, Config::default());
        let writes = mock_fs.get_write_calls();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, config_path);
    }

    #[test]
    fn test_default_config_survives_unwritable_dir() {
        let mock_fs = MockFileSystem::new();
        mock_fs.set_create_dir_failure(true);
        let loader = ConfigLoader::new(mock_fs.clone(), PathBuf::from("/ro/config.toml"));

        let config = loader.load_config().unwrap();
        assert_eq!(config, Config::default());
        assert!(mock_fs.get_write_calls().is_empty());
    }

    #[test]
    fn test_load_existing_config() {
        let mock_fs = MockFileSystem::new();
        let config_path = PathBuf::from("/test/config.toml");
        mock_fs.add_file(
            &config_path,
            r#"
[general]
poll_interval_ms = 2000
log_level = "debug"
force_polling = true

[capture]
video = true
audio_output = "spk-usb"

[policy]
platform_auto_switch = true

[logging]
short_ids = true
"#
            .to_string(),
        );

        let loader = ConfigLoader::new(mock_fs, config_path);
        let config = loader.load_config().unwrap();

        assert_eq!(config.general.poll_interval_ms, 2000);
        assert_eq!(config.general.log_level, "debug");
        assert!(config.general.force_polling);
        assert!(config.capture.video);
        assert_eq!(config.capture.audio_output.as_deref(), Some("spk-usb"));
        assert!(config.policy.platform_auto_switch);
        assert!(config.logging.short_ids);
        assert!(!config.logging.file_output);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mock_fs = MockFileSystem::new();
        let config_path = PathBuf::from("/test/config.toml");
        mock_fs.add_file(
            &config_path,
            "[general]\npoll_interval_ms = 5\n".to_string(),
        );

        let loader = ConfigLoader::new(mock_fs, config_path);
        let err = loader.load_config().unwrap_err();
        assert!(format!("{:#}", err).contains("poll_interval_ms"));
    }

    #[test]
    fn test_malformed_toml_is_rejected() {
        let mock_fs = MockFileSystem::new();
        let config_path = PathBuf::from("/test/config.toml");
        mock_fs.add_file(&config_path, "[general\n".to_string());

        let loader = ConfigLoader::new(mock_fs, config_path);
        assert!(loader.load_config().is_err());
    }

    #[test]
    fn test_save_config_creates_parent_dir() {
        let mock_fs = MockFileSystem::new();
        let config_path = PathBuf::from("/test/config.toml");
        let loader = ConfigLoader::new(mock_fs.clone(), config_path.clone());

        loader.save_config(&Config::default()).unwrap();

        assert_eq!(
            mock_fs.get_directory_creation_calls(),
            vec![PathBuf::from("/test")]
        );
        assert!(loader.config_exists());
    }

    #[test]
    fn test_round_trip_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested/config.toml");
        let loader = ConfigLoader::new(StandardFileSystem, config_path.clone());

        let mut config = Config::default();
        config.capture.audio_source = Some("mic-usb".to_string());
        config.logging.json_format = true;
        loader.save_config(&config).unwrap();

        assert!(config_path.exists());
        assert_eq!(loader.load_config().unwrap(), config);
    }
}
