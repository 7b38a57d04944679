use media_device_monitor::config::{Config, ConfigLoader};
use media_device_monitor::system::{MockFileSystem, StandardFileSystem};
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_config_loading_with_mock_filesystem() {
    let file_system = MockFileSystem::new();
    let config_path = PathBuf::from("/test/config.toml");

    let config_content = r#"
[general]
poll_interval_ms = 1500
log_level = "debug"

[capture]
audio = true
video = true
audio_source = "mic-usb"
video_source = "cam-usb"

[logging]
short_ids = true
json_format = true
"#;
    file_system.add_file(&config_path, config_content.to_string());

    let config_loader = ConfigLoader::new(file_system.clone(), config_path.clone());
    let config = config_loader.load_config().unwrap();

    assert_eq!(config.general.poll_interval_ms, 1500);
    assert_eq!(config.general.log_level, "debug");
    assert!(!config.general.force_polling);
    assert_eq!(config.capture.audio_source.as_deref(), Some("mic-usb"));
    assert_eq!(config.capture.video_source.as_deref(), Some("cam-usb"));
    assert!(config.logging.short_ids);
    assert!(config.logging.json_format);

    let read_calls = config_loader.get_file_system().get_read_calls();
    assert_eq!(read_calls, vec![config_path]);
}

#[test]
fn test_config_without_capture_is_rejected() {
    let file_system = MockFileSystem::new();
    let config_path = PathBuf::from("/test/config.toml");
    file_system.add_file(
        &config_path,
        "[capture]\naudio = false\nvideo = false\n".to_string(),
    );

    let loader = ConfigLoader::new(file_system, config_path);
    assert!(loader.load_config().is_err());
}

#[test]
fn test_default_config_written_when_missing() {
    let file_system = MockFileSystem::new();
    let config_path = PathBuf::from("/home/user/.config/media-device-monitor/config.toml");
    let loader = ConfigLoader::new(file_system.clone(), config_path.clone());

    let config = loader.load_config().unwrap();
    assert_eq!(config, Config::default());

    let writes = file_system.get_write_calls();
    assert_eq!(writes.len(), 1);
    let written: Config = toml::from_str(&writes[0].1).unwrap();
    assert_eq!(written, Config::default());
}

#[test]
fn test_default_config_survives_write_failure() {
    let file_system = MockFileSystem::new();
    file_system.set_write_failure(true);
    let loader = ConfigLoader::new(file_system, PathBuf::from("/test/config.toml"));

    assert_eq!(loader.load_config().unwrap(), Config::default());
    assert!(!loader.config_exists());
}

#[test]
fn test_config_on_real_filesystem() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "[general]\nforce_polling = true\n\n[policy]\nplatform_auto_switch = true\n",
    )
    .expect("Failed to write temp config");

    let loader = ConfigLoader::new(StandardFileSystem, config_path);
    let config = loader.load_config().unwrap();

    assert!(config.general.force_polling);
    assert!(config.restart_policy().platform_auto_switch);
    assert_eq!(config.general.poll_interval_ms, 1000);
}
