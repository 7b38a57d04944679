use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::device::DeviceKind;
use crate::reconcile::RestartPolicy;
use crate::stream::StreamConstraints;

const KNOWN_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const MIN_POLL_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub poll_interval_ms: u64,
    pub log_level: String,
    /// Poll even when the platform offers change notifications
    pub force_polling: bool,
}

/// What to capture and which devices to start with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub audio: bool,
    /// Needs a backend with camera support; the cpal backend has none, so
    /// enabling this makes every capture start fail with `NotFoundError`
    pub video: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_output: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub platform_auto_switch: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub short_ids: bool,
    pub file_output: bool,
    pub json_format: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            log_level: "info".to_string(),
            force_polling: false,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            audio: true,
            video: false,
            audio_source: None,
            video_source: None,
            audio_output: None,
        }
    }
}

impl GeneralConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl CaptureConfig {
    /// Configured initial selection for a device kind
    pub fn preferred(&self, kind: DeviceKind) -> Option<String> {
        let value = match kind {
            DeviceKind::AudioInput => &self.audio_source,
            DeviceKind::AudioOutput => &self.audio_output,
            DeviceKind::VideoInput => &self.video_source,
        };
        value.clone().filter(|v| !v.is_empty())
    }

    /// Constraints used when falling back to the platform defaults
    pub fn default_constraints(&self) -> StreamConstraints {
        StreamConstraints::defaults(self.audio, self.video)
    }
}

impl From<&PolicyConfig> for RestartPolicy {
    fn from(policy: &PolicyConfig) -> Self {
        RestartPolicy::new(policy.platform_auto_switch)
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.general.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            bail!(
                "general.poll_interval_ms must be at least {} (got {})",
                MIN_POLL_INTERVAL_MS,
                self.general.poll_interval_ms
            );
        }

        let level = self.general.log_level.to_lowercase();
        if !KNOWN_LOG_LEVELS.contains(&level.as_str()) {
            bail!(
                "general.log_level '{}' is not one of {}",
                self.general.log_level,
                KNOWN_LOG_LEVELS.join(", ")
            );
        }

        if !self.capture.audio && !self.capture.video {
            bail!("at least one of capture.audio and capture.video must be enabled");
        }

        Ok(())
    }

    pub fn restart_policy(&self) -> RestartPolicy {
        RestartPolicy::from(&self.policy)
    }
}
