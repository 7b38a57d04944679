use std::fmt;

use crate::device::{DeviceDiff, DeviceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartReason {
    /// A new device appeared; prefer the platform default over a stale id
    DeviceAdded,
    /// The audio input the active stream is using went away
    ActiveInputRemoved,
}

impl fmt::Display for RestartReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestartReason::DeviceAdded => write!(f, "device added"),
            RestartReason::ActiveInputRemoved => write!(f, "device in use was removed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    Keep,
    Restart(RestartReason),
    /// A restart was warranted but the platform switches devices by itself
    LeftToPlatform(RestartReason),
}

impl RestartDecision {
    pub fn restarts(&self) -> bool {
        matches!(self, RestartDecision::Restart(_))
    }
}

/// Decides whether a diff requires the capture stream to be restarted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Set on platforms that move capture to a new default device on their
    /// own; restarting there would race the platform's own switch.
    pub platform_auto_switch: bool,
}

impl RestartPolicy {
    pub fn new(platform_auto_switch: bool) -> Self {
        Self {
            platform_auto_switch,
        }
    }

    /// `audio_in_use` is the device id reported by the live audio track
    pub fn decide(&self, diff: &DeviceDiff, audio_in_use: Option<&str>) -> RestartDecision {
        let reason = if !diff.added.is_empty() {
            Some(RestartReason::DeviceAdded)
        } else if let Some(in_use) = audio_in_use {
            diff.removed
                .iter()
                .any(|d| d.kind == DeviceKind::AudioInput && d.device_id == in_use)
                .then_some(RestartReason::ActiveInputRemoved)
        } else {
            None
        };

        match reason {
            None => RestartDecision::Keep,
            Some(reason) if self.platform_auto_switch => RestartDecision::LeftToPlatform(reason),
            Some(reason) => RestartDecision::Restart(reason),
        }
    }
}
