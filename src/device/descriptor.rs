use serde::{Deserialize, Serialize};
use std::fmt;

/// The three endpoint kinds a capture harness cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    #[serde(rename = "audioinput")]
    AudioInput,
    #[serde(rename = "audiooutput")]
    AudioOutput,
    #[serde(rename = "videoinput")]
    VideoInput,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 3] = [
        DeviceKind::AudioInput,
        DeviceKind::AudioOutput,
        DeviceKind::VideoInput,
    ];

    /// Noun used when a device has no label yet
    pub fn fallback_noun(&self) -> &'static str {
        match self {
            DeviceKind::AudioInput => "microphone",
            DeviceKind::AudioOutput => "speaker",
            DeviceKind::VideoInput => "camera",
        }
    }

    pub fn is_capture(&self) -> bool {
        match self {
            DeviceKind::AudioInput | DeviceKind::VideoInput => true,
            DeviceKind::AudioOutput => false,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::AudioInput => write!(f, "audioinput"),
            DeviceKind::AudioOutput => write!(f, "audiooutput"),
            DeviceKind::VideoInput => write!(f, "videoinput"),
        }
    }
}

/// Identity record of one capture or render endpoint.
///
/// `(kind, device_id)` is the key. `group_id` and `label` are informational
/// and never take part in equality of keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub kind: DeviceKind,
    pub device_id: String,
    pub group_id: String,
    pub label: String,
}

/// Borrowed `(kind, device_id)` key of a descriptor
pub type DeviceKey<'a> = (DeviceKind, &'a str);

impl DeviceDescriptor {
    pub fn new(kind: DeviceKind, device_id: impl Into<String>) -> Self {
        Self {
            kind,
            device_id: device_id.into(),
            group_id: String::new(),
            label: String::new(),
        }
    }

    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn key(&self) -> DeviceKey<'_> {
        (self.kind, self.device_id.as_str())
    }

    pub fn same_key(&self, other: &DeviceDescriptor) -> bool {
        self.key() == other.key()
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.label.is_empty() {
            "<no label>"
        } else {
            self.label.as_str()
        };
        write!(f, "[{}] {} ({})", self.kind, label, self.device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ignores_label_and_group() {
        let a = DeviceDescriptor::new(DeviceKind::AudioInput, "mic-1")
            .with_label("USB Mic")
            .with_group("g1");
        let b = DeviceDescriptor::new(DeviceKind::AudioInput, "mic-1");

        assert!(a.same_key(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_same_id_different_kind_is_different_key() {
        let input = DeviceDescriptor::new(DeviceKind::AudioInput, "default");
        let output = DeviceDescriptor::new(DeviceKind::AudioOutput, "default");

        assert!(!input.same_key(&output));
    }

    #[test]
    fn test_kind_serializes_like_media_device_kinds() {
        #[derive(Serialize)]
        struct Wrapper {
            kind: DeviceKind,
        }
        let rendered = toml::to_string(&Wrapper {
            kind: DeviceKind::VideoInput,
        })
        .unwrap();
        assert_eq!(rendered.trim(), "kind = \"videoinput\"");
        assert_eq!(DeviceKind::AudioOutput.to_string(), "audiooutput");
    }

    #[test]
    fn test_display_without_label() {
        let device = DeviceDescriptor::new(DeviceKind::VideoInput, "cam-9");
        assert_eq!(device.to_string(), "[videoinput] <no label> (cam-9)");
    }
}
