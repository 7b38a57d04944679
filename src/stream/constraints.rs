use std::fmt;

/// How one media type of a capture request is constrained
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MediaConstraint {
    /// Do not capture this media type
    Off,
    /// Let the platform pick its default device
    #[default]
    Default,
    /// Only this device id is acceptable
    Exact(String),
}

impl MediaConstraint {
    /// Build a constraint from a selector value. An empty or missing value
    /// means "platform default", mirroring an unset `deviceId`.
    pub fn from_selection(enabled: bool, selected: Option<&str>) -> Self {
        if !enabled {
            return MediaConstraint::Off;
        }
        match selected {
            Some(id) if !id.is_empty() => MediaConstraint::Exact(id.to_string()),
            _ => MediaConstraint::Default,
        }
    }

    pub fn is_requested(&self) -> bool {
        !matches!(self, MediaConstraint::Off)
    }

    pub fn exact_id(&self) -> Option<&str> {
        match self {
            MediaConstraint::Exact(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for MediaConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaConstraint::Off => write!(f, "false"),
            MediaConstraint::Default => write!(f, "true"),
            MediaConstraint::Exact(id) => write!(f, "{{\"deviceId\":{{\"exact\":\"{}\"}}}}", id),
        }
    }
}

/// Audio and video constraints for one acquisition
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamConstraints {
    pub audio: MediaConstraint,
    pub video: MediaConstraint,
}

impl StreamConstraints {
    /// Default devices for every enabled media type
    pub fn defaults(audio: bool, video: bool) -> Self {
        Self {
            audio: MediaConstraint::from_selection(audio, None),
            video: MediaConstraint::from_selection(video, None),
        }
    }

    pub fn from_selection(
        audio: bool,
        audio_source: Option<&str>,
        video: bool,
        video_source: Option<&str>,
    ) -> Self {
        Self {
            audio: MediaConstraint::from_selection(audio, audio_source),
            video: MediaConstraint::from_selection(video, video_source),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.audio.is_requested() && !self.video.is_requested()
    }
}

impl fmt::Display for StreamConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{\"audio\":{},\"video\":{}}}", self.audio, self.video)
    }
}
