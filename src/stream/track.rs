use std::fmt;
use tracing::debug;

use super::constraints::StreamConstraints;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => write!(f, "audio"),
            TrackKind::Video => write!(f, "video"),
        }
    }
}

/// Live settings of a track: the device actually in use, which may differ
/// from the id that was requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackSettings {
    pub device_id: String,
    pub group_id: String,
}

/// One media track produced by an acquisition source
pub trait MediaTrack: Send {
    fn kind(&self) -> TrackKind;

    fn label(&self) -> &str;

    fn settings(&self) -> TrackSettings;

    /// False once the track was stopped or the device went away
    fn is_live(&self) -> bool;

    /// Stop the track. Stopping an already stopped track does nothing.
    fn stop(&mut self);
}

/// The live capture stream plus the constraints that produced it
pub struct ActiveStream {
    id: u64,
    constraints: StreamConstraints,
    tracks: Vec<Box<dyn MediaTrack>>,
    released: bool,
}

impl ActiveStream {
    pub fn new(id: u64, constraints: StreamConstraints, tracks: Vec<Box<dyn MediaTrack>>) -> Self {
        Self {
            id,
            constraints,
            tracks,
            released: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn constraints(&self) -> &StreamConstraints {
        &self.constraints
    }

    pub fn tracks(&self) -> &[Box<dyn MediaTrack>] {
        &self.tracks
    }

    pub fn audio_track(&self) -> Option<&dyn MediaTrack> {
        self.tracks
            .iter()
            .find(|t| t.kind() == TrackKind::Audio)
            .map(|t| t.as_ref())
    }

    pub fn video_track(&self) -> Option<&dyn MediaTrack> {
        self.tracks
            .iter()
            .find(|t| t.kind() == TrackKind::Video)
            .map(|t| t.as_ref())
    }

    /// Device id reported by the first audio track's live settings
    pub fn audio_device_in_use(&self) -> Option<String> {
        self.audio_track().map(|t| t.settings().device_id)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Stop every track of this stream. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        for track in self.tracks.iter_mut() {
            if track.is_live() {
                debug!(stream = self.id, kind = %track.kind(), "Stopping track");
            }
            track.stop();
        }
        self.released = true;
    }
}

impl Drop for ActiveStream {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ActiveStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveStream")
            .field("id", &self.id)
            .field("constraints", &self.constraints)
            .field("tracks", &self.tracks.len())
            .field("released", &self.released)
            .finish()
    }
}
