use std::sync::Arc;
use tracing::{debug, info, warn};

use super::constraints::StreamConstraints;
use super::track::ActiveStream;
use crate::error::AcquisitionError;
use crate::logging::IdFormat;
use crate::system::MediaDevices;

/// Owns the single live capture stream.
///
/// Acquiring always releases the previous stream first, so two live handles
/// never coexist.
pub struct StreamLifecycleManager<M: MediaDevices> {
    media: Arc<M>,
    active: Option<ActiveStream>,
    next_id: u64,
    ids: IdFormat,
}

impl<M: MediaDevices> StreamLifecycleManager<M> {
    pub fn new(media: Arc<M>, ids: IdFormat) -> Self {
        Self {
            media,
            active: None,
            next_id: 1,
            ids,
        }
    }

    pub fn active(&self) -> Option<&ActiveStream> {
        self.active.as_ref()
    }

    /// Device id the active audio track reports as in use
    pub fn audio_device_in_use(&self) -> Option<String> {
        self.active.as_ref().and_then(|s| s.audio_device_in_use())
    }

    /// Stop all tracks of the active stream, if any. Returns whether a
    /// stream was released; calling it again is a no-op.
    pub fn release(&mut self) -> bool {
        match self.active.take() {
            Some(mut stream) => {
                debug!(stream = stream.id(), "Releasing capture stream");
                stream.release();
                true
            }
            None => false,
        }
    }

    /// Release the current stream, then acquire a new one under `constraints`.
    ///
    /// On failure the manager is left without an active stream.
    pub async fn acquire(
        &mut self,
        constraints: StreamConstraints,
    ) -> Result<&ActiveStream, AcquisitionError> {
        self.release();

        info!(constraints = %constraints, "Requesting capture stream");
        let tracks = self.media.acquire(&constraints).await?;

        let id = self.next_id;
        self.next_id += 1;

        let stream = ActiveStream::new(id, constraints, tracks);
        self.log_audio_track_settings(&stream);

        Ok(self.active.insert(stream))
    }

    fn log_audio_track_settings(&self, stream: &ActiveStream) {
        match stream.audio_track() {
            Some(track) => {
                let settings = track.settings();
                info!(
                    stream = stream.id(),
                    label = track.label(),
                    kind = %track.kind(),
                    device_id = self.ids.device_id(&settings.device_id),
                    group_id = self.ids.group_id(&settings.group_id),
                    "[audioTrack] settings"
                );
            }
            None if stream.constraints().audio.is_requested() => {
                warn!(stream = stream.id(), "[audioTrack] stream has no audio track");
            }
            None => {}
        }
    }
}

impl<M: MediaDevices> Drop for StreamLifecycleManager<M> {
    fn drop(&mut self) {
        self.release();
    }
}
