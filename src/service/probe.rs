use anyhow::Result;
use tracing::info;

use crate::device::{DeviceDescriptor, DeviceKind};
use crate::logging::{IdFormat, log_devices};
use crate::stream::StreamConstraints;
use crate::system::MediaDevices;

/// Devices seen by a permission probe
#[derive(Debug, Default)]
pub struct ProbeReport {
    pub microphones: Vec<DeviceDescriptor>,
    pub speakers: Vec<DeviceDescriptor>,
    pub cameras: Vec<DeviceDescriptor>,
}

/// Open capture once so the platform grants access and exposes labels,
/// stop every track right away, then list what is available.
pub async fn probe_devices<M: MediaDevices>(
    media: &M,
    capture_video: bool,
    ids: IdFormat,
) -> Result<ProbeReport> {
    let constraints = StreamConstraints::defaults(true, capture_video);
    let mut tracks = media.acquire(&constraints).await?;
    for track in tracks.iter_mut() {
        track.stop();
    }
    info!("Capture permission granted; {} probe tracks stopped", tracks.len());

    let mut report = ProbeReport::default();
    for device in media.enumerate().await? {
        match device.kind {
            DeviceKind::AudioInput => report.microphones.push(device),
            DeviceKind::AudioOutput => report.speakers.push(device),
            DeviceKind::VideoInput => report.cameras.push(device),
        }
    }

    log_devices("Microphones", &report.microphones, ids);
    log_devices("Speakers", &report.speakers, ids);
    if capture_video {
        log_devices("Cameras", &report.cameras, ids);
    }
    Ok(report)
}
