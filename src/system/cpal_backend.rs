use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::device::{DeviceDescriptor, DeviceKind};
use crate::error::{AcquisitionError, AcquisitionErrorKind, EnumerationError, SinkAttachError};
use crate::stream::{MediaConstraint, MediaTrack, StreamConstraints, TrackKind, TrackSettings};
use crate::system::traits::{MediaDevices, RenderTarget};

/// Enumeration and audio capture through the default cpal host.
///
/// cpal exposes no stable device id, so ids are derived from device names
/// (see [`unique_ids`]). Video capture is not provided by this backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalMediaDevices;

impl CpalMediaDevices {
    /// Video requests always fail with `NotFoundError`
    pub const SUPPORTS_VIDEO: bool = false;

    pub fn new() -> Self {
        let host = cpal::default_host();
        info!("Using audio host: {}", host.id().name());
        Self
    }
}

impl MediaDevices for CpalMediaDevices {
    async fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, EnumerationError> {
        tokio::task::spawn_blocking(enumerate_blocking)
            .await
            .map_err(|e| EnumerationError::Platform(e.to_string()))?
    }

    async fn acquire(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Vec<Box<dyn MediaTrack>>, AcquisitionError> {
        if constraints.is_empty() {
            return Err(AcquisitionError::new(
                AcquisitionErrorKind::ConstraintNotSatisfiable,
                "at least one of audio and video must be requested",
            ));
        }
        if constraints.video.is_requested() && !Self::SUPPORTS_VIDEO {
            return Err(AcquisitionError::not_found(
                "no video capture backend is available",
            ));
        }

        let mut tracks: Vec<Box<dyn MediaTrack>> = Vec::new();
        if constraints.audio.is_requested() {
            tracks.push(Box::new(open_audio_track(&constraints.audio).await?));
        }
        Ok(tracks)
    }
}

fn enumerate_blocking() -> Result<Vec<DeviceDescriptor>, EnumerationError> {
    let host = cpal::default_host();

    let inputs = host
        .input_devices()
        .map_err(|e| EnumerationError::Platform(e.to_string()))?;
    let default_input = host.default_input_device().and_then(|d| d.name().ok());

    let outputs = host
        .output_devices()
        .map_err(|e| EnumerationError::Platform(e.to_string()))?;
    let default_output = host.default_output_device().and_then(|d| d.name().ok());

    let mut devices = descriptors(DeviceKind::AudioInput, inputs, default_input.as_deref());
    devices.extend(descriptors(
        DeviceKind::AudioOutput,
        outputs,
        default_output.as_deref(),
    ));

    debug!("Enumerated {} devices", devices.len());
    Ok(devices)
}

/// Ids for devices listed in host order. The first device with a given
/// name keeps the name; later ones get an ordinal suffix (`name#2`,
/// `name#3`) that does not collide with any other device's name.
fn unique_ids(names: &[String]) -> Vec<String> {
    let raw: HashSet<&str> = names.iter().map(String::as_str).collect();
    let mut assigned: HashSet<String> = HashSet::new();

    names
        .iter()
        .map(|name| {
            let mut id = name.clone();
            let mut ordinal = 1;
            while assigned.contains(&id) || (ordinal > 1 && raw.contains(id.as_str())) {
                ordinal += 1;
                id = format!("{}#{}", name, ordinal);
            }
            assigned.insert(id.clone());
            id
        })
        .collect()
}

struct NamedDevice {
    id: String,
    name: String,
    device: cpal::Device,
}

fn named_devices(
    kind: DeviceKind,
    devices: impl Iterator<Item = cpal::Device>,
) -> Vec<NamedDevice> {
    let named: Vec<(String, cpal::Device)> = devices
        .filter_map(|device| match device.name() {
            Ok(name) => Some((name, device)),
            Err(e) => {
                warn!("Skipping {} device without a name: {}", kind, e);
                None
            }
        })
        .collect();

    let names: Vec<String> = named.iter().map(|(name, _)| name.clone()).collect();
    unique_ids(&names)
        .into_iter()
        .zip(named)
        .map(|(id, (name, device))| NamedDevice { id, name, device })
        .collect()
}

/// Id of the first device called `name`, which is how a default device
/// reported by name is matched
fn id_for_name(devices: &[NamedDevice], name: &str) -> String {
    devices
        .iter()
        .find(|d| d.name == name)
        .map(|d| d.id.clone())
        .unwrap_or_else(|| name.to_string())
}

/// Platform default first, like the browser's "default" entry
fn descriptors(
    kind: DeviceKind,
    devices: impl Iterator<Item = cpal::Device>,
    default_name: Option<&str>,
) -> Vec<DeviceDescriptor> {
    let named = named_devices(kind, devices);
    let default_id = default_name.map(|name| id_for_name(&named, name));

    let mut result: Vec<DeviceDescriptor> = named
        .into_iter()
        .map(|d| {
            DeviceDescriptor::new(kind, d.id)
                .with_group(d.name.clone())
                .with_label(d.name)
        })
        .collect();

    if let Some(default_id) = default_id {
        if let Some(index) = result.iter().position(|d| d.device_id == default_id) {
            let default = result.remove(index);
            result.insert(0, default);
        }
    }
    result
}

/// Audio capture track backed by a cpal input stream.
///
/// cpal streams cannot move between threads on every host, so the stream is
/// built and owned by a dedicated thread that lives until the track stops.
pub struct CpalTrack {
    label: String,
    settings: TrackSettings,
    ended: Arc<AtomicBool>,
    stop: Option<mpsc::Sender<()>>,
}

impl MediaTrack for CpalTrack {
    fn kind(&self) -> TrackKind {
        TrackKind::Audio
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn settings(&self) -> TrackSettings {
        self.settings.clone()
    }

    fn is_live(&self) -> bool {
        self.stop.is_some() && !self.ended.load(Ordering::SeqCst)
    }

    fn stop(&mut self) {
        // Dropping the sender wakes the capture thread, which drops the stream
        if self.stop.take().is_some() {
            self.ended.store(true, Ordering::SeqCst);
            debug!("Stopped capture track on {}", self.label);
        }
    }
}

async fn open_audio_track(constraint: &MediaConstraint) -> Result<CpalTrack, AcquisitionError> {
    let requested = constraint.exact_id().map(str::to_string);
    let (ready_tx, ready_rx) = oneshot::channel();
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let ended = Arc::new(AtomicBool::new(false));
    let thread_ended = Arc::clone(&ended);

    std::thread::Builder::new()
        .name("audio-capture".to_string())
        .spawn(move || run_capture(requested, ready_tx, stop_rx, thread_ended))
        .map_err(|e| AcquisitionError::new(AcquisitionErrorKind::Aborted, e.to_string()))?;

    let (id, name) = ready_rx.await.map_err(|_| {
        AcquisitionError::new(
            AcquisitionErrorKind::Aborted,
            "capture thread exited before opening the device",
        )
    })??;

    Ok(CpalTrack {
        label: name.clone(),
        settings: TrackSettings {
            device_id: id,
            group_id: name,
        },
        ended,
        stop: Some(stop_tx),
    })
}

fn run_capture(
    requested: Option<String>,
    ready: oneshot::Sender<Result<(String, String), AcquisitionError>>,
    stop: mpsc::Receiver<()>,
    ended: Arc<AtomicBool>,
) {
    match open_input_stream(requested.as_deref(), ended) {
        Ok((id, name, stream)) => {
            if ready.send(Ok((id, name))).is_err() {
                return;
            }
            // Blocks until the track is stopped or dropped
            let _ = stop.recv();
            drop(stream);
        }
        Err(e) => {
            let _ = ready.send(Err(e));
        }
    }
}

/// Opens the input behind `requested`, or the host default. Returns the
/// device id, its name and the running stream.
fn open_input_stream(
    requested: Option<&str>,
    ended: Arc<AtomicBool>,
) -> Result<(String, String, cpal::Stream), AcquisitionError> {
    let host = cpal::default_host();
    let inputs = host
        .input_devices()
        .map_err(|e| AcquisitionError::new(AcquisitionErrorKind::NotReadable, e.to_string()))?;
    let named = named_devices(DeviceKind::AudioInput, inputs);

    let (id, name, device) = match requested {
        Some(id) => named
            .into_iter()
            .find(|d| d.id == id)
            .map(|d| (d.id, d.name, d.device))
            .ok_or_else(|| {
                AcquisitionError::new(
                    AcquisitionErrorKind::ConstraintNotSatisfiable,
                    format!("no audio input matches deviceId {}", id),
                )
            })?,
        None => {
            let device = host
                .default_input_device()
                .ok_or_else(|| AcquisitionError::not_found("Requested device not found"))?;
            let name = device.name().map_err(|e| {
                AcquisitionError::new(AcquisitionErrorKind::NotReadable, e.to_string())
            })?;
            (id_for_name(&named, &name), name, device)
        }
    };

    let supported = device.default_input_config().map_err(|e| match e {
        cpal::DefaultStreamConfigError::DeviceNotAvailable => {
            AcquisitionError::not_found(e.to_string())
        }
        cpal::DefaultStreamConfigError::StreamTypeNotSupported => {
            AcquisitionError::new(AcquisitionErrorKind::ConstraintNotSatisfiable, e.to_string())
        }
        other => AcquisitionError::new(AcquisitionErrorKind::NotReadable, other.to_string()),
    })?;

    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    let error_label = name.clone();

    let stream = device
        .build_input_stream_raw(
            &config,
            sample_format,
            |_data: &cpal::Data, _info: &cpal::InputCallbackInfo| {},
            move |err| {
                ended.store(true, Ordering::SeqCst);
                warn!("Capture stream on {} ended: {}", error_label, err);
            },
            None,
        )
        .map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => {
                AcquisitionError::not_found(e.to_string())
            }
            cpal::BuildStreamError::StreamConfigNotSupported
            | cpal::BuildStreamError::InvalidArgument => {
                AcquisitionError::new(AcquisitionErrorKind::ConstraintNotSatisfiable, e.to_string())
            }
            other => AcquisitionError::new(AcquisitionErrorKind::NotReadable, other.to_string()),
        })?;

    stream
        .play()
        .map_err(|e| AcquisitionError::new(AcquisitionErrorKind::NotReadable, e.to_string()))?;

    debug!(
        device = %name,
        channels = config.channels,
        sample_rate = config.sample_rate.0,
        "Opened capture stream"
    );
    Ok((id, name, stream))
}

/// Preview playback element. Routing is recorded after checking the id
/// against the host's output devices; an empty id selects the default.
#[derive(Debug, Default)]
pub struct PreviewOutput {
    sink_id: Option<String>,
}

impl PreviewOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderTarget for PreviewOutput {
    fn supports_sink_selection(&self) -> bool {
        true
    }

    fn sink_id(&self) -> Option<&str> {
        self.sink_id.as_deref()
    }

    async fn set_sink_id(&mut self, sink_id: &str) -> Result<(), SinkAttachError> {
        if sink_id.is_empty() {
            self.sink_id = None;
            return Ok(());
        }

        let wanted = sink_id.to_string();
        let found = tokio::task::spawn_blocking(move || {
            let host = cpal::default_host();
            host.output_devices()
                .map(|devices| {
                    named_devices(DeviceKind::AudioOutput, devices)
                        .iter()
                        .any(|d| d.id == wanted)
                })
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| SinkAttachError::Other(e.to_string()))?
        .map_err(SinkAttachError::Other)?;

        if !found {
            return Err(SinkAttachError::NotFound(sink_id.to_string()));
        }

        self.sink_id = Some(sink_id.to_string());
        Ok(())
    }
}
