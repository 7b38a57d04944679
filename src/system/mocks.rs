use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use crate::device::{DeviceDescriptor, DeviceKind};
use crate::error::{AcquisitionError, AcquisitionErrorKind, EnumerationError, SinkAttachError};
use crate::stream::{MediaConstraint, MediaTrack, StreamConstraints, TrackKind, TrackSettings};
use crate::system::traits::{
    ChangeCallback, DeviceChangeSource, FileSystemInterface, MediaDevices, RenderTarget,
};

/// Mock track whose liveness is shared with the owning `MockMediaDevices`
pub struct MockTrack {
    kind: TrackKind,
    label: String,
    settings: TrackSettings,
    live: Arc<AtomicBool>,
}

impl MockTrack {
    pub fn new(kind: TrackKind, device: &DeviceDescriptor) -> Self {
        Self {
            kind,
            label: device.label.clone(),
            settings: TrackSettings {
                device_id: device.device_id.clone(),
                group_id: device.group_id.clone(),
            },
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn liveness(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.live)
    }
}

impl MediaTrack for MockTrack {
    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn settings(&self) -> TrackSettings {
        self.settings.clone()
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn stop(&mut self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

/// Mock media layer for testing - provides controllable devices and capture
#[derive(Clone)]
pub struct MockMediaDevices {
    pub devices: Arc<Mutex<Vec<DeviceDescriptor>>>,
    pub tracks: Arc<Mutex<Vec<Arc<AtomicBool>>>>,
    pub acquire_calls: Arc<Mutex<Vec<StreamConstraints>>>,
    pub live_at_acquire: Arc<Mutex<Vec<usize>>>,
    pub enumerate_calls: Arc<AtomicUsize>,
    pub enumerations_in_flight: Arc<AtomicUsize>,
    pub max_enumerations_in_flight: Arc<AtomicUsize>,
    pub should_fail_enumeration: Arc<AtomicBool>,
    pub fail_next_acquire: Arc<Mutex<Option<AcquisitionErrorKind>>>,
    pub enumeration_gate: Arc<Mutex<Option<Arc<Semaphore>>>>,
}

impl MockMediaDevices {
    pub fn new() -> Self {
        Self {
            devices: Arc::new(Mutex::new(Vec::new())),
            tracks: Arc::new(Mutex::new(Vec::new())),
            acquire_calls: Arc::new(Mutex::new(Vec::new())),
            live_at_acquire: Arc::new(Mutex::new(Vec::new())),
            enumerate_calls: Arc::new(AtomicUsize::new(0)),
            enumerations_in_flight: Arc::new(AtomicUsize::new(0)),
            max_enumerations_in_flight: Arc::new(AtomicUsize::new(0)),
            should_fail_enumeration: Arc::new(AtomicBool::new(false)),
            fail_next_acquire: Arc::new(Mutex::new(None)),
            enumeration_gate: Arc::new(Mutex::new(None)),
        }
    }

    /// Built-in microphone, USB microphone, speakers and a camera
    pub fn with_default_devices() -> Self {
        let media = Self::new();
        media.add_device(
            DeviceDescriptor::new(DeviceKind::AudioInput, "mic-builtin")
                .with_group("builtin")
                .with_label("Built-in Microphone"),
        );
        media.add_device(
            DeviceDescriptor::new(DeviceKind::AudioInput, "mic-usb")
                .with_group("usb")
                .with_label("USB Microphone"),
        );
        media.add_device(
            DeviceDescriptor::new(DeviceKind::AudioOutput, "spk-builtin")
                .with_group("builtin")
                .with_label("Built-in Speakers"),
        );
        media.add_device(
            DeviceDescriptor::new(DeviceKind::VideoInput, "cam-builtin")
                .with_group("cam")
                .with_label("FaceTime Camera"),
        );
        media
    }

    /// Add a device to the mock platform
    pub fn add_device(&self, device: DeviceDescriptor) {
        self.devices.lock().unwrap().push(device);
    }

    /// Insert a device at the front so it becomes the platform default
    pub fn add_default_device(&self, device: DeviceDescriptor) {
        self.devices.lock().unwrap().insert(0, device);
    }

    /// Remove a device from the mock platform
    pub fn remove_device(&self, kind: DeviceKind, device_id: &str) {
        self.devices
            .lock()
            .unwrap()
            .retain(|d| !(d.kind == kind && d.device_id == device_id));
    }

    pub fn rename_device(&self, kind: DeviceKind, device_id: &str, label: &str) {
        let mut devices = self.devices.lock().unwrap();
        if let Some(device) = devices
            .iter_mut()
            .find(|d| d.kind == kind && d.device_id == device_id)
        {
            device.label = label.to_string();
        }
    }

    /// Configure the mock to fail enumeration
    pub fn set_enumeration_failure(&self, should_fail: bool) {
        self.should_fail_enumeration
            .store(should_fail, Ordering::SeqCst);
    }

    /// Make the next acquisition fail with `kind`
    pub fn fail_next_acquire(&self, kind: AcquisitionErrorKind) {
        *self.fail_next_acquire.lock().unwrap() = Some(kind);
    }

    /// Block enumerations until `release_enumerations` hands out permits
    pub fn hold_enumerations(&self) {
        *self.enumeration_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_enumerations(&self, count: usize) {
        if let Some(gate) = self.enumeration_gate.lock().unwrap().as_ref() {
            gate.add_permits(count);
        }
    }

    /// Yield until `count` enumerations are waiting on the gate
    pub async fn wait_for_enumerations_in_flight(&self, count: usize) {
        while self.enumerations_in_flight.load(Ordering::SeqCst) < count {
            tokio::task::yield_now().await;
        }
    }

    /// Yield until `count` enumerations have been started in total
    pub async fn wait_for_enumerate_calls(&self, count: usize) {
        while self.enumerate_calls.load(Ordering::SeqCst) < count {
            tokio::task::yield_now().await;
        }
    }

    pub fn get_enumerate_calls(&self) -> usize {
        self.enumerate_calls.load(Ordering::SeqCst)
    }

    pub fn get_max_enumerations_in_flight(&self) -> usize {
        self.max_enumerations_in_flight.load(Ordering::SeqCst)
    }

    pub fn get_acquire_calls(&self) -> Vec<StreamConstraints> {
        self.acquire_calls.lock().unwrap().clone()
    }

    /// Number of live tracks observed at the start of each acquisition
    pub fn live_tracks_at_acquire(&self) -> Vec<usize> {
        self.live_at_acquire.lock().unwrap().clone()
    }

    pub fn live_track_count(&self) -> usize {
        self.tracks
            .lock()
            .unwrap()
            .iter()
            .filter(|live| live.load(Ordering::SeqCst))
            .count()
    }

    fn resolve(
        &self,
        kind: DeviceKind,
        constraint: &MediaConstraint,
    ) -> Result<Option<DeviceDescriptor>, AcquisitionError> {
        let devices = self.devices.lock().unwrap();
        match constraint {
            MediaConstraint::Off => Ok(None),
            MediaConstraint::Default => devices
                .iter()
                .find(|d| d.kind == kind)
                .cloned()
                .map(Some)
                .ok_or_else(|| AcquisitionError::not_found("Requested device not found")),
            MediaConstraint::Exact(id) => devices
                .iter()
                .find(|d| d.kind == kind && &d.device_id == id)
                .cloned()
                .map(Some)
                .ok_or_else(|| {
                    AcquisitionError::new(
                        AcquisitionErrorKind::ConstraintNotSatisfiable,
                        format!("No {} device matches deviceId {}", kind, id),
                    )
                }),
        }
    }

    fn open(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Vec<Box<dyn MediaTrack>>, AcquisitionError> {
        self.acquire_calls.lock().unwrap().push(constraints.clone());
        let live = self.live_track_count();
        self.live_at_acquire.lock().unwrap().push(live);

        if let Some(kind) = self.fail_next_acquire.lock().unwrap().take() {
            return Err(AcquisitionError::new(kind, "Mock acquisition failure"));
        }

        let audio = self.resolve(DeviceKind::AudioInput, &constraints.audio)?;
        let video = self.resolve(DeviceKind::VideoInput, &constraints.video)?;

        let mut tracks: Vec<Box<dyn MediaTrack>> = Vec::new();
        let mut registry = self.tracks.lock().unwrap();
        if let Some(device) = audio {
            let track = MockTrack::new(TrackKind::Audio, &device);
            registry.push(track.liveness());
            tracks.push(Box::new(track));
        }
        if let Some(device) = video {
            let track = MockTrack::new(TrackKind::Video, &device);
            registry.push(track.liveness());
            tracks.push(Box::new(track));
        }
        Ok(tracks)
    }
}

impl MediaDevices for MockMediaDevices {
    async fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, EnumerationError> {
        self.enumerate_calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.enumerations_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_enumerations_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);

        let gate = self.enumeration_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        self.enumerations_in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.should_fail_enumeration.load(Ordering::SeqCst) {
            return Err(EnumerationError::Platform(
                "Mock enumeration failure".to_string(),
            ));
        }
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn acquire(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Vec<Box<dyn MediaTrack>>, AcquisitionError> {
        self.open(constraints)
    }
}

impl Default for MockMediaDevices {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock native change source - callbacks are fired manually by the test
#[derive(Clone)]
pub struct MockDeviceChangeSource {
    pub supported: bool,
    pub callbacks: Arc<Mutex<Vec<ChangeCallback>>>,
    pub subscribe_calls: Arc<AtomicUsize>,
}

impl MockDeviceChangeSource {
    pub fn new() -> Self {
        Self {
            supported: true,
            callbacks: Arc::new(Mutex::new(Vec::new())),
            subscribe_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// Trigger all registered device change callbacks
    pub fn fire(&self) {
        let callbacks = self.callbacks.lock().unwrap().clone();
        for callback in callbacks.iter() {
            callback();
        }
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks.lock().unwrap().len()
    }

    pub fn get_subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }
}

impl DeviceChangeSource for MockDeviceChangeSource {
    fn supports_device_change(&self) -> bool {
        self.supported
    }

    fn subscribe(&self, callback: ChangeCallback) -> Result<()> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        if !self.supported {
            return Err(anyhow::anyhow!("Mock source has no change notification"));
        }
        self.callbacks.lock().unwrap().push(callback);
        Ok(())
    }
}

impl Default for MockDeviceChangeSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock render target recording sink changes
pub struct MockRenderTarget {
    pub supported: bool,
    pub sink: Option<String>,
    pub next_error: Option<SinkAttachError>,
    pub set_calls: Vec<String>,
}

impl MockRenderTarget {
    pub fn new() -> Self {
        Self {
            supported: true,
            sink: None,
            next_error: None,
            set_calls: Vec::new(),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// Make the next `set_sink_id` fail with `error`
    pub fn fail_with(&mut self, error: SinkAttachError) {
        self.next_error = Some(error);
    }
}

impl RenderTarget for MockRenderTarget {
    fn supports_sink_selection(&self) -> bool {
        self.supported
    }

    fn sink_id(&self) -> Option<&str> {
        self.sink.as_deref()
    }

    async fn set_sink_id(&mut self, sink_id: &str) -> Result<(), SinkAttachError> {
        self.set_calls.push(sink_id.to_string());
        if let Some(error) = self.next_error.take() {
            return Err(error);
        }
        self.sink = Some(sink_id.to_string());
        Ok(())
    }
}

impl Default for MockRenderTarget {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock file system for testing - provides controllable file operations
#[derive(Clone)]
pub struct MockFileSystem {
    pub files: Arc<Mutex<HashMap<PathBuf, String>>>,
    pub read_calls: Arc<Mutex<Vec<PathBuf>>>,
    pub write_calls: Arc<Mutex<Vec<(PathBuf, String)>>>,
    pub directory_creation_calls: Arc<Mutex<Vec<PathBuf>>>,
    pub should_fail_write: Arc<AtomicBool>,
    pub should_fail_create_dir: Arc<AtomicBool>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            read_calls: Arc::new(Mutex::new(Vec::new())),
            write_calls: Arc::new(Mutex::new(Vec::new())),
            directory_creation_calls: Arc::new(Mutex::new(Vec::new())),
            should_fail_write: Arc::new(AtomicBool::new(false)),
            should_fail_create_dir: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add a file to the mock file system
    pub fn add_file<P: AsRef<Path>>(&self, path: P, content: String) {
        self.files
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), content);
    }

    pub fn get_read_calls(&self) -> Vec<PathBuf> {
        self.read_calls.lock().unwrap().clone()
    }

    pub fn get_write_calls(&self) -> Vec<(PathBuf, String)> {
        self.write_calls.lock().unwrap().clone()
    }

    pub fn get_directory_creation_calls(&self) -> Vec<PathBuf> {
        self.directory_creation_calls.lock().unwrap().clone()
    }

    /// Configure the mock to fail write operations
    pub fn set_write_failure(&self, should_fail: bool) {
        self.should_fail_write.store(should_fail, Ordering::SeqCst);
    }

    /// Configure the mock to fail directory creation
    pub fn set_create_dir_failure(&self, should_fail: bool) {
        self.should_fail_create_dir
            .store(should_fail, Ordering::SeqCst);
    }
}

impl FileSystemInterface for MockFileSystem {
    fn read_config_file(&self, path: &Path) -> Result<String> {
        self.read_calls.lock().unwrap().push(path.to_path_buf());
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("File not found: {}", path.display()))
    }

    fn write_config_file(&self, path: &Path, content: &str) -> Result<()> {
        self.write_calls
            .lock()
            .unwrap()
            .push((path.to_path_buf(), content.to_string()));

        if self.should_fail_write.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("Mock write failure"));
        }

        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn config_file_exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn create_config_dir(&self, path: &Path) -> Result<()> {
        self.directory_creation_calls
            .lock()
            .unwrap()
            .push(path.to_path_buf());

        if self.should_fail_create_dir.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("Mock create directory failure"));
        }
        Ok(())
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}
