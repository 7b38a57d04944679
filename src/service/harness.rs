use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::{CaptureConfig, Config};
use crate::device::{DeviceKind, DeviceSnapshot};
use crate::error::EnumerationError;
use crate::logging::{IdFormat, log_devices};
use crate::notifier::{ChangeNotifier, ChangeTrigger, NotifierStrategy, PollingNotifier};
use crate::reconcile::{CycleReport, ReconciliationController};
use crate::stream::{SinkOutcome, StreamConstraints, attach_sink};
use crate::system::{MediaDevices, RenderTarget};
use crate::ui::OptionProjector;

/// Requests handled by the harness run loop, in arrival order.
///
/// The CLI only sends `Recheck` and `Shutdown` from its signal handler.
/// `Select` is the entry point for a front end embedding the harness through
/// the library API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarnessCommand {
    /// The user picked `value` in the selector of `kind`
    Select { kind: DeviceKind, value: String },
    /// Check devices now instead of waiting for a change signal
    Recheck,
    Shutdown,
}

/// The diagnostic capture page: selectors, a preview output and the
/// reconciliation controller, driven by one task.
pub struct DeviceHarness<M, R, P>
where
    M: MediaDevices,
    R: RenderTarget,
    P: OptionProjector,
{
    controller: ReconciliationController<M, P>,
    output: R,
    notifier: Box<dyn ChangeNotifier>,
    trigger: ChangeTrigger,
    capture: CaptureConfig,
    poll_interval: Duration,
    ids: IdFormat,
    initialized: bool,
    listening: bool,
}

impl<M, R, P> DeviceHarness<M, R, P>
where
    M: MediaDevices,
    R: RenderTarget,
    P: OptionProjector,
{
    pub fn new(
        media: Arc<M>,
        output: R,
        mut projector: P,
        notifier: Box<dyn ChangeNotifier>,
        config: &Config,
    ) -> Self {
        let ids = IdFormat::from_short(config.logging.short_ids);
        projector.set_output_disabled(!output.supports_sink_selection());

        let controller = ReconciliationController::new(
            media,
            projector,
            config.restart_policy(),
            config.capture.default_constraints(),
            ids,
        );

        Self {
            controller,
            output,
            notifier,
            trigger: ChangeTrigger::new(),
            capture: config.capture.clone(),
            poll_interval: config.general.poll_interval(),
            ids,
            initialized: false,
            listening: false,
        }
    }

    pub fn controller(&self) -> &ReconciliationController<M, P> {
        &self.controller
    }

    pub fn output(&self) -> &R {
        &self.output
    }

    pub fn trigger(&self) -> &ChangeTrigger {
        &self.trigger
    }

    pub fn notifier_strategy(&self) -> NotifierStrategy {
        self.notifier.strategy()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Constraints built from the current selector values
    pub fn selected_constraints(&self) -> StreamConstraints {
        let projector = self.controller.projector();
        StreamConstraints::from_selection(
            self.capture.audio,
            projector.selected(DeviceKind::AudioInput),
            self.capture.video,
            projector.selected(DeviceKind::VideoInput),
        )
    }

    /// (Re)start capture with the selected devices.
    ///
    /// The first call also enumerates devices, fills the selectors and
    /// installs the change listener, even when acquisition fails. Without a
    /// stream the next added device restarts capture.
    pub async fn start(&mut self) -> Result<u64> {
        let constraints = self.selected_constraints();
        let acquired = self
            .controller
            .streams_mut()
            .acquire(constraints)
            .await
            .map(|stream| stream.id());
        if let Err(e) = &acquired {
            error!("[error] {}", e);
        }

        let initialized = if self.initialized {
            Ok(())
        } else {
            self.initialize().await
        };
        self.ensure_listener()?;
        initialized?;

        Ok(acquired?)
    }

    async fn initialize(&mut self) -> Result<()> {
        let snapshot = self.initial_snapshot().await?;
        log_devices("Available devices", snapshot.iter(), self.ids);
        self.controller.install_snapshot(snapshot);
        self.initialized = true;

        // Restore a configured output once it is known to exist
        if let Some(output) = self.capture.preferred(DeviceKind::AudioOutput) {
            let selected = self.controller.projector().selected(DeviceKind::AudioOutput);
            if selected == Some(output.as_str()) {
                self.change_audio_destination().await;
            }
        }
        Ok(())
    }

    async fn initial_snapshot(&self) -> Result<DeviceSnapshot, EnumerationError> {
        let devices = self.controller.media().enumerate().await.map_err(|e| {
            error!("[error] {}", e);
            e
        })?;
        Ok(DeviceSnapshot::new(devices))
    }

    fn ensure_listener(&mut self) -> Result<()> {
        if self.listening {
            return Ok(());
        }

        if let Err(e) = self.notifier.start(self.trigger.callback()) {
            warn!(
                "Could not install {} listener ({:#}); falling back to polling",
                self.notifier.strategy(),
                e
            );
            self.notifier = Box::new(PollingNotifier::new(self.poll_interval));
            self.notifier
                .start(self.trigger.callback())
                .context("Failed to start polling notifier")?;
        }

        info!("Watching for device changes: {}", self.notifier.strategy());
        self.listening = true;
        Ok(())
    }

    /// Apply a selection made by the user
    pub async fn select_device(&mut self, kind: DeviceKind, value: &str) -> Result<()> {
        if !self.controller.projector_mut().select(kind, value) {
            warn!("[warn] {} is not an available {} option", value, kind);
            return Ok(());
        }

        match kind {
            DeviceKind::AudioInput | DeviceKind::VideoInput => {
                self.start().await?;
            }
            DeviceKind::AudioOutput => {
                self.change_audio_destination().await;
            }
        }
        Ok(())
    }

    /// Route preview audio to the selected output. A failed attach resets
    /// the output selector to the default entry.
    pub async fn change_audio_destination(&mut self) -> SinkOutcome {
        let sink_id = self
            .controller
            .projector()
            .selected(DeviceKind::AudioOutput)
            .unwrap_or_default()
            .to_string();

        let outcome = attach_sink(&mut self.output, &sink_id).await;
        if outcome.requires_default_fallback() {
            info!("Falling back to the default audio output");
            self.controller
                .projector_mut()
                .select_default(DeviceKind::AudioOutput);
        }
        outcome
    }

    /// Run one check cycle now
    pub async fn recheck(&mut self) -> Result<CycleReport, EnumerationError> {
        self.controller.check_devices().await
    }

    /// Process change signals and commands until shutdown.
    ///
    /// Everything runs on this task, one item at a time. Signals raised while
    /// a cycle is running collapse into a single follow-up cycle.
    pub async fn run(
        &mut self,
        mut commands: mpsc::UnboundedReceiver<HarnessCommand>,
    ) -> Result<()> {
        let trigger = self.trigger.clone();
        info!("Harness running");

        loop {
            tokio::select! {
                _ = trigger.wait() => {
                    debug!("Device change signal received");
                    // Failures are logged by the controller; wait for the next signal
                    let _ = self.controller.check_devices().await;
                }
                command = commands.recv() => match command {
                    Some(HarnessCommand::Select { kind, value }) => {
                        if let Err(e) = self.select_device(kind, &value).await {
                            warn!("Selection of {} failed: {:#}", value, e);
                        }
                    }
                    Some(HarnessCommand::Recheck) => {
                        info!("Forced device check");
                        let _ = self.controller.check_devices().await;
                    }
                    Some(HarnessCommand::Shutdown) | None => break,
                },
            }
        }

        if self.controller.streams_mut().release() {
            info!("Capture stream released");
        }
        info!("Harness stopped after {} device checks", self.controller.cycles());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceDescriptor;
    use crate::error::{AcquisitionError, AcquisitionErrorKind, SinkAttachError};
    use crate::notifier::EventNotifier;
    use crate::system::{MockDeviceChangeSource, MockMediaDevices, MockRenderTarget};
    use crate::ui::DeviceSelectors;

    type Harness = DeviceHarness<MockMediaDevices, MockRenderTarget, DeviceSelectors>;

    fn harness(
        media: &MockMediaDevices,
        source: &MockDeviceChangeSource,
        config: &Config,
    ) -> Harness {
        DeviceHarness::new(
            Arc::new(media.clone()),
            MockRenderTarget::new(),
            DeviceSelectors::new(),
            Box::new(EventNotifier::new(source.clone())),
            config,
        )
    }

    #[tokio::test]
    async fn test_first_start_installs_snapshot_and_listener() {
        let media = MockMediaDevices::with_default_devices();
        let source = MockDeviceChangeSource::new();
        let mut harness = harness(&media, &source, &Config::default());

        assert_eq!(harness.start().await.unwrap(), 1);
        assert_eq!(harness.controller().snapshot().len(), 4);
        assert!(harness.is_listening());
        assert_eq!(source.get_subscribe_calls(), 1);

        harness.start().await.unwrap();
        assert_eq!(source.get_subscribe_calls(), 1);
        assert_eq!(media.get_enumerate_calls(), 1);
    }

    #[tokio::test]
    async fn test_restart_uses_selected_devices() {
        let media = MockMediaDevices::with_default_devices();
        let source = MockDeviceChangeSource::new();
        let mut harness = harness(&media, &source, &Config::default());
        harness.start().await.unwrap();

        harness
            .select_device(DeviceKind::AudioInput, "mic-usb")
            .await
            .unwrap();

        assert_eq!(
            media.get_acquire_calls().last(),
            Some(&StreamConstraints::from_selection(
                true,
                Some("mic-usb"),
                false,
                None
            ))
        );
        assert_eq!(
            harness.controller().streams().audio_device_in_use().as_deref(),
            Some("mic-usb")
        );
        assert_eq!(media.live_track_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_start_is_reported() {
        let media = MockMediaDevices::with_default_devices();
        let source = MockDeviceChangeSource::new();
        let mut harness = harness(&media, &source, &Config::default());
        media.fail_next_acquire(AcquisitionErrorKind::PermissionDenied);

        let err = harness.start().await.unwrap_err();
        let err = err.downcast::<AcquisitionError>().unwrap();
        assert_eq!(err.kind, AcquisitionErrorKind::PermissionDenied);

        // Devices are still known and watched, only the stream is missing
        assert!(harness.is_listening());
        assert_eq!(harness.controller().snapshot().len(), 4);
        assert!(harness.controller().streams().active().is_none());
    }

    #[tokio::test]
    async fn test_enumeration_failure_at_start_still_listens() {
        let media = MockMediaDevices::with_default_devices();
        let source = MockDeviceChangeSource::new();
        let mut harness = harness(&media, &source, &Config::default());
        media.set_enumeration_failure(true);

        assert!(harness.start().await.is_err());
        assert!(harness.is_listening());
        assert!(harness.controller().snapshot().is_empty());

        media.set_enumeration_failure(false);
        harness.start().await.unwrap();
        assert_eq!(harness.controller().snapshot().len(), 4);
        assert_eq!(source.get_subscribe_calls(), 1);
    }

    #[tokio::test]
    async fn test_sink_failure_resets_output_selection() {
        let media = MockMediaDevices::with_default_devices();
        media.add_device(DeviceDescriptor::new(DeviceKind::AudioOutput, "spk-usb"));
        let source = MockDeviceChangeSource::new();
        let mut harness = DeviceHarness::new(
            Arc::new(media.clone()),
            {
                let mut target = MockRenderTarget::new();
                target.fail_with(SinkAttachError::Security("https required".to_string()));
                target
            },
            DeviceSelectors::new(),
            Box::new(EventNotifier::new(source.clone())),
            &Config::default(),
        );
        harness.start().await.unwrap();

        harness
            .select_device(DeviceKind::AudioOutput, "spk-usb")
            .await
            .unwrap();

        assert_eq!(
            harness.controller().projector().selected(DeviceKind::AudioOutput),
            Some("spk-builtin")
        );
    }

    #[tokio::test]
    async fn test_unsupported_source_falls_back_to_polling() {
        let media = MockMediaDevices::with_default_devices();
        let source = MockDeviceChangeSource::unsupported();
        let mut harness = harness(&media, &source, &Config::default());

        harness.start().await.unwrap();
        assert_eq!(
            harness.notifier_strategy(),
            NotifierStrategy::Polling(Duration::from_millis(1000))
        );
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_and_releases() {
        let media = MockMediaDevices::with_default_devices();
        let source = MockDeviceChangeSource::new();
        let mut harness = harness(&media, &source, &Config::default());
        harness.start().await.unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(HarnessCommand::Recheck).unwrap();
        tx.send(HarnessCommand::Shutdown).unwrap();
        harness.run(rx).await.unwrap();

        assert_eq!(media.live_track_count(), 0);
        assert_eq!(media.get_enumerate_calls(), 2);
    }

    #[tokio::test]
    async fn test_select_command_restarts_capture() {
        let media = MockMediaDevices::with_default_devices();
        let source = MockDeviceChangeSource::new();
        let mut harness = harness(&media, &source, &Config::default());
        harness.start().await.unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(HarnessCommand::Select {
            kind: DeviceKind::AudioInput,
            value: "mic-usb".to_string(),
        })
        .unwrap();
        tx.send(HarnessCommand::Shutdown).unwrap();
        harness.run(rx).await.unwrap();

        assert_eq!(
            media.get_acquire_calls().last(),
            Some(&StreamConstraints::from_selection(
                true,
                Some("mic-usb"),
                false,
                None
            ))
        );
    }
}
