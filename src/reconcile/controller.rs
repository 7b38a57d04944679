use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::policy::{RestartDecision, RestartPolicy};
use crate::device::{DeviceDiff, DeviceSnapshot, SnapshotStore, diff};
use crate::error::{AcquisitionError, EnumerationError};
use crate::logging::{IdFormat, log_devices};
use crate::stream::{StreamConstraints, StreamLifecycleManager};
use crate::system::MediaDevices;
use crate::ui::OptionProjector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Checking,
    Reconciling,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerState::Idle => write!(f, "idle"),
            ControllerState::Checking => write!(f, "checking"),
            ControllerState::Reconciling => write!(f, "reconciling"),
        }
    }
}

/// What one check cycle saw and did
#[derive(Debug)]
pub struct CycleReport {
    pub diff: DeviceDiff,
    pub snapshot: DeviceSnapshot,
    pub decision: RestartDecision,
    /// Outcome of the restart, when one was attempted: the new stream id
    pub restart: Option<Result<u64, AcquisitionError>>,
}

impl CycleReport {
    pub fn changed(&self) -> bool {
        !self.diff.is_empty()
    }
}

/// Drives one check/reconcile cycle at a time.
///
/// Owns the snapshot store and the stream manager; nothing else writes to
/// either. Cycles take `&mut self`, so they can never overlap.
pub struct ReconciliationController<M: MediaDevices, P: OptionProjector> {
    media: Arc<M>,
    store: SnapshotStore,
    streams: StreamLifecycleManager<M>,
    projector: P,
    policy: RestartPolicy,
    restart_constraints: StreamConstraints,
    state: ControllerState,
    ids: IdFormat,
    cycles: u64,
}

impl<M: MediaDevices, P: OptionProjector> ReconciliationController<M, P> {
    pub fn new(
        media: Arc<M>,
        projector: P,
        policy: RestartPolicy,
        restart_constraints: StreamConstraints,
        ids: IdFormat,
    ) -> Self {
        let streams = StreamLifecycleManager::new(Arc::clone(&media), ids);
        Self {
            media,
            store: SnapshotStore::new(),
            streams,
            projector,
            policy,
            restart_constraints,
            state: ControllerState::Idle,
            ids,
            cycles: 0,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn snapshot(&self) -> &DeviceSnapshot {
        self.store.current()
    }

    pub fn streams(&self) -> &StreamLifecycleManager<M> {
        &self.streams
    }

    pub fn streams_mut(&mut self) -> &mut StreamLifecycleManager<M> {
        &mut self.streams
    }

    pub fn projector(&self) -> &P {
        &self.projector
    }

    pub fn projector_mut(&mut self) -> &mut P {
        &mut self.projector
    }

    pub fn media(&self) -> &Arc<M> {
        &self.media
    }

    /// Completed check cycles, including no-op ones
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Install a snapshot without diffing, e.g. after the first enumeration
    pub fn install_snapshot(&mut self, snapshot: DeviceSnapshot) {
        self.projector.project(&snapshot);
        self.store.replace(snapshot);
    }

    /// Enumerate, diff against the stored snapshot and reconcile.
    ///
    /// An enumeration failure leaves the stored snapshot untouched and the
    /// controller idle.
    pub async fn check_devices(&mut self) -> Result<CycleReport, EnumerationError> {
        self.state = ControllerState::Checking;

        let devices = match self.media.enumerate().await {
            Ok(devices) => devices,
            Err(e) => {
                error!("[error] device enumeration failed: {}", e);
                self.state = ControllerState::Idle;
                return Err(e);
            }
        };

        let current = DeviceSnapshot::new(devices);
        let delta = diff(self.store.current(), &current);
        self.cycles += 1;

        if delta.is_empty() {
            debug!("Device check found no changes");
            // Labels may still have changed
            self.store.replace(current.clone());
            self.state = ControllerState::Idle;
            return Ok(CycleReport {
                diff: delta,
                snapshot: current,
                decision: RestartDecision::Keep,
                restart: None,
            });
        }

        self.state = ControllerState::Reconciling;
        info!(
            added = delta.added.len(),
            removed = delta.removed.len(),
            "Device set changed"
        );

        self.projector.project(&current);

        if !delta.added.is_empty() {
            log_devices("Devices added", &delta.added, self.ids);
        }
        if !delta.removed.is_empty() {
            log_devices("Devices removed", &delta.removed, self.ids);
        }

        let in_use = self.streams.audio_device_in_use();
        if let Some(id) = in_use.as_deref() {
            info!("Audio input in use: {}", self.ids.device_id(id));
        }

        let decision = self.policy.decide(&delta, in_use.as_deref());
        let restart = match decision {
            RestartDecision::Restart(reason) => {
                info!("Switching to default devices: {}", reason);
                let result = self
                    .streams
                    .acquire(self.restart_constraints.clone())
                    .await
                    .map(|stream| stream.id());
                if let Err(e) = &result {
                    error!("[error] capture restart failed: {}", e);
                }
                Some(result)
            }
            RestartDecision::LeftToPlatform(reason) => {
                info!("Not restarting capture ({}); platform switches on its own", reason);
                None
            }
            RestartDecision::Keep => None,
        };

        self.store.replace(current.clone());
        self.state = ControllerState::Idle;

        Ok(CycleReport {
            diff: delta,
            snapshot: current,
            decision,
            restart,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceDescriptor, DeviceKind};
    use crate::error::AcquisitionErrorKind;
    use crate::reconcile::RestartReason;
    use crate::system::MockMediaDevices;
    use crate::ui::DeviceSelectors;

    type Controller = ReconciliationController<MockMediaDevices, DeviceSelectors>;

    async fn controller_with_stream(media: &MockMediaDevices, policy: RestartPolicy) -> Controller {
        let mut controller = ReconciliationController::new(
            Arc::new(media.clone()),
            DeviceSelectors::new(),
            policy,
            StreamConstraints::defaults(true, true),
            IdFormat::Full,
        );
        controller
            .streams_mut()
            .acquire(StreamConstraints::defaults(true, true))
            .await
            .unwrap();
        let initial = media.enumerate().await.unwrap();
        controller.install_snapshot(DeviceSnapshot::new(initial));
        controller
    }

    #[tokio::test]
    async fn test_no_change_is_noop() {
        let media = MockMediaDevices::with_default_devices();
        let mut controller = controller_with_stream(&media, RestartPolicy::default()).await;

        let report = controller.check_devices().await.unwrap();
        assert!(!report.changed());
        assert_eq!(report.decision, RestartDecision::Keep);
        assert_eq!(media.get_acquire_calls().len(), 1);
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[tokio::test]
    async fn test_label_change_refreshes_snapshot_only() {
        let media = MockMediaDevices::with_default_devices();
        let mut controller = controller_with_stream(&media, RestartPolicy::default()).await;
        media.rename_device(DeviceKind::AudioInput, "mic-usb", "Podcast Mic");

        let report = controller.check_devices().await.unwrap();
        assert!(!report.changed());
        assert_eq!(
            controller
                .snapshot()
                .find(DeviceKind::AudioInput, "mic-usb")
                .map(|d| d.label.as_str()),
            Some("Podcast Mic")
        );
    }

    #[tokio::test]
    async fn test_added_device_restarts_with_defaults() {
        let media = MockMediaDevices::with_default_devices();
        let mut controller = controller_with_stream(&media, RestartPolicy::default()).await;
        media.add_device(DeviceDescriptor::new(DeviceKind::AudioInput, "headset"));

        let report = controller.check_devices().await.unwrap();
        assert_eq!(report.diff.added.len(), 1);
        assert_eq!(
            report.decision,
            RestartDecision::Restart(RestartReason::DeviceAdded)
        );
        assert!(matches!(report.restart, Some(Ok(2))));
        assert_eq!(
            media.get_acquire_calls().last(),
            Some(&StreamConstraints::defaults(true, true))
        );
    }

    #[tokio::test]
    async fn test_restart_failure_leaves_controller_idle() {
        let media = MockMediaDevices::with_default_devices();
        let mut controller = controller_with_stream(&media, RestartPolicy::default()).await;
        media.add_device(DeviceDescriptor::new(DeviceKind::VideoInput, "cam-usb"));
        media.fail_next_acquire(AcquisitionErrorKind::NotReadable);

        let report = controller.check_devices().await.unwrap();
        assert!(matches!(report.restart, Some(Err(_))));
        assert!(controller.streams().active().is_none());
        assert_eq!(controller.state(), ControllerState::Idle);
        assert_eq!(media.live_track_count(), 0);
    }

    #[tokio::test]
    async fn test_enumeration_failure_keeps_snapshot() {
        let media = MockMediaDevices::with_default_devices();
        let mut controller = controller_with_stream(&media, RestartPolicy::default()).await;
        let before = controller.snapshot().clone();
        media.set_enumeration_failure(true);

        assert!(controller.check_devices().await.is_err());
        assert_eq!(controller.snapshot(), &before);
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[tokio::test]
    async fn test_removed_device_refreshes_projection() {
        let media = MockMediaDevices::with_default_devices();
        let mut controller = controller_with_stream(&media, RestartPolicy::default()).await;
        controller
            .projector_mut()
            .select(DeviceKind::AudioInput, "mic-usb");
        media.remove_device(DeviceKind::AudioInput, "mic-usb");

        controller.check_devices().await.unwrap();
        assert_eq!(
            controller.projector().selected(DeviceKind::AudioInput),
            Some("mic-builtin")
        );
    }
}
