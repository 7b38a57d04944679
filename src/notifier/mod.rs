//! Device change notification strategies.
//!
//! The reconcile loop never knows which strategy is in use: native events and
//! polling both just invoke a callback that means "the device set may have
//! changed". Deciding whether anything actually changed is left to the diff.

pub mod event;
pub mod polling;
pub mod trigger;

use anyhow::Result;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::UnsupportedCapability;
use crate::system::{ChangeCallback, DeviceChangeSource};

pub use event::EventNotifier;
pub use polling::PollingNotifier;
pub use trigger::ChangeTrigger;

/// Default polling period when no native notification exists
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierStrategy {
    Event,
    Polling(Duration),
}

impl fmt::Display for NotifierStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifierStrategy::Event => write!(f, "devicechange event"),
            NotifierStrategy::Polling(interval) => {
                write!(f, "polling every {} ms", interval.as_millis())
            }
        }
    }
}

/// "Tell me whenever the device set may have changed"
pub trait ChangeNotifier: Send {
    /// Install `on_change` for the lifetime of the notifier. Calling `start`
    /// again after a successful start does not subscribe a second time.
    fn start(&mut self, on_change: ChangeCallback) -> Result<()>;

    fn strategy(&self) -> NotifierStrategy;
}

/// Pick the notifier once at startup from the platform's capabilities
pub fn select_notifier<S>(
    source: S,
    force_polling: bool,
    poll_interval: Duration,
) -> Box<dyn ChangeNotifier>
where
    S: DeviceChangeSource + 'static,
{
    let supported = source.supports_device_change();
    info!("[support] devicechange notifications supported: {}", supported);

    if supported && !force_polling {
        return Box::new(EventNotifier::new(source));
    }

    if !supported {
        let reason = UnsupportedCapability("no native device change notification".to_string());
        warn!("{}; falling back to polling", reason);
    } else {
        info!("Polling forced by configuration");
    }
    Box::new(PollingNotifier::new(poll_interval))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::MockDeviceChangeSource;

    #[tokio::test]
    async fn test_selects_event_when_supported() {
        let notifier =
            select_notifier(MockDeviceChangeSource::new(), false, DEFAULT_POLL_INTERVAL);
        assert_eq!(notifier.strategy(), NotifierStrategy::Event);
    }

    #[tokio::test]
    async fn test_selects_polling_when_unsupported() {
        let notifier = select_notifier(
            MockDeviceChangeSource::unsupported(),
            false,
            DEFAULT_POLL_INTERVAL,
        );
        assert_eq!(
            notifier.strategy(),
            NotifierStrategy::Polling(Duration::from_millis(1000))
        );
    }

    #[tokio::test]
    async fn test_force_polling() {
        let notifier = select_notifier(
            MockDeviceChangeSource::new(),
            true,
            Duration::from_millis(250),
        );
        assert_eq!(
            notifier.strategy(),
            NotifierStrategy::Polling(Duration::from_millis(250))
        );
        assert_eq!(notifier.strategy().to_string(), "polling every 250 ms");
    }
}
