use anyhow::Result;
use tracing::{debug, info};

use super::{ChangeNotifier, NotifierStrategy};
use crate::system::{ChangeCallback, DeviceChangeSource};

/// Notifier backed by a native device-change subscription
pub struct EventNotifier<S: DeviceChangeSource> {
    source: S,
    subscribed: bool,
}

impl<S: DeviceChangeSource> EventNotifier<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            subscribed: false,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: DeviceChangeSource> ChangeNotifier for EventNotifier<S> {
    fn start(&mut self, on_change: ChangeCallback) -> Result<()> {
        if self.subscribed {
            debug!("Device change listener already installed");
            return Ok(());
        }

        self.source.subscribe(on_change)?;
        self.subscribed = true;
        info!("Subscribed to native device change notifications");
        Ok(())
    }

    fn strategy(&self) -> NotifierStrategy {
        NotifierStrategy::Event
    }
}
