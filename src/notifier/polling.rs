use anyhow::Result;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::{ChangeNotifier, NotifierStrategy};
use crate::system::ChangeCallback;

/// Fallback notifier that reports a possible change on every tick
pub struct PollingNotifier {
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl PollingNotifier {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            task: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl ChangeNotifier for PollingNotifier {
    fn start(&mut self, on_change: ChangeCallback) -> Result<()> {
        if self.task.is_some() {
            debug!("Polling notifier already running");
            return Ok(());
        }

        let period = self.interval;
        info!("Polling for device changes every {} ms", period.as_millis());

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                on_change();
            }
        }));

        Ok(())
    }

    fn strategy(&self) -> NotifierStrategy {
        NotifierStrategy::Polling(self.interval)
    }
}

impl Drop for PollingNotifier {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
