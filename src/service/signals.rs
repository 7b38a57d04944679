use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::harness::HarnessCommand;

/// Translates process signals into harness commands
#[derive(Clone)]
pub struct SignalHandler {
    commands: mpsc::UnboundedSender<HarnessCommand>,
}

impl SignalHandler {
    pub fn new(commands: mpsc::UnboundedSender<HarnessCommand>) -> Self {
        Self { commands }
    }

    /// SIGTERM and SIGINT shut the harness down; SIGHUP forces a device check.
    /// Returns after the shutdown command was sent.
    #[cfg(unix)]
    pub async fn listen_for_signals(&self) -> Result<()> {
        use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
        use signal_hook_tokio::Signals;
        use tokio_stream::StreamExt;

        let mut signals = Signals::new([SIGTERM, SIGINT, SIGHUP])?;
        info!("Signal handler initialized, listening for SIGTERM, SIGINT, SIGHUP");

        while let Some(signal) = signals.next().await {
            match signal {
                SIGTERM | SIGINT => {
                    info!("Received shutdown signal ({}), stopping", signal);
                    self.send(HarnessCommand::Shutdown);
                    break;
                }
                SIGHUP => {
                    info!("Received SIGHUP, checking devices");
                    self.send(HarnessCommand::Recheck);
                }
                _ => warn!("Received unexpected signal: {}", signal),
            }
        }
        Ok(())
    }

    #[cfg(not(unix))]
    pub async fn listen_for_signals(&self) -> Result<()> {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl-C, stopping");
        self.send(HarnessCommand::Shutdown);
        Ok(())
    }

    fn send(&self, command: HarnessCommand) {
        if let Err(e) = self.commands.send(command) {
            warn!("Harness is no longer running: {}", e);
        }
    }
}
