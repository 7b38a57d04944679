use tracing::{error, info, warn};

use crate::error::SinkAttachError;
use crate::system::RenderTarget;

/// Result of routing preview audio to an output device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    Attached(String),
    /// The render target cannot select outputs; nothing was changed
    Unsupported,
    /// Routing failed; the caller must fall back to the default output
    Failed(SinkAttachError),
}

impl SinkOutcome {
    pub fn requires_default_fallback(&self) -> bool {
        matches!(self, SinkOutcome::Failed(_))
    }
}

/// Attach the audio output of `target` to `sink_id`.
///
/// Never fails hard: an unsupported target degrades to a warning and routing
/// errors are reported back for the caller to reset its selection.
pub async fn attach_sink<R: RenderTarget>(target: &mut R, sink_id: &str) -> SinkOutcome {
    if !target.supports_sink_selection() {
        warn!("[warn] Output device selection is not supported.");
        return SinkOutcome::Unsupported;
    }

    match target.set_sink_id(sink_id).await {
        Ok(()) => {
            info!(sink_id, "[success] audio output device attached");
            SinkOutcome::Attached(sink_id.to_string())
        }
        Err(e) => {
            error!("[error] {}", e);
            SinkOutcome::Failed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::MockRenderTarget;

    #[tokio::test]
    async fn test_attach_supported() {
        let mut target = MockRenderTarget::new();
        let outcome = attach_sink(&mut target, "spk-usb").await;

        assert_eq!(outcome, SinkOutcome::Attached("spk-usb".to_string()));
        assert_eq!(target.sink_id(), Some("spk-usb"));
    }

    #[tokio::test]
    async fn test_unsupported_is_noop() {
        let mut target = MockRenderTarget::unsupported();
        let outcome = attach_sink(&mut target, "spk-usb").await;

        assert_eq!(outcome, SinkOutcome::Unsupported);
        assert!(!outcome.requires_default_fallback());
        assert_eq!(target.sink_id(), None);
    }

    #[tokio::test]
    async fn test_security_failure_requests_fallback() {
        let mut target = MockRenderTarget::new();
        target.fail_with(SinkAttachError::Security("insecure origin".to_string()));

        let outcome = attach_sink(&mut target, "spk-usb").await;
        assert!(outcome.requires_default_fallback());
    }
}
