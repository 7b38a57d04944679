use std::fmt;
use thiserror::Error;

/// Device enumeration was rejected by the platform
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnumerationError {
    #[error("permission to enumerate devices was denied: {0}")]
    PermissionDenied(String),
    #[error("device enumeration failed: {0}")]
    Platform(String),
}

/// Platform classification of a failed capture acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionErrorKind {
    PermissionDenied,
    NotFound,
    ConstraintNotSatisfiable,
    SecurityContextInvalid,
    NotReadable,
    Aborted,
}

impl fmt::Display for AcquisitionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AcquisitionErrorKind::PermissionDenied => "NotAllowedError",
            AcquisitionErrorKind::NotFound => "NotFoundError",
            AcquisitionErrorKind::ConstraintNotSatisfiable => "OverconstrainedError",
            AcquisitionErrorKind::SecurityContextInvalid => "SecurityError",
            AcquisitionErrorKind::NotReadable => "NotReadableError",
            AcquisitionErrorKind::Aborted => "AbortError",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("[{kind}] {message}")]
pub struct AcquisitionError {
    pub kind: AcquisitionErrorKind,
    pub message: String,
}

impl AcquisitionError {
    pub fn new(kind: AcquisitionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(AcquisitionErrorKind::NotFound, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkErrorKind {
    /// Output routing requires a secure context
    Security,
    NotFound,
    Other,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkAttachError {
    #[error("you need a secure context for selecting audio output device: {0}")]
    Security(String),
    #[error("audio output device not found: {0}")]
    NotFound(String),
    #[error("failed to attach audio output device: {0}")]
    Other(String),
}

impl SinkAttachError {
    pub fn kind(&self) -> SinkErrorKind {
        match self {
            SinkAttachError::Security(_) => SinkErrorKind::Security,
            SinkAttachError::NotFound(_) => SinkErrorKind::NotFound,
            SinkAttachError::Other(_) => SinkErrorKind::Other,
        }
    }
}

/// Native device-change notifications are not available on this platform.
/// Selecting the polling notifier is the expected reaction, not a failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("device change notifications are not supported: {0}")]
pub struct UnsupportedCapability(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquisition_error_display() {
        let err = AcquisitionError::not_found("Requested device not found");
        assert_eq!(err.to_string(), "[NotFoundError] Requested device not found");
    }

    #[test]
    fn test_sink_error_kind() {
        let err = SinkAttachError::Security("not allowed".to_string());
        assert_eq!(err.kind(), SinkErrorKind::Security);
        assert!(err.to_string().contains("secure context"));
    }
}
