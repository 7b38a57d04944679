pub mod adapters;
#[cfg(target_os = "macos")]
pub mod coreaudio;
pub mod cpal_backend;
pub mod traits;

// Mock implementations for testing
#[cfg(any(test, feature = "test-mocks"))]
pub mod mocks;

pub use adapters::*;
pub use cpal_backend::{CpalMediaDevices, CpalTrack, PreviewOutput};
pub use traits::*;

#[cfg(any(test, feature = "test-mocks"))]
pub use mocks::*;
