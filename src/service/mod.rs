pub mod harness;
pub mod probe;
pub mod signals;

pub use harness::{DeviceHarness, HarnessCommand};
pub use probe::{ProbeReport, probe_devices};
pub use signals::SignalHandler;
