pub mod controller;
pub mod policy;

pub use controller::{ControllerState, CycleReport, ReconciliationController};
pub use policy::{RestartDecision, RestartPolicy, RestartReason};
