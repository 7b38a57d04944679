pub mod constraints;
pub mod manager;
pub mod sink;
pub mod track;

pub use constraints::{MediaConstraint, StreamConstraints};
pub use manager::StreamLifecycleManager;
pub use sink::{SinkOutcome, attach_sink};
pub use track::{ActiveStream, MediaTrack, TrackKind, TrackSettings};
