//! Core data model definitions shared across Playhead crates.
#![allow(missing_docs)]

pub mod device;
pub mod error;
pub mod ids;
pub mod item;
pub mod prelude;
pub mod segment;
pub mod selection;
pub mod source;
pub mod subtitle;

// Intentionally curated re-exports for downstream consumers.
pub use device::DeviceProfile;
pub use error::{ModelError, Result as ModelResult};
pub use ids::{ItemId, MediaSourceId, PlaySessionId, UserId};
pub use item::{ItemKind, PlaybackItem};
pub use segment::{Segment, SegmentKind, SegmentPolicies, SegmentPolicy};
pub use selection::{TrackIndex, TrackSelection};
pub use source::{MediaSource, MediaStream, PlayMethod, StreamKind};
pub use subtitle::RemoteSubtitleCandidate;
