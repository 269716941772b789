//! Engine focused snapshot of the types surface.
//! Prefer importing from this module instead of individual tree nodes when
//! working in playhead-player.

pub use super::device::DeviceProfile;
pub use super::ids::{ItemId, MediaSourceId, PlaySessionId, UserId};
pub use super::item::{ItemKind, PlaybackItem};
pub use super::segment::{
    Segment, SegmentKind, SegmentPolicies, SegmentPolicy,
};
pub use super::selection::{TrackIndex, TrackSelection};
pub use super::source::{MediaSource, MediaStream, PlayMethod, StreamKind};
pub use super::subtitle::RemoteSubtitleCandidate;
