//! Commonly used engine types in one import.

pub use crate::domains::player::{
    MediaLoadRequest, PlayerEngine, PlayerError, PlayerEvent, TrackGroup,
    TrackGroupId, TrackKind,
};
pub use crate::domains::playlist::{PlaylistCursor, PlaylistError, TraversalMode};
pub use crate::domains::seek::SeekAccelerationProfile;
pub use crate::domains::segments::{SegmentSkipMonitor, SkipAction};
pub use crate::domains::session::{
    KeyAction, PlaybackSessionController, SessionSnapshot, SessionState,
    SwitchReason,
};
pub use crate::domains::streams::{StreamDecision, StreamRequest, StreamSelector};
pub use crate::domains::subtitles::{
    SubtitleAcquisitionCoordinator, SubtitleSearchState,
};
pub use crate::domains::tracks::{MapMiss, MapOutcome, MappingPlan, TrackIndexMapper};
pub use crate::error::{PlaybackError, Result};
pub use crate::infra::services::{PlaybackServices, ServiceError};
pub use playhead_model::prelude::*;
