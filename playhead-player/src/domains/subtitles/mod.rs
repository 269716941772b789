//! Remote subtitle search and acquisition

pub mod coordinator;

pub use coordinator::{
    SubtitleAcquired, SubtitleAcquisitionCoordinator, SubtitleSearchState,
    find_new_subtitle,
};
