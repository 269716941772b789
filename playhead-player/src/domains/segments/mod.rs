//! Segment domain
//!
//! A pure [`SegmentSkipMonitor`] decides, a [`SegmentRunner`] polls the
//! playhead and carries the decisions out.

pub mod monitor;
pub mod runner;

pub use monitor::{MonitorState, SegmentSkipMonitor, SkipAction};
pub use runner::{SegmentCommand, SegmentEvent, SegmentRunner};
