//! Track domain
//!
//! Server stream indices and native track groups are two coordinate systems;
//! the mapper is the only place one is translated into the other.

pub mod mapper;

pub use mapper::{MapMiss, MapOutcome, MappingPlan, MappingReport, TrackIndexMapper};
