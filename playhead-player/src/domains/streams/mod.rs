//! Stream negotiation and URL construction

pub mod selector;
pub mod url;

pub use selector::{StreamDecision, StreamRequest, StreamSelector};
