//! Infrastructure: service traits for the media server and logging setup.

pub mod logging;
pub mod services;
