use thiserror::Error;

/// Errors produced by model constructors and validation routines.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("invalid segment: {0}")]
    InvalidSegment(String),

    #[error("invalid media source: {0}")]
    InvalidSource(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
