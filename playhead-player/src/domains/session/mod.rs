//! Playback session domain
//!
//! `PlaybackSessionController` owns the player handle for one viewing
//! session. Every item load bumps a generation counter; background loops
//! (segment runner, subtitle polling, next-up countdown) are spawned under
//! the current generation and their results are dropped once it moves on.

pub mod autoplay;
pub mod controller;
pub mod jobs;
pub mod keys;
pub mod state;

pub use autoplay::{AutoPlayDecision, AutoPlayPolicy};
pub use controller::PlaybackSessionController;
pub use jobs::{
    BackgroundEvent, BackgroundEventKind, BackgroundJobs, BackgroundSender,
    GenerationGuard, SessionGeneration,
};
pub use keys::KeyAction;
pub use state::{NextUp, SessionSnapshot, SessionState, SwitchReason};
