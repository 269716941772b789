use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::domains::segments::{SegmentCommand, SegmentEvent};
use crate::domains::subtitles::SubtitleAcquired;
use crate::error::PlaybackError;

const JOB_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Monotonic counter bumped every time the session starts a new item.
#[derive(Debug, Clone, Default)]
pub struct SessionGeneration(Arc<AtomicU64>);

impl SessionGeneration {
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Invalidate every outstanding guard and return the new generation.
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn guard(&self) -> GenerationGuard {
        GenerationGuard {
            expected: self.current(),
            current: Arc::clone(&self.0),
        }
    }
}

/// Snapshot of the generation a background loop was spawned under.
#[derive(Debug, Clone)]
pub struct GenerationGuard {
    expected: u64,
    current: Arc<AtomicU64>,
}

impl GenerationGuard {
    pub fn generation(&self) -> u64 {
        self.expected
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.expected
    }
}

#[derive(Debug, Clone)]
pub enum BackgroundEventKind {
    Segment(SegmentEvent),
    SubtitleAcquired(Result<SubtitleAcquired, PlaybackError>),
    NextUpElapsed,
}

/// Message from a background loop, tagged with the generation it ran under.
#[derive(Debug, Clone)]
pub struct BackgroundEvent {
    pub generation: u64,
    pub kind: BackgroundEventKind,
}

impl BackgroundEvent {
    pub fn new(generation: u64, kind: BackgroundEventKind) -> Self {
        Self { generation, kind }
    }
}

pub type BackgroundSender = mpsc::UnboundedSender<BackgroundEvent>;

/// Loops parented to the current item.
///
/// All of them share one cancellation token; [`shutdown`](Self::shutdown)
/// cancels and awaits them before the next item starts.
pub struct BackgroundJobs {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
    segment_commands: Option<mpsc::UnboundedSender<SegmentCommand>>,
}

impl fmt::Debug for BackgroundJobs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundJobs")
            .field("jobs", &self.handles.len())
            .field("cancelled", &self.cancel.is_cancelled())
            .field("segment_runner", &self.segment_commands.is_some())
            .finish()
    }
}

impl Default for BackgroundJobs {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundJobs {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            handles: Vec::new(),
            segment_commands: None,
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn spawn<F>(&mut self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handles.retain(|handle| !handle.is_finished());
        self.handles.push(tokio::spawn(job));
    }

    pub fn set_segment_commands(
        &mut self,
        commands: mpsc::UnboundedSender<SegmentCommand>,
    ) {
        self.segment_commands = Some(commands);
    }

    /// Returns `false` when no segment runner is listening.
    pub fn send_segment_command(&self, command: SegmentCommand) -> bool {
        self.segment_commands
            .as_ref()
            .is_some_and(|tx| tx.send(command).is_ok())
    }

    pub fn active(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Cancel every job and wait for them to finish. A fresh token is armed
    /// for the next item.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        self.segment_commands = None;

        for handle in std::mem::take(&mut self.handles) {
            match tokio::time::timeout(JOB_SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => log::warn!("[Session] Background job failed: {err}"),
                Err(_) => log::warn!("[Session] Background job did not stop in time"),
            }
        }

        self.cancel = CancellationToken::new();
    }
}

impl Drop for BackgroundJobs {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
