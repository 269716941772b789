use std::sync::Arc;

use playhead_config::SegmentConfig;
use playhead_model::{ItemId, Segment};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::monitor::{MonitorState, SegmentSkipMonitor, SkipAction};
use crate::domains::player::{PlayerEngine, PlayerProbe};
use crate::domains::session::jobs::{
    BackgroundEvent, BackgroundEventKind, BackgroundSender,
};
use crate::infra::services::SegmentService;

/// Reported to the session by the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentEvent {
    Prompt(Segment),
    ClearPrompt,
    /// The runner seeked past a segment (auto-skip or accepted prompt).
    Skipped(Segment),
}

/// Sent by the session in response to a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentCommand {
    Accept,
    Dismiss,
}

/// Polls the playhead for one item and acts on its segments.
pub struct SegmentRunner<P: PlayerEngine> {
    pub probe: PlayerProbe<P>,
    pub service: Arc<dyn SegmentService>,
    pub item_id: ItemId,
    pub config: SegmentConfig,
    pub generation: u64,
    pub events: BackgroundSender,
    pub commands: mpsc::UnboundedReceiver<SegmentCommand>,
    pub cancel: CancellationToken,
}

impl<P: PlayerEngine> SegmentRunner<P> {
    pub async fn run(mut self) {
        let segments = tokio::select! {
            _ = self.cancel.cancelled() => return,
            result = self.service.fetch_segments(self.item_id) => result,
        };

        let segments = match segments {
            Ok(segments) => segments,
            Err(err) => {
                log::warn!(
                    "[Segments] Failed to fetch segments for {}: {err}; skipping disabled",
                    self.item_id
                );
                return;
            }
        };

        let mut monitor = SegmentSkipMonitor::new(
            segments,
            &self.config.policies,
            self.config.min_duration(),
        );
        if monitor.is_idle() {
            log::debug!("[Segments] Nothing to act on for {}", self.item_id);
            return;
        }
        log::debug!(
            "[Segments] Watching {} segments for {}",
            monitor.len(),
            self.item_id
        );

        let mut interval = tokio::time::interval(self.config.poll_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                Some(command) = self.commands.recv() => {
                    self.handle_command(&mut monitor, command);
                }
                _ = interval.tick() => {
                    let action = monitor.on_position(self.probe.position());
                    self.handle_action(action, monitor.state());
                }
            }
        }

        log::debug!("[Segments] Runner for {} stopped", self.item_id);
    }

    fn handle_command(
        &self,
        monitor: &mut SegmentSkipMonitor,
        command: SegmentCommand,
    ) {
        let prompted = match monitor.state() {
            MonitorState::InSegment(segment) => Some(segment),
            _ => None,
        };

        match command {
            SegmentCommand::Accept => {
                if let (Some(segment), Some(target)) = (prompted, monitor.accept())
                {
                    log::info!("[Segments] Skipping {} to {target:?}", segment.kind);
                    self.probe.seek(target);
                    self.emit(SegmentEvent::Skipped(segment));
                } else {
                    // the playhead already left the segment; every accept
                    // gets an answer
                    log::debug!("[Segments] Nothing to skip, clearing prompt");
                    self.emit(SegmentEvent::ClearPrompt);
                }
            }
            SegmentCommand::Dismiss => {
                if monitor.dismiss() {
                    self.emit(SegmentEvent::ClearPrompt);
                }
            }
        }
    }

    fn handle_action(&self, action: SkipAction, state: MonitorState) {
        match action {
            SkipAction::None => {}
            SkipAction::Seek(target) => {
                self.probe.seek(target);
                // auto-skip leaves the monitor in Skipped(segment)
                if let MonitorState::Skipped(segment) = state {
                    log::info!(
                        "[Segments] Auto-skipped {} to {target:?}",
                        segment.kind
                    );
                    self.emit(SegmentEvent::Skipped(segment));
                }
            }
            SkipAction::Prompt(segment) => {
                log::debug!("[Segments] Prompting to skip {}", segment.kind);
                self.emit(SegmentEvent::Prompt(segment));
            }
            SkipAction::ClearPrompt => self.emit(SegmentEvent::ClearPrompt),
        }
    }

    fn emit(&self, event: SegmentEvent) {
        let _ = self.events.send(BackgroundEvent::new(
            self.generation,
            BackgroundEventKind::Segment(event),
        ));
    }
}
