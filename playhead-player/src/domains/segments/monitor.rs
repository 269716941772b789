use std::time::Duration;

use playhead_model::{Segment, SegmentPolicies, SegmentPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Nothing to act on for this item.
    Idle,
    Watching,
    /// Inside an ask-to-skip segment with a prompt showing.
    InSegment(Segment),
    /// Skipped or dismissed; ignored until playback leaves it.
    Skipped(Segment),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipAction {
    None,
    Seek(Duration),
    Prompt(Segment),
    ClearPrompt,
}

/// Decides what to do as the playhead moves through tagged segments.
#[derive(Debug, Clone)]
pub struct SegmentSkipMonitor {
    segments: Vec<(Segment, SegmentPolicy)>,
    state: MonitorState,
}

impl SegmentSkipMonitor {
    pub fn new(
        segments: impl IntoIterator<Item = Segment>,
        policies: &SegmentPolicies,
        min_duration: Duration,
    ) -> Self {
        let mut segments: Vec<_> = segments
            .into_iter()
            .filter(|segment| segment.duration() >= min_duration)
            .map(|segment| (segment, policies.policy_for(segment.kind)))
            .filter(|(_, policy)| *policy != SegmentPolicy::Ignore)
            .collect();
        segments.sort_by_key(|(segment, _)| segment.start);

        let state = if segments.is_empty() {
            MonitorState::Idle
        } else {
            MonitorState::Watching
        };
        Self { segments, state }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == MonitorState::Idle
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn on_position(&mut self, position: Duration) -> SkipAction {
        match self.state {
            MonitorState::Idle => SkipAction::None,
            MonitorState::Skipped(segment) if segment.contains(position) => {
                SkipAction::None
            }
            MonitorState::InSegment(segment) if segment.contains(position) => {
                SkipAction::None
            }
            MonitorState::InSegment(_) => {
                self.state = MonitorState::Watching;
                match self.evaluate(position) {
                    SkipAction::None => SkipAction::ClearPrompt,
                    action => action,
                }
            }
            MonitorState::Skipped(_) | MonitorState::Watching => {
                self.state = MonitorState::Watching;
                self.evaluate(position)
            }
        }
    }

    /// User accepted the prompt; returns where to seek.
    pub fn accept(&mut self) -> Option<Duration> {
        match self.state {
            MonitorState::InSegment(segment) => {
                self.state = MonitorState::Skipped(segment);
                Some(segment.end)
            }
            _ => None,
        }
    }

    /// User dismissed the prompt; it does not come back for this segment
    /// until playback leaves and re-enters it.
    pub fn dismiss(&mut self) -> bool {
        match self.state {
            MonitorState::InSegment(segment) => {
                self.state = MonitorState::Skipped(segment);
                true
            }
            _ => false,
        }
    }

    fn evaluate(&mut self, position: Duration) -> SkipAction {
        let Some((segment, policy)) = self
            .segments
            .iter()
            .find(|(segment, _)| segment.contains(position))
            .copied()
        else {
            return SkipAction::None;
        };

        match policy {
            SegmentPolicy::AutoSkip => {
                self.state = MonitorState::Skipped(segment);
                SkipAction::Seek(segment.end)
            }
            SegmentPolicy::AskToSkip => {
                self.state = MonitorState::InSegment(segment);
                SkipAction::Prompt(segment)
            }
            SegmentPolicy::Ignore => SkipAction::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playhead_model::SegmentKind;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn commercial_then_intro() -> SegmentSkipMonitor {
        SegmentSkipMonitor::new(
            [
                Segment::from_millis(SegmentKind::Intro, 30_000, 60_000).unwrap(),
                Segment::from_millis(SegmentKind::Commercial, 10_000, 15_000)
                    .unwrap(),
            ],
            &SegmentPolicies::default(),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn auto_skip_seeks_once() {
        let mut monitor = commercial_then_intro();
        assert_eq!(monitor.on_position(ms(9_500)), SkipAction::None);
        assert_eq!(monitor.on_position(ms(10_000)), SkipAction::Seek(ms(15_000)));

        // player has not caught up with the seek yet
        assert_eq!(monitor.on_position(ms(10_500)), SkipAction::None);
        for position in (15_000..16_000).step_by(100) {
            assert_eq!(monitor.on_position(ms(position)), SkipAction::None);
        }
    }

    #[test]
    fn ask_to_skip_prompts_until_answered() {
        let mut monitor = commercial_then_intro();
        let intro = Segment::from_millis(SegmentKind::Intro, 30_000, 60_000).unwrap();

        assert_eq!(monitor.on_position(ms(31_000)), SkipAction::Prompt(intro));
        assert_eq!(monitor.on_position(ms(32_000)), SkipAction::None);
        assert_eq!(monitor.accept(), Some(ms(60_000)));
        assert_eq!(monitor.accept(), None);
        assert_eq!(monitor.on_position(ms(60_000)), SkipAction::None);
    }

    #[test]
    fn leaving_a_prompted_segment_clears_it() {
        let mut monitor = commercial_then_intro();
        monitor.on_position(ms(31_000));
        assert_eq!(monitor.on_position(ms(61_000)), SkipAction::ClearPrompt);
        assert_eq!(monitor.state(), MonitorState::Watching);
    }

    #[test]
    fn dismissed_prompt_returns_after_re_entry() {
        let mut monitor = commercial_then_intro();
        let intro = Segment::from_millis(SegmentKind::Intro, 30_000, 60_000).unwrap();
        monitor.on_position(ms(31_000));
        assert!(monitor.dismiss());
        assert_eq!(monitor.on_position(ms(40_000)), SkipAction::None);

        // user seeks back before the intro and plays into it again
        assert_eq!(monitor.on_position(ms(20_000)), SkipAction::None);
        assert_eq!(monitor.on_position(ms(30_500)), SkipAction::Prompt(intro));
    }

    #[test]
    fn short_and_ignored_segments_are_dropped() {
        let monitor = SegmentSkipMonitor::new(
            [
                Segment::from_millis(SegmentKind::Intro, 0, 500).unwrap(),
                Segment::from_millis(SegmentKind::Recap, 1_000, 90_000).unwrap(),
            ],
            &SegmentPolicies::default(),
            Duration::from_secs(1),
        );
        assert!(monitor.is_idle());
        assert!(monitor.is_empty());
    }
}
