use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use crate::error::ModelError;

/// Semantic tag of a time region within an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SegmentKind {
    Intro,
    Outro,
    Recap,
    Preview,
    Commercial,
}

impl SegmentKind {
    pub const ALL: [Self; 5] = [
        Self::Intro,
        Self::Outro,
        Self::Recap,
        Self::Preview,
        Self::Commercial,
    ];
}

impl Display for SegmentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SegmentKind::Intro => write!(f, "Intro"),
            SegmentKind::Outro => write!(f, "Outro"),
            SegmentKind::Recap => write!(f, "Recap"),
            SegmentKind::Preview => write!(f, "Preview"),
            SegmentKind::Commercial => write!(f, "Commercial"),
        }
    }
}

/// A tagged half-open region `[start, end)` of an item's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    pub kind: SegmentKind,
    pub start: Duration,
    pub end: Duration,
}

impl Segment {
    pub fn new(
        kind: SegmentKind,
        start: Duration,
        end: Duration,
    ) -> Result<Self, ModelError> {
        if end <= start {
            return Err(ModelError::InvalidSegment(format!(
                "{kind} segment ends ({end:?}) before it starts ({start:?})"
            )));
        }
        Ok(Self { kind, start, end })
    }

    pub fn from_millis(
        kind: SegmentKind,
        start_ms: u64,
        end_ms: u64,
    ) -> Result<Self, ModelError> {
        Self::new(
            kind,
            Duration::from_millis(start_ms),
            Duration::from_millis(end_ms),
        )
    }

    pub fn contains(&self, position: Duration) -> bool {
        position >= self.start && position < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }
}

/// What to do when playback enters a segment of a given kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SegmentPolicy {
    #[default]
    Ignore,
    AskToSkip,
    AutoSkip,
}

/// Per-kind skip policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SegmentPolicies {
    pub intro: SegmentPolicy,
    pub outro: SegmentPolicy,
    pub recap: SegmentPolicy,
    pub preview: SegmentPolicy,
    pub commercial: SegmentPolicy,
}

impl Default for SegmentPolicies {
    fn default() -> Self {
        Self {
            intro: SegmentPolicy::AskToSkip,
            outro: SegmentPolicy::AskToSkip,
            recap: SegmentPolicy::Ignore,
            preview: SegmentPolicy::Ignore,
            commercial: SegmentPolicy::AutoSkip,
        }
    }
}

impl SegmentPolicies {
    /// Every kind ignored.
    pub fn disabled() -> Self {
        Self {
            intro: SegmentPolicy::Ignore,
            outro: SegmentPolicy::Ignore,
            recap: SegmentPolicy::Ignore,
            preview: SegmentPolicy::Ignore,
            commercial: SegmentPolicy::Ignore,
        }
    }

    pub fn policy_for(&self, kind: SegmentKind) -> SegmentPolicy {
        match kind {
            SegmentKind::Intro => self.intro,
            SegmentKind::Outro => self.outro,
            SegmentKind::Recap => self.recap,
            SegmentKind::Preview => self.preview,
            SegmentKind::Commercial => self.commercial,
        }
    }

    pub fn set(&mut self, kind: SegmentKind, policy: SegmentPolicy) {
        let slot = match kind {
            SegmentKind::Intro => &mut self.intro,
            SegmentKind::Outro => &mut self.outro,
            SegmentKind::Recap => &mut self.recap,
            SegmentKind::Preview => &mut self.preview,
            SegmentKind::Commercial => &mut self.commercial,
        };
        *slot = policy;
    }

    pub fn with(mut self, kind: SegmentKind, policy: SegmentPolicy) -> Self {
        self.set(kind, policy);
        self
    }

    pub fn is_ignored(&self, kind: SegmentKind) -> bool {
        self.policy_for(kind) == SegmentPolicy::Ignore
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let segment =
            Segment::from_millis(SegmentKind::Intro, 10_000, 15_000).unwrap();
        assert!(!segment.contains(Duration::from_millis(9_999)));
        assert!(segment.contains(Duration::from_millis(10_000)));
        assert!(segment.contains(Duration::from_millis(14_999)));
        assert!(!segment.contains(Duration::from_millis(15_000)));
    }

    #[test]
    fn inverted_segments_are_rejected() {
        assert!(Segment::from_millis(SegmentKind::Recap, 5_000, 5_000).is_err());
    }

    #[test]
    fn policy_table_updates() {
        let policies = SegmentPolicies::disabled()
            .with(SegmentKind::Outro, SegmentPolicy::AutoSkip);
        assert!(policies.is_ignored(SegmentKind::Intro));
        assert_eq!(
            policies.policy_for(SegmentKind::Outro),
            SegmentPolicy::AutoSkip
        );
    }
}
