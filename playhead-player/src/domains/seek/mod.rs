//! Remote-control seek acceleration.
//!
//! Holding a seek key produces a stream of repeats; the longer the hold and
//! the longer the item, the larger each step becomes.

use std::time::Duration;

use playhead_config::SeekConfig;

/// One duration bucket: items shorter than `max_minutes` use `steps`.
struct Bucket {
    max_minutes: Option<u64>,
    /// `(min_repeat_count, multiplier)` in ascending order; the last entry is
    /// the ceiling.
    steps: &'static [(u32, u32)],
}

const BUCKETS: &[Bucket] = &[
    Bucket {
        max_minutes: Some(30),
        steps: &[(0, 1), (30, 2), (60, 3)],
    },
    Bucket {
        max_minutes: Some(90),
        steps: &[(0, 1), (20, 2), (40, 3), (60, 4), (80, 5)],
    },
    Bucket {
        max_minutes: Some(150),
        steps: &[(0, 1), (15, 2), (30, 4), (45, 6), (60, 8)],
    },
    Bucket {
        max_minutes: None,
        steps: &[
            (0, 1),
            (10, 2),
            (20, 3),
            (30, 4),
            (40, 6),
            (50, 8),
            (60, 10),
        ],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekDirection {
    Forward,
    Backward,
}

/// Pure lookup table from (repeat count, item duration) to a step multiplier.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeekAccelerationProfile;

impl SeekAccelerationProfile {
    /// Multiplier for the `repeat_count`-th repeat of a held seek key.
    ///
    /// Always at least 1 and non-decreasing in `repeat_count` for a fixed
    /// duration. Unknown durations use the shortest bucket.
    pub fn multiplier(repeat_count: u32, duration: Option<Duration>) -> u32 {
        let bucket = Self::bucket_for(duration);
        bucket
            .steps
            .iter()
            .rev()
            .find(|(threshold, _)| repeat_count >= *threshold)
            .map(|(_, multiplier)| *multiplier)
            .unwrap_or(1)
    }

    /// Step for one key repeat, the configured base step scaled by
    /// [`multiplier`](Self::multiplier).
    pub fn seek_step(
        direction: SeekDirection,
        repeat_count: u32,
        duration: Option<Duration>,
        config: &SeekConfig,
    ) -> Duration {
        let base = match direction {
            SeekDirection::Forward => config.forward_step(),
            SeekDirection::Backward => config.backward_step(),
        };
        base * Self::multiplier(repeat_count, duration)
    }

    /// Target position for one key repeat, clamped to `[0, duration]`.
    pub fn seek_target(
        position: Duration,
        direction: SeekDirection,
        repeat_count: u32,
        duration: Option<Duration>,
        config: &SeekConfig,
    ) -> Duration {
        let step = Self::seek_step(direction, repeat_count, duration, config);
        match direction {
            SeekDirection::Forward => {
                let target = position + step;
                duration.map_or(target, |d| target.min(d))
            }
            SeekDirection::Backward => position.saturating_sub(step),
        }
    }

    fn bucket_for(duration: Option<Duration>) -> &'static Bucket {
        let minutes = duration.map(|d| d.as_secs() / 60).unwrap_or(0);
        BUCKETS
            .iter()
            .find(|bucket| bucket.max_minutes.is_none_or(|max| minutes < max))
            .unwrap_or(&BUCKETS[BUCKETS.len() - 1])
    }
}
