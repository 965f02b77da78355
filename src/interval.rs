use serde::{Deserialize, Serialize};

pub const MIN_EASE_FACTOR: f32 = 1.3;
pub const DEFAULT_EASE_FACTOR: f32 = 2.5;
pub const DEFAULT_DIFFICULTY: f32 = 5.0;
pub(crate) const MAX_QUALITY: f32 = 5.0;
pub(crate) const PASSING_QUALITY: f32 = 3.0;

/// Result of one SM-2 step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalOutcome {
    /// Days until the next review, never below 1.
    pub next_interval: u32,
    pub new_ease_factor: f32,
    /// Quality on the 0-100 display scale.
    pub quality: u32,
}

/// Raw 0-5 quality of a review given its retention signal and the content difficulty.
pub fn review_quality(retention_rate: f32, content_difficulty: f32) -> f32 {
    let retention_rate = retention_rate.clamp(0.0, 1.0);
    (retention_rate * MAX_QUALITY - (MAX_QUALITY - content_difficulty)).clamp(0.0, MAX_QUALITY)
}

/// SM-2 ease update for a 0-5 quality, floored at [`MIN_EASE_FACTOR`].
pub fn next_ease_factor(ease_factor: f32, quality: f32) -> f32 {
    let miss = MAX_QUALITY - quality.clamp(0.0, MAX_QUALITY);
    (ease_factor + 0.1 - miss * (0.08 + miss * 0.02)).max(MIN_EASE_FACTOR)
}

/// Computes the next review interval and ease factor.
///
/// A failed review (quality below 3) resets the interval to a single day.
/// Successful reviews walk the fixed 1 -> 3 -> 7 ladder and then grow
/// geometrically by the current ease factor.
pub fn calculate_intervals(
    retention_rate: f32,
    content_difficulty: f32,
    previous_interval: u32,
    ease_factor: f32,
) -> IntervalOutcome {
    let quality = review_quality(retention_rate, content_difficulty);
    let previous_interval = previous_interval.max(1);

    let next_interval = if quality < PASSING_QUALITY {
        1
    } else {
        match previous_interval {
            1 => 3,
            3 => 7,
            ivl => (ivl as f32 * ease_factor).round().max(1.0) as u32,
        }
    };

    IntervalOutcome {
        next_interval,
        new_ease_factor: next_ease_factor(ease_factor, quality),
        quality: (quality * 20.0).round() as u32,
    }
}
