use chrono::NaiveDate;

pub const DEFAULT_STRENGTH: f32 = 1.0;

/// Exponential forgetting curve: recall probability after `days_since_review` days.
///
/// The decay rate is `strength / ease_factor`, so a larger ease factor or a
/// smaller strength flattens the curve.
pub fn estimate_retention(days_since_review: f32, ease_factor: f32, strength: f32) -> f32 {
    debug_assert!(days_since_review >= 0.0);
    let decay_factor = (1.0 / ease_factor.max(f32::MIN_POSITIVE)) * strength;
    (-days_since_review.max(0.0) * decay_factor)
        .exp()
        .clamp(0.0, 1.0)
}

/// Calendar form of [`estimate_retention`].
///
/// Dates before the last review count as zero elapsed days.
pub fn estimate_retention_on(
    last_review: NaiveDate,
    on: NaiveDate,
    ease_factor: f32,
    strength: f32,
) -> f32 {
    let elapsed = (on - last_review).num_days().max(0);
    estimate_retention(elapsed as f32, ease_factor, strength)
}
