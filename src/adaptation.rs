use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::interval::{DEFAULT_DIFFICULTY, DEFAULT_EASE_FACTOR, calculate_intervals};

/// Result of adapting a topic after one review. The caller persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adaptation {
    pub topic_id: String,
    pub new_interval: u32,
    pub new_ease_factor: f32,
    pub next_review_date: NaiveDate,
    /// 0-100
    pub quality: u32,
}

fn score_to_retention(performance_score: f32) -> f32 {
    if performance_score.is_nan() {
        return 0.0;
    }
    performance_score.clamp(0.0, 100.0) / 100.0
}

/// Recomputes interval and ease after a review scored `performance_score` (0-100).
///
/// Difficulty is fixed at the midpoint and the previous interval at one day,
/// so a pass always lands three days out and a fail one day out.
pub fn adapt_after_review(
    topic_id: &str,
    performance_score: f32,
    current_ease_factor: f32,
    today: NaiveDate,
) -> Adaptation {
    let outcome = calculate_intervals(
        score_to_retention(performance_score),
        DEFAULT_DIFFICULTY,
        1,
        current_ease_factor,
    );
    Adaptation {
        topic_id: topic_id.to_string(),
        new_interval: outcome.next_interval,
        new_ease_factor: outcome.new_ease_factor,
        next_review_date: today
            .checked_add_days(Days::new(outcome.next_interval as u64))
            .unwrap_or(NaiveDate::MAX),
        quality: outcome.quality,
    }
}

/// Per-topic scheduling state threaded through successive reviews.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub interval: u32,
    pub ease_factor: f32,
}

impl Default for ReviewState {
    fn default() -> Self {
        Self {
            interval: 1,
            ease_factor: DEFAULT_EASE_FACTOR,
        }
    }
}

impl ReviewState {
    /// Like [`adapt_after_review`], but keeps climbing from the stored interval.
    pub fn after_review(self, performance_score: f32, difficulty: f32) -> Self {
        let outcome = calculate_intervals(
            score_to_retention(performance_score),
            difficulty,
            self.interval,
            self.ease_factor,
        );
        Self {
            interval: outcome.next_interval,
            ease_factor: outcome.new_ease_factor,
        }
    }

    pub fn next_review_date(&self, reviewed_on: NaiveDate) -> NaiveDate {
        reviewed_on
            .checked_add_days(Days::new(self.interval as u64))
            .unwrap_or(NaiveDate::MAX)
    }
}
