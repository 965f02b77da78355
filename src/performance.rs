use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use chrono::{Days, NaiveDate};
use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::Result;
use crate::interval::DEFAULT_DIFFICULTY;

/// Score at which a difficulty-5 review reaches quality 3.
pub const PASSING_SCORE: f32 = 60.0;
pub const DEFAULT_TREND_WINDOW_DAYS: u32 = 30;

const RATE_TREND_THRESHOLD: f32 = 0.05;
const VELOCITY_TREND_THRESHOLD: f32 = 0.1;

fn default_difficulty() -> f32 {
    DEFAULT_DIFFICULTY
}

// `null` reads the same as an absent field.
pub(crate) fn lenient_difficulty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<f32, D::Error> {
    let difficulty = Option::<f32>::deserialize(deserializer)?;
    Ok(difficulty.unwrap_or(DEFAULT_DIFFICULTY))
}

/// One completed review in a learner's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub topic_id: String,
    pub reviewed_on: NaiveDate,
    /// 0-100
    pub score: f32,
    #[serde(default = "default_difficulty", deserialize_with = "lenient_difficulty")]
    pub difficulty: f32,
}

impl ReviewRecord {
    pub fn passed(&self) -> bool {
        self.score >= PASSING_SCORE
    }
}

/// Source of raw review history, owned by the host application.
///
/// A learner with no recorded reviews is an empty history, not an error.
pub trait ReviewHistory {
    fn reviews(&self, learner_id: &str) -> Result<Vec<ReviewRecord>>;
}

impl<T: ReviewHistory + ?Sized> ReviewHistory for &T {
    fn reviews(&self, learner_id: &str) -> Result<Vec<ReviewRecord>> {
        (**self).reviews(learner_id)
    }
}

impl<S: BuildHasher> ReviewHistory for HashMap<String, Vec<ReviewRecord>, S> {
    fn reviews(&self, learner_id: &str) -> Result<Vec<ReviewRecord>> {
        Ok(self.get(learner_id).cloned().unwrap_or_default())
    }
}

impl ReviewHistory for BTreeMap<String, Vec<ReviewRecord>> {
    fn reviews(&self, learner_id: &str) -> Result<Vec<ReviewRecord>> {
        Ok(self.get(learner_id).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSnapshot {
    pub retention_rate: f32,
    pub average_difficulty: f32,
    /// Distinct topics passed per week.
    pub learning_velocity: f32,
    pub consistency_score: f32,
}

impl Default for PerformanceSnapshot {
    fn default() -> Self {
        Self {
            retention_rate: 0.7,
            average_difficulty: DEFAULT_DIFFICULTY,
            learning_velocity: 0.0,
            consistency_score: 0.0,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Trend {
    Improving,
    #[default]
    Stable,
    Declining,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VelocityTrend {
    Accelerating,
    #[default]
    Steady,
    Decelerating,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSnapshot {
    pub retention_trend: Trend,
    pub velocity_trend: VelocityTrend,
    pub consistency_trend: Trend,
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy)]
struct Window {
    start: NaiveDate,
    end: NaiveDate,
}

impl Window {
    fn ending_on(end: NaiveDate, days: u32) -> Self {
        let start = end
            .checked_sub_days(Days::new(days.saturating_sub(1) as u64))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    fn len_days(&self) -> f32 {
        ((self.end - self.start).num_days() + 1).max(1) as f32
    }

    fn contains(&self, date: NaiveDate) -> bool {
        (self.start..=self.end).contains(&date)
    }
}

fn retention_rate(reviews: &[&ReviewRecord]) -> Option<f32> {
    if reviews.is_empty() {
        return None;
    }
    let passed = reviews.iter().filter(|r| r.passed()).count();
    Some(passed as f32 / reviews.len() as f32)
}

fn learning_velocity(reviews: &[&ReviewRecord], window: Window, min_days: f32) -> f32 {
    let topics = reviews
        .iter()
        .filter(|r| r.passed())
        .map(|r| r.topic_id.as_str())
        .unique()
        .count();
    topics as f32 * 7.0 / window.len_days().max(min_days)
}

fn consistency_score(reviews: &[&ReviewRecord], window: Window) -> f32 {
    let active_days = reviews.iter().map(|r| r.reviewed_on).unique().count();
    (active_days as f32 / window.len_days()).clamp(0.0, 1.0)
}

fn within<'a>(reviews: &'a [ReviewRecord], window: Window) -> Vec<&'a ReviewRecord> {
    reviews
        .iter()
        .filter(|r| window.contains(r.reviewed_on))
        .collect()
}

/// Summarizes everything reviewed up to `today`.
///
/// Retention and difficulty use the whole history. Velocity and consistency
/// look at the trailing [`DEFAULT_TREND_WINDOW_DAYS`], starting no earlier
/// than the learner's first review.
pub fn performance_snapshot(reviews: &[ReviewRecord], today: NaiveDate) -> PerformanceSnapshot {
    let past = reviews
        .iter()
        .filter(|r| r.reviewed_on <= today)
        .collect_vec();
    let Some(first_review) = past.iter().map(|r| r.reviewed_on).min() else {
        return PerformanceSnapshot::default();
    };

    let mut window = Window::ending_on(today, DEFAULT_TREND_WINDOW_DAYS);
    window.start = window.start.max(first_review);
    let recent = past
        .iter()
        .copied()
        .filter(|r| window.contains(r.reviewed_on))
        .collect_vec();

    PerformanceSnapshot {
        retention_rate: retention_rate(&past).unwrap_or_default(),
        average_difficulty: past.iter().map(|r| r.difficulty).sum::<f32>() / past.len() as f32,
        learning_velocity: learning_velocity(&recent, window, 7.0),
        consistency_score: consistency_score(&recent, window),
    }
}

fn classify(older: f32, newer: f32, threshold: f32) -> Trend {
    if newer - older > threshold {
        Trend::Improving
    } else if older - newer > threshold {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

fn classify_velocity(older: f32, newer: f32) -> VelocityTrend {
    if older <= 0.0 {
        return if newer > 0.0 {
            VelocityTrend::Accelerating
        } else {
            VelocityTrend::Steady
        };
    }
    match classify(1.0, newer / older, VELOCITY_TREND_THRESHOLD) {
        Trend::Improving => VelocityTrend::Accelerating,
        Trend::Stable => VelocityTrend::Steady,
        Trend::Declining => VelocityTrend::Decelerating,
    }
}

/// Compares the older and newer halves of the `window_days` ending on `today`.
///
/// A half with no reviews gives no signal, so every trend stays neutral.
pub fn performance_trends(
    reviews: &[ReviewRecord],
    today: NaiveDate,
    window_days: u32,
) -> TrendSnapshot {
    if window_days < 2 {
        return TrendSnapshot::default();
    }
    let newer_window = Window::ending_on(today, window_days / 2);
    let older_window = Window::ending_on(
        newer_window.start.pred_opt().unwrap_or(NaiveDate::MIN),
        window_days - window_days / 2,
    );
    let older = within(reviews, older_window);
    let newer = within(reviews, newer_window);

    let (Some(older_retention), Some(newer_retention)) =
        (retention_rate(&older), retention_rate(&newer))
    else {
        return TrendSnapshot::default();
    };

    TrendSnapshot {
        retention_trend: classify(older_retention, newer_retention, RATE_TREND_THRESHOLD),
        velocity_trend: classify_velocity(
            learning_velocity(&older, older_window, 0.0),
            learning_velocity(&newer, newer_window, 0.0),
        ),
        consistency_trend: classify(
            consistency_score(&older, older_window),
            consistency_score(&newer, newer_window),
            RATE_TREND_THRESHOLD,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestHelper;
    use std::str::FromStr;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn review(topic: &str, d: u32, score: f32) -> ReviewRecord {
        ReviewRecord {
            topic_id: topic.to_string(),
            reviewed_on: day(d),
            score,
            difficulty: 5.0,
        }
    }

    fn fixture_history() -> Vec<ReviewRecord> {
        let mut reader = csv::Reader::from_path("tests/data/history.csv").unwrap();
        reader
            .deserialize::<ReviewRecord>()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_empty_history() {
        let snapshot = performance_snapshot(&[], day(10));
        assert_eq!(snapshot, PerformanceSnapshot::default());
        let trends = performance_trends(&[], day(10), 30);
        assert_eq!(trends, TrendSnapshot::default());
    }

    #[test]
    fn test_snapshot() {
        let reviews = vec![
            review("a", 1, 90.0),
            review("b", 2, 40.0),
            review("a", 3, 80.0),
            ReviewRecord {
                difficulty: 9.0,
                ..review("c", 7, 70.0)
            },
        ];
        let snapshot = performance_snapshot(&reviews, day(7));
        [
            snapshot.retention_rate,
            snapshot.average_difficulty,
            snapshot.learning_velocity,
            snapshot.consistency_score,
        ]
        .assert_approx_eq([0.75, 6.0, 2.0, 4.0 / 7.0]);
    }

    #[test]
    fn test_future_reviews_ignored() {
        let reviews = vec![review("a", 1, 90.0), review("b", 20, 10.0)];
        let snapshot = performance_snapshot(&reviews, day(5));
        assert_eq!(snapshot.retention_rate, 1.0);
    }

    #[test]
    fn test_more_passing_reviews_never_lower_retention() {
        let mut reviews = vec![review("a", 1, 30.0), review("b", 2, 70.0)];
        let mut last = performance_snapshot(&reviews, day(10)).retention_rate;
        for d in 3..10 {
            reviews.push(review("c", d, 85.0));
            let current = performance_snapshot(&reviews, day(10)).retention_rate;
            assert!(current >= last);
            last = current;
        }
    }

    #[test]
    fn test_improving_trend() {
        // older half: May 1-15, newer half: May 16-30
        let mut reviews = vec![
            review("a", 2, 30.0),
            review("b", 5, 40.0),
            review("c", 9, 70.0),
        ];
        reviews.extend((16..=30).map(|d| review(&format!("t{d}"), d, 90.0)));
        let trends = performance_trends(&reviews, day(30), 30);
        assert_eq!(
            trends,
            TrendSnapshot {
                retention_trend: Trend::Improving,
                velocity_trend: VelocityTrend::Accelerating,
                consistency_trend: Trend::Improving,
            }
        );
    }

    #[test]
    fn test_declining_trend() {
        let mut reviews = (1..=15)
            .map(|d| review(&format!("t{d}"), d, 95.0))
            .collect_vec();
        reviews.push(review("x", 20, 20.0));
        reviews.push(review("y", 25, 30.0));
        let trends = performance_trends(&reviews, day(30), 30);
        assert_eq!(trends.retention_trend, Trend::Declining);
        assert_eq!(trends.velocity_trend, VelocityTrend::Decelerating);
        assert_eq!(trends.consistency_trend, Trend::Declining);
    }

    #[test]
    fn test_half_without_reviews_is_stable() {
        let reviews = (16..=30).map(|d| review("a", d, 90.0)).collect_vec();
        assert_eq!(
            performance_trends(&reviews, day(30), 30),
            TrendSnapshot::default()
        );
        assert_eq!(
            performance_trends(&reviews, day(30), 1),
            TrendSnapshot::default()
        );
    }

    #[test]
    fn test_fixture_history() {
        let reviews = fixture_history();
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let snapshot = performance_snapshot(&reviews, today);
        assert!((0.0..=1.0).contains(&snapshot.retention_rate));
        assert!((0.0..=1.0).contains(&snapshot.consistency_score));
        let trends = performance_trends(&reviews, today, DEFAULT_TREND_WINDOW_DAYS);
        assert_eq!(trends.retention_trend, Trend::Improving);
    }

    #[test]
    fn test_history_source() {
        let mut histories = HashMap::new();
        histories.insert("ada".to_string(), vec![review("a", 1, 90.0)]);
        assert_eq!(histories.reviews("ada").unwrap().len(), 1);
        assert!(histories.reviews("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_record_difficulty_defaults() {
        let json = r#"{"topicId":"a","reviewedOn":"2024-05-01","score":80,"difficulty":null}"#;
        let record: ReviewRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.difficulty, DEFAULT_DIFFICULTY);
        let json = r#"{"topicId":"a","reviewedOn":"2024-05-01","score":80}"#;
        let record: ReviewRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record, review("a", 1, 80.0));
    }

    #[test]
    fn test_trend_names() {
        assert_eq!(Trend::Improving.to_string(), "improving");
        assert_eq!(
            VelocityTrend::from_str("decelerating").unwrap(),
            VelocityTrend::Decelerating
        );
        assert_eq!(
            serde_json::to_string(&TrendSnapshot::default()).unwrap(),
            r#"{"retentionTrend":"stable","velocityTrend":"steady","consistencyTrend":"stable"}"#
        );
    }
}
