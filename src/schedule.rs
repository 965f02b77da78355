use chrono::{Days, NaiveDate};
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::interval::{DEFAULT_DIFFICULTY, calculate_intervals};
use crate::performance::{PerformanceSnapshot, Trend, TrendSnapshot, lenient_difficulty};

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
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ContentType {
    Formula,
    Timeline,
    Definition,
    #[default]
    Concept,
    Narrative,
    List,
}

impl ContentType {
    /// Unknown names fall back to [`ContentType::Concept`].
    pub fn parse_lenient(name: &str) -> Self {
        name.trim().parse().unwrap_or_default()
    }

    /// Stretch applied to the short-term tier offsets.
    pub fn multiplier(self) -> f32 {
        match self {
            Self::Formula => 1.5,
            Self::Timeline => 1.2,
            Self::Definition => 1.3,
            Self::Concept => 1.0,
            Self::Narrative => 0.8,
            Self::List => 1.4,
        }
    }
}

fn lenient_content_type<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<ContentType, D::Error> {
    let name = Option::<String>::deserialize(deserializer)?;
    Ok(name.map(|n| ContentType::parse_lenient(&n)).unwrap_or_default())
}

fn default_difficulty() -> f32 {
    DEFAULT_DIFFICULTY
}

/// A topic or session to be scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub title: String,
    /// Nominally 0-10.
    #[serde(default = "default_difficulty", deserialize_with = "lenient_difficulty")]
    pub difficulty: f32,
    #[serde(default, deserialize_with = "lenient_content_type")]
    pub content_type: ContentType,
}

impl Topic {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            difficulty: DEFAULT_DIFFICULTY,
            content_type: ContentType::default(),
        }
    }

    pub fn with_difficulty(mut self, difficulty: f32) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub(crate) fn effective_difficulty(&self) -> f32 {
        if self.difficulty.is_finite() {
            self.difficulty
        } else {
            DEFAULT_DIFFICULTY
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tier {
    Immediate,
    ShortTerm,
    LongTerm,
    Mastery,
}

impl Tier {
    pub fn priority(self) -> Priority {
        match self {
            Self::Immediate => Priority::High,
            Self::ShortTerm | Self::LongTerm => Priority::Medium,
            Self::Mastery => Priority::Low,
        }
    }

    pub fn duration_minutes(self) -> u32 {
        match self {
            Self::Immediate => 15,
            Self::ShortTerm => 20,
            Self::LongTerm => 25,
            Self::Mastery => 30,
        }
    }

    fn base_offsets(self) -> &'static [u32] {
        match self {
            Self::Immediate => &[1],
            Self::ShortTerm => &[3, 7],
            Self::LongTerm => &[14, 21, 30],
            Self::Mastery => &[60, 90, 180],
        }
    }
}

/// Tightening applied to short-term offsets for a retention trend.
pub fn short_term_trend_factor(trend: Trend) -> f32 {
    match trend {
        Trend::Improving => 0.9,
        Trend::Stable | Trend::Declining => 1.0,
    }
}

// Products like 3 * 1.2 land a hair above an integer in f32.
fn ceil_days(days: f32) -> u32 {
    (days - 1e-4).ceil().max(1.0) as u32
}

/// Day offsets from today for one tier.
///
/// Only the short-term tier reacts to content type and retention trend.
pub fn tier_offsets(tier: Tier, content_type: ContentType, retention_trend: Trend) -> Vec<u32> {
    let offsets = tier.base_offsets().iter().copied();
    match tier {
        Tier::ShortTerm => {
            let factor = content_type.multiplier() * short_term_trend_factor(retention_trend);
            offsets.map(|d| ceil_days(d as f32 * factor)).collect()
        }
        _ => offsets.collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub topic_id: String,
    pub topic_name: String,
    pub tier: Tier,
    pub scheduled_date: NaiveDate,
    pub priority: Priority,
    pub duration_minutes: u32,
}

impl ReviewItem {
    pub fn new(topic: &Topic, tier: Tier, scheduled_date: NaiveDate) -> Self {
        Self {
            topic_id: topic.id.clone(),
            topic_name: topic.title.clone(),
            tier,
            scheduled_date,
            priority: tier.priority(),
            duration_minutes: tier.duration_minutes(),
        }
    }
}

/// Interval calculator output for a topic before tiering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicBaseline {
    pub topic_id: String,
    pub interval: u32,
    pub ease_factor: f32,
    pub quality: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleTiers {
    pub immediate: Vec<ReviewItem>,
    pub short_term: Vec<ReviewItem>,
    pub long_term: Vec<ReviewItem>,
    pub mastery: Vec<ReviewItem>,
}

impl ScheduleTiers {
    pub fn get(&self, tier: Tier) -> &[ReviewItem] {
        match tier {
            Tier::Immediate => &self.immediate,
            Tier::ShortTerm => &self.short_term,
            Tier::LongTerm => &self.long_term,
            Tier::Mastery => &self.mastery,
        }
    }

    fn get_mut(&mut self, tier: Tier) -> &mut Vec<ReviewItem> {
        match tier {
            Tier::Immediate => &mut self.immediate,
            Tier::ShortTerm => &mut self.short_term,
            Tier::LongTerm => &mut self.long_term,
            Tier::Mastery => &mut self.mastery,
        }
    }

    pub fn push(&mut self, item: ReviewItem) {
        self.get_mut(item.tier).push(item);
    }

    /// All items, tier by tier.
    pub fn iter(&self) -> impl Iterator<Item = &ReviewItem> {
        Tier::iter().flat_map(move |tier| self.get(tier).iter())
    }

    pub fn len(&self) -> usize {
        Tier::iter().map(|tier| self.get(tier).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<ReviewItem> for ScheduleTiers {
    fn from_iter<I: IntoIterator<Item = ReviewItem>>(iter: I) -> Self {
        let mut tiers = Self::default();
        iter.into_iter().for_each(|item| tiers.push(item));
        tiers
    }
}

/// How `estimated_completion_days` is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionHorizon {
    /// Days from today to the last scheduled review.
    #[default]
    Projected,
    /// A constant, whatever the schedule holds.
    Fixed(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub tiers: ScheduleTiers,
    pub total_items: usize,
    pub estimated_completion_days: u32,
    pub baselines: Vec<TopicBaseline>,
}

impl Schedule {
    pub fn assemble(
        items: Vec<ReviewItem>,
        baselines: Vec<TopicBaseline>,
        today: NaiveDate,
        horizon: CompletionHorizon,
    ) -> Self {
        let estimated_completion_days = match horizon {
            CompletionHorizon::Fixed(days) => days,
            CompletionHorizon::Projected => items
                .iter()
                .map(|item| (item.scheduled_date - today).num_days())
                .max()
                .unwrap_or_default()
                .max(0) as u32,
        };
        let tiers: ScheduleTiers = items.into_iter().collect();
        Self {
            total_items: tiers.len(),
            tiers,
            estimated_completion_days,
            baselines,
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &ReviewItem> {
        self.tiers.iter()
    }
}

fn add_days(today: NaiveDate, offset: u32) -> NaiveDate {
    today
        .checked_add_days(Days::new(offset as u64))
        .unwrap_or(NaiveDate::MAX)
}

/// Expands topics into dated review items, before load balancing.
pub fn build_review_items(
    topics: &[Topic],
    snapshot: &PerformanceSnapshot,
    trends: &TrendSnapshot,
    today: NaiveDate,
    initial_ease_factor: f32,
) -> (Vec<ReviewItem>, Vec<TopicBaseline>) {
    let baselines = topics
        .iter()
        .map(|topic| {
            let outcome = calculate_intervals(
                snapshot.retention_rate,
                topic.effective_difficulty(),
                1,
                initial_ease_factor,
            );
            debug!(
                "baseline for {}: interval {} ease {:.3} quality {}",
                topic.id, outcome.next_interval, outcome.new_ease_factor, outcome.quality
            );
            TopicBaseline {
                topic_id: topic.id.clone(),
                interval: outcome.next_interval,
                ease_factor: outcome.new_ease_factor,
                quality: outcome.quality,
            }
        })
        .collect_vec();

    let items = topics
        .iter()
        .flat_map(|topic| {
            Tier::iter().flat_map(move |tier| {
                tier_offsets(tier, topic.content_type, trends.retention_trend)
                    .into_iter()
                    .map(move |offset| ReviewItem::new(topic, tier, add_days(today, offset)))
            })
        })
        .collect_vec();

    (items, baselines)
}
