use chrono::NaiveDate;
use log::info;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::adaptation::{Adaptation, adapt_after_review};
use crate::balance::{BalancePolicy, DEFAULT_DAILY_BUDGET_MINUTES, balance_schedule};
use crate::error::{InvalidConfigSnafu, Result};
use crate::interval::{DEFAULT_EASE_FACTOR, MIN_EASE_FACTOR};
use crate::performance::{
    DEFAULT_TREND_WINDOW_DAYS, PerformanceSnapshot, ReviewHistory, TrendSnapshot,
    performance_snapshot, performance_trends,
};
use crate::schedule::{CompletionHorizon, Schedule, Topic, build_review_items};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerConfig {
    pub daily_budget_minutes: u32,
    /// Ease factor for topics that have none persisted yet.
    pub initial_ease_factor: f32,
    /// Lookback used for trend adjustment during schedule generation.
    pub trend_window_days: u32,
    pub balance_policy: BalancePolicy,
    pub horizon: CompletionHorizon,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            daily_budget_minutes: DEFAULT_DAILY_BUDGET_MINUTES,
            initial_ease_factor: DEFAULT_EASE_FACTOR,
            trend_window_days: DEFAULT_TREND_WINDOW_DAYS,
            balance_policy: BalancePolicy::default(),
            horizon: CompletionHorizon::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.daily_budget_minutes == 0 {
            return InvalidConfigSnafu {
                reason: "daily budget must be positive",
            }
            .fail();
        }
        if !self.initial_ease_factor.is_finite() || self.initial_ease_factor < MIN_EASE_FACTOR {
            return InvalidConfigSnafu {
                reason: "initial ease factor is below the 1.3 floor",
            }
            .fail();
        }
        if self.trend_window_days == 0 {
            return InvalidConfigSnafu {
                reason: "trend window must span at least one day",
            }
            .fail();
        }
        Ok(())
    }
}

/// One learner's schedule request for [`Scheduler::generate_schedules`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub learner_id: String,
    pub topics: Vec<Topic>,
}

/// Entry point tying the calculators to a host-owned review history.
///
/// The scheduler keeps no per-learner state: ease factors and intervals are
/// passed in and handed back, and every call reads the history afresh.
#[derive(Debug, Clone)]
pub struct Scheduler<H> {
    history: H,
    config: SchedulerConfig,
}

impl<H: ReviewHistory> Scheduler<H> {
    pub fn new(history: H, config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { history, config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn performance_snapshot(
        &self,
        learner_id: &str,
        today: NaiveDate,
    ) -> Result<PerformanceSnapshot> {
        let reviews = self.history.reviews(learner_id)?;
        Ok(performance_snapshot(&reviews, today))
    }

    pub fn performance_trends(
        &self,
        learner_id: &str,
        window_days: u32,
        today: NaiveDate,
    ) -> Result<TrendSnapshot> {
        let reviews = self.history.reviews(learner_id)?;
        Ok(performance_trends(&reviews, today, window_days))
    }

    /// Builds the tiered, load-balanced review calendar for `topics`.
    pub fn generate_schedule(
        &self,
        learner_id: &str,
        topics: &[Topic],
        today: NaiveDate,
    ) -> Result<Schedule> {
        let reviews = self.history.reviews(learner_id)?;
        let snapshot = performance_snapshot(&reviews, today);
        let trends = performance_trends(&reviews, today, self.config.trend_window_days);

        let (items, baselines) = build_review_items(
            topics,
            &snapshot,
            &trends,
            today,
            self.config.initial_ease_factor,
        );
        let items = balance_schedule(
            items,
            self.config.daily_budget_minutes,
            self.config.balance_policy,
        );
        let schedule = Schedule::assemble(items, baselines, today, self.config.horizon);

        info!(
            "schedule for {learner_id}: {} topics, {} items, horizon {} days, retention trend {}",
            topics.len(),
            schedule.total_items,
            schedule.estimated_completion_days,
            trends.retention_trend
        );
        Ok(schedule)
    }

    /// Next interval, ease and date for a topic after one review.
    ///
    /// `current_ease_factor` falls back to the configured initial ease.
    pub fn adapt_after_review(
        &self,
        learner_id: &str,
        topic_id: &str,
        performance_score: f32,
        current_ease_factor: Option<f32>,
        today: NaiveDate,
    ) -> Adaptation {
        let ease = current_ease_factor.unwrap_or(self.config.initial_ease_factor);
        let adaptation = adapt_after_review(topic_id, performance_score, ease, today);
        info!(
            "adapted {topic_id} for {learner_id}: interval {}, ease {:.3}, next {}",
            adaptation.new_interval, adaptation.new_ease_factor, adaptation.next_review_date
        );
        adaptation
    }
}

impl<H: ReviewHistory + Sync> Scheduler<H> {
    /// Generates schedules for many learners in parallel, in request order.
    pub fn generate_schedules(
        &self,
        requests: &[ScheduleRequest],
        today: NaiveDate,
    ) -> Result<Vec<Schedule>> {
        requests
            .par_iter()
            .map(|request| self.generate_schedule(&request.learner_id, &request.topics, today))
            .collect()
    }
}
