mod adaptation;
mod balance;
mod error;
mod interval;
mod performance;
mod retention;
mod schedule;
mod scheduler;
mod simulation;
#[cfg(test)]
mod test_helpers;

pub use adaptation::{Adaptation, ReviewState, adapt_after_review};
pub use balance::{
    BalancePolicy, DEFAULT_DAILY_BUDGET_MINUTES, balance_schedule, daily_load, overloaded_days,
};
pub use error::{Result, SchedulerError};
pub use interval::{
    DEFAULT_DIFFICULTY, DEFAULT_EASE_FACTOR, IntervalOutcome, MIN_EASE_FACTOR,
    calculate_intervals, next_ease_factor, review_quality,
};
pub use performance::{
    DEFAULT_TREND_WINDOW_DAYS, PASSING_SCORE, PerformanceSnapshot, ReviewHistory, ReviewRecord,
    Trend, TrendSnapshot, VelocityTrend, performance_snapshot, performance_trends,
};
pub use retention::{DEFAULT_STRENGTH, estimate_retention, estimate_retention_on};
pub use schedule::{
    CompletionHorizon, ContentType, Priority, ReviewItem, Schedule, ScheduleTiers, Tier, Topic,
    TopicBaseline, build_review_items, short_term_trend_factor, tier_offsets,
};
pub use scheduler::{ScheduleRequest, Scheduler, SchedulerConfig};
pub use simulation::{SimulationConfig, SimulationResult, simulate, simulate_many};
