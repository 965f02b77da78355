use std::cmp::Reverse;

use chrono::{Days, NaiveDate};
use priority_queue::PriorityQueue;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::adaptation::ReviewState;
use crate::balance::DEFAULT_DAILY_BUDGET_MINUTES;
use crate::error::{Result, SchedulerError};
use crate::performance::{PASSING_SCORE, ReviewRecord};
use crate::retention::{DEFAULT_STRENGTH, estimate_retention};
use crate::schedule::{Tier, Topic};

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub learn_span: usize,
    pub daily_budget_minutes: u32,
    pub review_minutes: u32,
    /// Forgetting-curve strength of the simulated learner.
    pub strength: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            learn_span: 90,
            daily_budget_minutes: DEFAULT_DAILY_BUDGET_MINUTES,
            review_minutes: Tier::Immediate.duration_minutes(),
            strength: DEFAULT_STRENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub review_cnt_per_day: Vec<usize>,
    pub correct_cnt_per_day: Vec<usize>,
    pub minutes_per_day: Vec<u32>,
    /// Final state of each topic, in input order.
    pub states: Vec<ReviewState>,
    /// Every simulated review, in the order it happened.
    pub history: Vec<ReviewRecord>,
}

struct SimTopic {
    state: ReviewState,
    due: usize,
    last_review: Option<usize>,
}

/// Plays a learner through `topics` for `config.learn_span` days.
///
/// Every topic is first seen on day 0. Recall on each due review is sampled
/// from the forgetting curve, the score feeds the threaded adaptation step,
/// and reviews that would break the daily budget wait for the next day.
pub fn simulate(
    config: &SimulationConfig,
    topics: &[Topic],
    start: NaiveDate,
    seed: Option<u64>,
) -> Result<SimulationResult> {
    if config.learn_span == 0 {
        return Err(SchedulerError::InvalidSimulation);
    }
    let mut rng = StdRng::seed_from_u64(seed.unwrap_or(42));

    let mut review_cnt_per_day = vec![0; config.learn_span];
    let mut correct_cnt_per_day = vec![0; config.learn_span];
    let mut minutes_per_day = vec![0; config.learn_span];
    let mut history = Vec::new();

    let mut cards = topics
        .iter()
        .map(|_| SimTopic {
            state: ReviewState::default(),
            due: 0,
            last_review: None,
        })
        .collect::<Vec<_>>();

    let mut queue = PriorityQueue::new();
    for index in 0..cards.len() {
        queue.push(index, Reverse((0, index)));
    }

    while let Some((&index, _)) = queue.peek() {
        let card = &mut cards[index];
        let day = card.due;
        if day >= config.learn_span {
            queue.pop();
            continue;
        }

        if minutes_per_day[day] > 0
            && minutes_per_day[day] + config.review_minutes > config.daily_budget_minutes
        {
            card.due = day + 1;
            queue.change_priority(&index, Reverse((card.due, index)));
            continue;
        }

        let elapsed = card.last_review.map_or(0, |last| day - last);
        let retention = estimate_retention(elapsed as f32, card.state.ease_factor, config.strength);
        let recalled = rng.random_bool(retention as f64);
        let score = if recalled {
            rng.random_range(PASSING_SCORE..=100.0)
        } else {
            rng.random_range(0.0..PASSING_SCORE)
        };

        let topic = &topics[index];
        card.state = card.state.after_review(score, topic.effective_difficulty());
        card.last_review = Some(day);
        card.due = day + card.state.interval as usize;

        review_cnt_per_day[day] += 1;
        correct_cnt_per_day[day] += recalled as usize;
        minutes_per_day[day] += config.review_minutes;
        history.push(ReviewRecord {
            topic_id: topic.id.clone(),
            reviewed_on: start
                .checked_add_days(Days::new(day as u64))
                .unwrap_or(NaiveDate::MAX),
            score,
            difficulty: topic.effective_difficulty(),
        });

        queue.change_priority(&index, Reverse((card.due, index)));
    }

    Ok(SimulationResult {
        review_cnt_per_day,
        correct_cnt_per_day,
        minutes_per_day,
        states: cards.into_iter().map(|c| c.state).collect(),
        history,
    })
}

/// Runs `n` independently seeded simulations in parallel.
pub fn simulate_many(
    config: &SimulationConfig,
    topics: &[Topic],
    start: NaiveDate,
    n: usize,
) -> Result<Vec<SimulationResult>> {
    (0..n)
        .into_par_iter()
        .map(|i| simulate(config, topics, start, Some(i as u64 + 42)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::MIN_EASE_FACTOR;
    use crate::performance::performance_snapshot;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
    }

    fn topics(n: usize) -> Vec<Topic> {
        (0..n)
            .map(|i| Topic::new(format!("t{i}"), format!("Topic {i}")))
            .collect()
    }

    #[test]
    fn test_rejects_empty_span() {
        let config = SimulationConfig {
            learn_span: 0,
            ..Default::default()
        };
        assert!(matches!(
            simulate(&config, &topics(3), start(), None),
            Err(SchedulerError::InvalidSimulation)
        ));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let config = SimulationConfig::default();
        let a = simulate(&config, &topics(8), start(), Some(7)).unwrap();
        let b = simulate(&config, &topics(8), start(), Some(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_daily_budget_is_respected() {
        let config = SimulationConfig::default();
        let result = simulate(&config, &topics(20), start(), None).unwrap();
        assert!(
            result
                .minutes_per_day
                .iter()
                .all(|&m| m <= config.daily_budget_minutes)
        );
        // 20 new topics at 15 minutes need five days to introduce
        assert_eq!(&result.review_cnt_per_day[..5], [4, 4, 4, 4, 4]);
        assert_eq!(
            result.review_cnt_per_day.iter().sum::<usize>(),
            result.history.len()
        );
    }

    #[test]
    fn test_state_invariants_and_history() {
        let config = SimulationConfig {
            learn_span: 120,
            daily_budget_minutes: 600,
            ..Default::default()
        };
        let result = simulate(&config, &topics(10), start(), Some(3)).unwrap();
        assert_eq!(result.states.len(), 10);
        assert!(
            result
                .states
                .iter()
                .all(|s| s.interval >= 1 && s.ease_factor >= MIN_EASE_FACTOR)
        );
        let last_day = start().checked_add_days(Days::new(119)).unwrap();
        assert!(
            result
                .history
                .iter()
                .all(|r| (start()..=last_day).contains(&r.reviewed_on))
        );
        let snapshot = performance_snapshot(&result.history, last_day);
        assert!((0.0..=1.0).contains(&snapshot.retention_rate));
    }

    #[test]
    fn test_simulate_many() {
        let config = SimulationConfig::default();
        let results = simulate_many(&config, &topics(5), start(), 4).unwrap();
        assert_eq!(results.len(), 4);
        assert_eq!(
            results[1],
            simulate(&config, &topics(5), start(), Some(43)).unwrap()
        );
    }
}
