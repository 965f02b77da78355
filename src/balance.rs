use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use log::debug;
use priority_queue::PriorityQueue;
use serde::{Deserialize, Serialize};

use crate::schedule::{Priority, ReviewItem};

pub const DEFAULT_DAILY_BUDGET_MINUTES: u32 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BalancePolicy {
    /// An item moves at most one day; the receiving day may end up over budget.
    SinglePass,
    /// Keep pushing overflow forward until every day fits.
    #[default]
    UntilStable,
}

/// Total scheduled minutes per calendar day.
pub fn daily_load<'a>(items: impl IntoIterator<Item = &'a ReviewItem>) -> BTreeMap<NaiveDate, u32> {
    items.into_iter().fold(BTreeMap::new(), |mut load, item| {
        *load.entry(item.scheduled_date).or_default() += item.duration_minutes;
        load
    })
}

/// Days whose scheduled minutes exceed `budget_minutes`.
pub fn overloaded_days<'a>(
    items: impl IntoIterator<Item = &'a ReviewItem>,
    budget_minutes: u32,
) -> Vec<(NaiveDate, u32)> {
    daily_load(items)
        .into_iter()
        .filter(|&(_, minutes)| minutes > budget_minutes)
        .collect()
}

fn item_priority(item: &ReviewItem, index: usize) -> Reverse<(NaiveDate, Priority, usize)> {
    // earliest day first, then high priority, then generation order
    Reverse((item.scheduled_date, item.priority, index))
}

/// Spreads review items so no day exceeds `budget_minutes`.
///
/// Days are filled in date order, higher priority first. An item that no
/// longer fits moves to the following day with its tier, priority and
/// duration untouched. A day always accepts its first item, so an item longer
/// than the budget still gets a slot. Items come back in their input order.
pub fn balance_schedule(
    mut items: Vec<ReviewItem>,
    budget_minutes: u32,
    policy: BalancePolicy,
) -> Vec<ReviewItem> {
    let mut queue = PriorityQueue::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        queue.push(index, item_priority(item, index));
    }
    let mut load_per_day = HashMap::<NaiveDate, u32>::new();
    let mut moved = vec![false; items.len()];

    while let Some((&index, _)) = queue.peek() {
        let item = &mut items[index];
        let load = load_per_day.entry(item.scheduled_date).or_default();

        let fits = *load == 0 || *load + item.duration_minutes <= budget_minutes;
        if fits || (policy == BalancePolicy::SinglePass && moved[index]) {
            *load += item.duration_minutes;
            queue.pop();
            continue;
        }

        let Some(next_day) = item.scheduled_date.succ_opt() else {
            queue.pop();
            continue;
        };
        debug!(
            "moving {} ({}) from {} to {}",
            item.topic_id, item.tier, item.scheduled_date, next_day
        );
        item.scheduled_date = next_day;
        moved[index] = true;
        queue.change_priority(&index, item_priority(item, index));
    }

    items
}
