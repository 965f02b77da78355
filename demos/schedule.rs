use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use review_scheduler::{
    ContentType, ReviewRecord, ReviewState, Scheduler, SchedulerConfig, Tier, Topic,
    estimate_retention,
};
use strum::IntoEnumIterator;

fn setup_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

type Histories = HashMap<String, Vec<ReviewRecord>>;

fn history(today: NaiveDate) -> Result<Histories, Box<dyn std::error::Error>> {
    // A shaky first fortnight followed by steady passes
    let mut reviews = Vec::new();
    for i in 0..28u64 {
        reviews.push(ReviewRecord {
            topic_id: format!("topic-{}", i % 3),
            reviewed_on: today
                .checked_sub_days(Days::new(27 - i))
                .ok_or("date out of range")?,
            score: if i < 14 { 45.0 } else { 85.0 },
            difficulty: 5.0,
        });
    }
    Ok(HashMap::from([("ada".to_string(), reviews)]))
}

fn generate_schedule() -> Result<(), Box<dyn std::error::Error>> {
    let today = NaiveDate::from_ymd_opt(2024, 6, 30).ok_or("invalid date")?;
    let scheduler = Scheduler::new(history(today)?, SchedulerConfig::default())?;

    let topics = vec![
        Topic::new("topic-0", "Chain rule").with_content_type(ContentType::Formula),
        Topic::new("topic-1", "Congress of Vienna").with_content_type(ContentType::Timeline),
        Topic::new("topic-2", "Photosynthesis")
            .with_difficulty(7.0)
            .with_content_type(ContentType::Concept),
    ];

    let snapshot = scheduler.performance_snapshot("ada", today)?;
    println!(
        "Retention {:.2}, velocity {:.2} topics/week, consistency {:.2}",
        snapshot.retention_rate, snapshot.learning_velocity, snapshot.consistency_score
    );

    let schedule = scheduler.generate_schedule("ada", &topics, today)?;
    for tier in Tier::iter() {
        println!("{tier}:");
        for item in schedule.tiers.get(tier) {
            println!(
                "  {} {} ({} min, {})",
                item.scheduled_date, item.topic_name, item.duration_minutes, item.priority
            );
        }
    }
    println!(
        "{} reviews, done in about {} days",
        schedule.total_items, schedule.estimated_completion_days
    );
    Ok(())
}

fn review_a_topic() -> Result<(), Box<dyn std::error::Error>> {
    let today = NaiveDate::from_ymd_opt(2024, 7, 3).ok_or("invalid date")?;
    let scheduler = Scheduler::new(Histories::new(), SchedulerConfig::default())?;

    let adaptation = scheduler.adapt_after_review("ada", "topic-0", 82.0, Some(2.5), today);
    println!(
        "Next review of {} on {} (interval {}, ease {:.2})",
        adaptation.topic_id,
        adaptation.next_review_date,
        adaptation.new_interval,
        adaptation.new_ease_factor
    );

    // Keep feeding scores to watch the interval climb
    let mut state = ReviewState::default();
    let mut reviewed_on = today;
    for score in [82.0, 90.0, 74.0, 95.0] {
        let recall = estimate_retention(state.interval as f32, state.ease_factor, 1.0);
        state = state.after_review(score, 5.0);
        reviewed_on = state.next_review_date(reviewed_on);
        println!(
            "score {score}: expected recall {recall:.2}, next interval {} days on {reviewed_on}",
            state.interval
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logger()?;
    generate_schedule()?;
    review_a_topic()?;
    Ok(())
}
