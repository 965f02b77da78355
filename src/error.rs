use snafu::Snafu;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub(crate)))]
pub enum SchedulerError {
    #[snafu(display("review history for learner {learner_id} is unavailable"))]
    HistoryUnavailable { learner_id: String },
    #[snafu(display("invalid scheduler config: {reason}"))]
    InvalidConfig { reason: &'static str },
    InvalidSimulation,
}

pub type Result<T, E = SchedulerError> = std::result::Result<T, E>;
