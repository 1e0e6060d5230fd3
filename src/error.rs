use thiserror::Error;

use crate::record::Counter;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    /// A counter needed by a formula is absent from the run
    #[error("run {trace}/{experiment} has no {counter} counter")]
    MissingCounter {
        trace: String,
        experiment: String,
        counter: Counter,
    },

    /// A counter holds NaN or an infinity, e.g. an empty cell in the loaded table
    #[error("run {trace}/{experiment} has non-finite {counter} = {value}")]
    NonFiniteCounter {
        trace: String,
        experiment: String,
        counter: Counter,
        value: f64,
    },

    /// A baseline counter used as a divisor is zero
    #[error("baseline run {trace}/{experiment} has {counter} = 0, ratio is undefined")]
    DivisionByZero {
        trace: String,
        experiment: String,
        counter: Counter,
    },

    /// Geometric mean input at `index` is zero, negative or NaN
    #[error("geometric mean needs strictly positive values, got {value} at position {index}")]
    NonPositiveValue { index: usize, value: f64 },

    #[error("cannot aggregate an empty sequence")]
    EmptyInput,

    #[error("unknown counter name '{0}'")]
    UnknownCounter(String),

    #[error("prefetcher label '{0}' is configured more than once")]
    DuplicatePrefetcher(String),

    /// A group holds more than one run of the same experiment
    #[error("group {group} has more than one '{experiment}' run")]
    DuplicateRun { group: String, experiment: String },
}

pub type Result<T> = std::result::Result<T, MetricError>;
