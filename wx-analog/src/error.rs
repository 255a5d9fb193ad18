use chrono::NaiveDate;
use wx_core::{Attribute, AttributeLimits};

/// Failure conditions of the analog-day search.
///
/// `IncompleteWindow` and, for candidate days, `UnvectorizableDay` are
/// recovered inside the ranker. Everything else aborts the request.
#[derive(Debug, thiserror::Error)]
pub enum AnalogError {
    #[error("cannot vectorize window: {0}")]
    IncompleteWindow(String),

    #[error("day {0} cannot be represented by any window vector")]
    UnvectorizableDay(NaiveDate),

    #[error("cosine similarity needs at least two usable attributes, found {found}")]
    InsufficientAttributes { found: usize },

    #[error("vector length mismatch (expected {expected}, got {actual})")]
    VectorLengthMismatch { expected: usize, actual: usize },

    #[error("invalid limits for {attribute}: {limits:?}")]
    InvalidLimits {
        attribute: Attribute,
        limits: AttributeLimits,
    },

    #[error("invalid forecast configuration: {0}")]
    InvalidConfig(String),

    #[error("no data for station {station} on {date}")]
    NoData { station: String, date: NaiveDate },

    /// The store itself failed; passed through untouched.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AnalogError>;
