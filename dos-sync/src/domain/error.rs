//! Opening-times error types.
//!
//! These errors represent validation failures in the opening-times model.
//! They are distinct from lookup/IO errors raised by collaborators.

use chrono::NaiveTime;

/// Validation and parse failures for opening-time values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OpeningTimesError {
    /// An interval whose start is not strictly before its end
    #[error("invalid open period: start {start} is not before end {end}")]
    InvalidPeriod { start: NaiveTime, end: NaiveTime },

    /// A time with a fractional second
    #[error("open period times must be whole seconds, got {0}")]
    SubSecondTime(NaiveTime),

    /// Text that is not a "HH:MM-HH:MM" range
    #[error("malformed open period: {0:?}")]
    MalformedPeriod(String),

    /// Text that is not a "HH:MM" or "HH:MM:SS" time
    #[error("malformed time: {0:?}")]
    MalformedTime(String),

    /// Weekday name outside the seven recognised days
    #[error("unrecognised weekday: {0:?}")]
    InvalidWeekday(String),

    /// Date text not in "<Mon> <D> <YYYY>" form
    #[error("malformed date: {0:?}")]
    MalformedDate(String),
}
