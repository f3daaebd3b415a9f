//! Opening-times and identifier value types.
//!
//! These types are shared by both sides of a reconciliation: the NHS UK feed
//! and the DoS database. Types that carry an invariant enforce it at
//! construction. Aggregates whose validity depends on their contents (such as
//! overlapping periods within a day) can hold invalid data and expose an
//! explicit `is_valid` check instead.

mod error;
mod ods_code;
mod open_period;
mod postcode;
mod specified;
mod standard;
mod weekday;

pub use error::OpeningTimesError;
pub use ods_code::{InvalidOdsCode, OdsCode, ROUTING_KEY_LEN, routing_key};
pub use open_period::{OpenPeriod, format_clock_time, parse_clock_time};
pub use postcode::normalise_postcode;
pub use specified::{
    SpecifiedGrouping, SpecifiedOpeningTime, SpecifiedRow, differing_dates, future_only,
    group_specified_rows, parse_additional_date, valid_specified_list,
};
pub use standard::{ChangePeriod, StandardOpeningTimes};
pub use weekday::Weekday;
