//! Weekly standard opening times.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::{OpenPeriod, OpeningTimesError, Weekday, format_clock_time};

/// One period as it appears in an outbound change payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangePeriod {
    pub start_time: String,
    pub end_time: String,
}

impl From<OpenPeriod> for ChangePeriod {
    fn from(period: OpenPeriod) -> Self {
        Self {
            start_time: format_clock_time(period.start()),
            end_time: format_clock_time(period.end()),
        }
    }
}

/// Open periods for each day of a normal week.
///
/// Periods are appended in whatever order the source supplies them and are
/// only sorted when read, so two instances built from the same periods in a
/// different order compare equal. Overlapping periods are representable:
/// use [`StandardOpeningTimes::is_valid`] before trusting the data.
#[derive(Clone, Default)]
pub struct StandardOpeningTimes {
    days: BTreeMap<Weekday, Vec<OpenPeriod>>,
}

impl StandardOpeningTimes {
    /// Create an empty week (closed every day).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a period to a day.
    pub fn add_open_period(&mut self, period: OpenPeriod, weekday: Weekday) {
        self.days.entry(weekday).or_default().push(period);
    }

    /// Append a period to a day given by name, e.g. "Friday".
    pub fn add_open_period_named(
        &mut self,
        period: OpenPeriod,
        weekday: &str,
    ) -> Result<(), OpeningTimesError> {
        let weekday = Weekday::parse(weekday)?;
        self.add_open_period(period, weekday);
        Ok(())
    }

    /// The periods for a day, sorted by start time.
    pub fn periods(&self, weekday: Weekday) -> Vec<OpenPeriod> {
        let mut periods = self.days.get(&weekday).cloned().unwrap_or_default();
        periods.sort();
        periods
    }

    /// True if the day has at least one period.
    pub fn is_open(&self, weekday: Weekday) -> bool {
        self.days.get(&weekday).is_some_and(|p| !p.is_empty())
    }

    /// True if no day has any period.
    pub fn fully_closed(&self) -> bool {
        Weekday::ALL.iter().all(|day| !self.is_open(*day))
    }

    /// True if no two periods on the same day overlap.
    pub fn is_valid(&self) -> bool {
        Weekday::ALL.iter().all(|day| {
            // Sorted by start, any overlap shows up between neighbours
            self.periods(*day)
                .windows(2)
                .all(|pair| !pair[0].overlaps(&pair[1]))
        })
    }

    /// True if both weeks have the same periods on the given day.
    pub fn same_openings(&self, other: &StandardOpeningTimes, weekday: Weekday) -> bool {
        self.periods(weekday) == other.periods(weekday)
    }

    /// Days whose periods differ between the two weeks, Monday first.
    pub fn differing_days(&self, other: &StandardOpeningTimes) -> Vec<Weekday> {
        Weekday::ALL
            .into_iter()
            .filter(|day| !self.same_openings(other, *day))
            .collect()
    }

    /// A day's periods in change-payload form; empty means closed.
    pub fn export_cr_format(&self, weekday: Weekday) -> Vec<ChangePeriod> {
        self.periods(weekday).into_iter().map(ChangePeriod::from).collect()
    }
}

impl PartialEq for StandardOpeningTimes {
    fn eq(&self, other: &Self) -> bool {
        self.differing_days(other).is_empty()
    }
}

impl Eq for StandardOpeningTimes {}

impl fmt::Debug for StandardOpeningTimes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for day in Weekday::ALL {
            if self.is_open(day) {
                map.entry(&day.as_str(), &self.periods(day));
            }
        }
        map.finish()
    }
}
