//! Date-specific opening times (bank holidays, one-off closures).

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use super::{OpenPeriod, OpeningTimesError};

/// Opening times for one specific calendar date.
///
/// A closed date never carries periods, even if the source supplied some.
/// Periods are sorted at construction so that equality is reliable.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SpecifiedOpeningTime {
    date: NaiveDate,
    is_open: bool,
    periods: Vec<OpenPeriod>,
}

impl SpecifiedOpeningTime {
    /// Create a specified opening time; periods are sorted, and dropped if closed.
    pub fn new(mut periods: Vec<OpenPeriod>, date: NaiveDate, is_open: bool) -> Self {
        if is_open {
            periods.sort();
        } else {
            periods.clear();
        }
        Self {
            date,
            is_open,
            periods,
        }
    }

    /// A date on which the service is closed all day.
    pub fn closed(date: NaiveDate) -> Self {
        Self::new(Vec::new(), date, false)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn periods(&self) -> &[OpenPeriod] {
        &self.periods
    }

    /// Closed, or open with at least one period and no overlaps.
    pub fn is_valid(&self) -> bool {
        if !self.is_open {
            return self.periods.is_empty();
        }
        !self.periods.is_empty()
            && self
                .periods
                .windows(2)
                .all(|pair| !pair[0].overlaps(&pair[1]))
    }
}

impl fmt::Debug for SpecifiedOpeningTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<SpecifiedOpenTime: {} open={} {:?}>",
            self.date.format("%d-%m-%Y"),
            self.is_open,
            self.periods
        )
    }
}

/// One raw date-specific row before grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecifiedRow {
    pub date: NaiveDate,
    pub period: Option<OpenPeriod>,
    pub is_open: bool,
}

/// Result of grouping raw rows by date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecifiedGrouping {
    /// One entry per distinct date, in date order.
    pub times: Vec<SpecifiedOpeningTime>,
    /// Dates that had both open and closed rows.
    pub conflicting_dates: Vec<NaiveDate>,
}

#[derive(Default)]
struct DateAccumulator {
    periods: Vec<OpenPeriod>,
    saw_open: bool,
    saw_closed: bool,
}

/// Group raw rows by date into one [`SpecifiedOpeningTime`] per date.
///
/// Rows are merged regardless of input order. When a date has both open and
/// closed rows, the open rows win and the date is listed in
/// `conflicting_dates` for the caller to report.
pub fn group_specified_rows<I>(rows: I) -> SpecifiedGrouping
where
    I: IntoIterator<Item = SpecifiedRow>,
{
    let mut by_date: BTreeMap<NaiveDate, DateAccumulator> = BTreeMap::new();

    for row in rows {
        let acc = by_date.entry(row.date).or_default();
        if row.is_open {
            acc.saw_open = true;
            acc.periods.extend(row.period);
        } else {
            acc.saw_closed = true;
        }
    }

    let mut grouping = SpecifiedGrouping::default();
    for (date, acc) in by_date {
        if acc.saw_open && acc.saw_closed {
            grouping.conflicting_dates.push(date);
        }
        grouping
            .times
            .push(SpecifiedOpeningTime::new(acc.periods, date, acc.saw_open));
    }
    grouping
}

/// Every entry is valid and no date appears twice.
pub fn valid_specified_list(times: &[SpecifiedOpeningTime]) -> bool {
    let mut dates: Vec<NaiveDate> = times.iter().map(|t| t.date()).collect();
    dates.sort();
    dates.dedup();
    dates.len() == times.len() && times.iter().all(SpecifiedOpeningTime::is_valid)
}

/// Entries dated today or later, in date order.
pub fn future_only(times: &[SpecifiedOpeningTime], today: NaiveDate) -> Vec<SpecifiedOpeningTime> {
    let mut future: Vec<SpecifiedOpeningTime> = times
        .iter()
        .filter(|t| t.date() >= today)
        .cloned()
        .collect();
    future.sort_by_key(|t| t.date());
    future
}

/// Dates whose entry differs between two lists (present in one only, or different).
pub fn differing_dates(
    a: &[SpecifiedOpeningTime],
    b: &[SpecifiedOpeningTime],
) -> Vec<NaiveDate> {
    let index = |times: &[SpecifiedOpeningTime]| -> BTreeMap<NaiveDate, SpecifiedOpeningTime> {
        times.iter().map(|t| (t.date(), t.clone())).collect()
    };
    let a = index(a);
    let b = index(b);

    let mut dates: Vec<NaiveDate> = a.keys().chain(b.keys()).copied().collect();
    dates.sort();
    dates.dedup();
    dates.retain(|d| a.get(d) != b.get(d));
    dates
}

/// Parse NHS UK additional-opening-date text, e.g. "Dec 25 2025".
///
/// The feed sometimes pads with extra spaces ("Dec  25  2025"), which is
/// accepted. Any other layout is rejected.
///
/// ```
/// use chrono::NaiveDate;
/// use dos_sync::domain::parse_additional_date;
///
/// assert_eq!(
///     parse_additional_date("Dec 25 2025").unwrap(),
///     NaiveDate::from_ymd_opt(2025, 12, 25).unwrap()
/// );
/// assert_eq!(
///     parse_additional_date("Aug  6  2019").unwrap(),
///     NaiveDate::from_ymd_opt(2019, 8, 6).unwrap()
/// );
/// assert!(parse_additional_date("2025-12-25").is_err());
/// ```
pub fn parse_additional_date(s: &str) -> Result<NaiveDate, OpeningTimesError> {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    let parts: Vec<&str> = collapsed.split(' ').collect();
    let well_formed = parts.len() == 3
        && parts[0].len() == 3
        && parts[0].chars().all(|c| c.is_ascii_alphabetic())
        && (1..=2).contains(&parts[1].len())
        && parts[2].len() == 4;
    if !well_formed {
        return Err(OpeningTimesError::MalformedDate(s.to_string()));
    }
    NaiveDate::parse_from_str(&collapsed, "%b %d %Y")
        .map_err(|_| OpeningTimesError::MalformedDate(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period(s: &str) -> OpenPeriod {
        s.parse().unwrap()
    }

    fn open_row(d: NaiveDate, p: &str) -> SpecifiedRow {
        SpecifiedRow {
            date: d,
            period: Some(period(p)),
            is_open: true,
        }
    }

    fn closed_row(d: NaiveDate) -> SpecifiedRow {
        SpecifiedRow {
            date: d,
            period: None,
            is_open: false,
        }
    }

    #[test]
    fn constructor_sorts_periods() {
        let sot = SpecifiedOpeningTime::new(
            vec![period("21:00-22:00"), period("08:00-20:00")],
            date(2019, 8, 26),
            true,
        );
        assert_eq!(
            sot.periods(),
            &[period("08:00-20:00"), period("21:00-22:00")]
        );
    }

    #[test]
    fn closed_drops_stray_periods() {
        let sot = SpecifiedOpeningTime::new(vec![period("14:30-16:00")], date(2019, 9, 21), false);
        assert!(sot.periods().is_empty());
        assert!(!sot.is_open());
        assert_eq!(sot, SpecifiedOpeningTime::closed(date(2019, 9, 21)));
    }

    #[test]
    fn validity() {
        assert!(SpecifiedOpeningTime::closed(date(2023, 3, 1)).is_valid());
        assert!(
            SpecifiedOpeningTime::new(vec![period("12:00-16:00")], date(2023, 3, 1), true)
                .is_valid()
        );
        // Open with nothing open is not meaningful
        assert!(!SpecifiedOpeningTime::new(vec![], date(2023, 3, 1), true).is_valid());
        assert!(
            !SpecifiedOpeningTime::new(
                vec![period("09:00-13:00"), period("12:00-17:00")],
                date(2023, 3, 1),
                true
            )
            .is_valid()
        );
    }

    #[test]
    fn group_merges_periods_for_same_date() {
        let d = date(2019, 8, 26);
        let grouping =
            group_specified_rows(vec![open_row(d, "21:00-22:00"), open_row(d, "08:00-20:00")]);

        assert_eq!(
            grouping.times,
            vec![SpecifiedOpeningTime::new(
                vec![period("08:00-20:00"), period("21:00-22:00")],
                d,
                true
            )]
        );
        assert!(grouping.conflicting_dates.is_empty());
    }

    #[test]
    fn group_orders_by_date_regardless_of_input() {
        let rows = vec![
            open_row(date(2019, 5, 6), "08:00-20:00"),
            open_row(date(2019, 5, 27), "08:00-20:00"),
            open_row(date(2019, 8, 26), "08:00-20:00"),
            open_row(date(2019, 8, 26), "21:00-22:00"),
            closed_row(date(2019, 9, 20)),
            closed_row(date(2019, 9, 21)),
            open_row(date(2019, 5, 6), "06:00-07:00"),
        ];
        let grouping = group_specified_rows(rows);

        let rendered: Vec<String> = grouping.times.iter().map(|t| format!("{t:?}")).collect();
        assert_eq!(
            rendered,
            vec![
                "<SpecifiedOpenTime: 06-05-2019 open=true [OpenPeriod(06:00-07:00), OpenPeriod(08:00-20:00)]>",
                "<SpecifiedOpenTime: 27-05-2019 open=true [OpenPeriod(08:00-20:00)]>",
                "<SpecifiedOpenTime: 26-08-2019 open=true [OpenPeriod(08:00-20:00), OpenPeriod(21:00-22:00)]>",
                "<SpecifiedOpenTime: 20-09-2019 open=false []>",
                "<SpecifiedOpenTime: 21-09-2019 open=false []>",
            ]
        );
    }

    #[test]
    fn open_wins_over_closed_on_same_date() {
        let d = date(2025, 12, 25);
        for rows in [
            vec![closed_row(d), open_row(d, "10:00-12:00")],
            vec![open_row(d, "10:00-12:00"), closed_row(d)],
        ] {
            let grouping = group_specified_rows(rows);
            assert_eq!(
                grouping.times,
                vec![SpecifiedOpeningTime::new(vec![period("10:00-12:00")], d, true)]
            );
            assert_eq!(grouping.conflicting_dates, vec![d]);
        }
    }

    #[test]
    fn valid_list_rejects_duplicate_dates() {
        let d = date(2023, 3, 1);
        let sot = SpecifiedOpeningTime::new(vec![period("12:00-16:00")], d, true);
        assert!(valid_specified_list(std::slice::from_ref(&sot)));
        assert!(!valid_specified_list(&[sot.clone(), sot]));
        assert!(valid_specified_list(&[]));
    }

    #[test]
    fn future_only_drops_past_dates() {
        let times = vec![
            SpecifiedOpeningTime::closed(date(2026, 12, 25)),
            SpecifiedOpeningTime::closed(date(2025, 12, 25)),
            SpecifiedOpeningTime::closed(date(2026, 10, 19)),
        ];
        let future = future_only(&times, date(2026, 10, 19));
        assert_eq!(
            future,
            vec![
                SpecifiedOpeningTime::closed(date(2026, 10, 19)),
                SpecifiedOpeningTime::closed(date(2026, 12, 25)),
            ]
        );
    }

    #[test]
    fn differing_dates_reports_changed_added_and_removed() {
        let a = vec![
            SpecifiedOpeningTime::closed(date(2026, 12, 25)),
            SpecifiedOpeningTime::closed(date(2026, 12, 26)),
        ];
        let b = vec![
            SpecifiedOpeningTime::new(vec![period("10:00-12:00")], date(2026, 12, 25), true),
            SpecifiedOpeningTime::closed(date(2027, 1, 1)),
        ];
        assert_eq!(
            differing_dates(&a, &b),
            vec![date(2026, 12, 25), date(2026, 12, 26), date(2027, 1, 1)]
        );
        assert!(differing_dates(&a, &a).is_empty());
    }

    #[test]
    fn parse_date_formats() {
        assert_eq!(parse_additional_date("Aug 26 2019").unwrap(), date(2019, 8, 26));
        assert_eq!(parse_additional_date("Jan 1 2024").unwrap(), date(2024, 1, 1));
        assert_eq!(parse_additional_date(" Dec  25  2025 ").unwrap(), date(2025, 12, 25));

        for bad in ["", "26/08/2019", "2019-08-26", "August 26 2019", "Aug 26", "Feb 30 2024", "Aug 26 19"] {
            assert_eq!(
                parse_additional_date(bad),
                Err(OpeningTimesError::MalformedDate(bad.to_string())),
                "{bad:?} should not parse"
            );
        }
    }
}
