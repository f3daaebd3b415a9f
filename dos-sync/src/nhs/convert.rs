//! Conversion from opening-time DTOs to the opening-times model.
//!
//! Conversion happens in two steps. [`convert_opening_time`] runs when the
//! entity is built and only checks the entry's type tag. The time and date
//! text is parsed later, by [`extract_standard`] and [`extract_specified`],
//! when the hours are first needed.

use tracing::debug;

use crate::domain::{
    OpenPeriod, OpeningTimesError, SpecifiedGrouping, SpecifiedRow, StandardOpeningTimes, Weekday,
    group_specified_rows, parse_additional_date,
};

use super::EntityError;
use super::kinds::OpeningTimeType;
use super::types::OpeningTimeDto;

/// One opening-time entry with its type tag checked and text left raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningTimeRecord {
    weekday: String,
    range: Option<String>,
    kind: OpeningTimeType,
    additional_date: Option<String>,
    is_open: bool,
}

impl OpeningTimeRecord {
    pub fn kind(&self) -> OpeningTimeType {
        self.kind
    }

    pub fn is_specified(&self) -> bool {
        self.additional_date.is_some()
    }

    fn period(&self) -> Result<OpenPeriod, OpeningTimesError> {
        self.range
            .as_deref()
            .ok_or_else(|| OpeningTimesError::MalformedPeriod(String::new()))?
            .parse()
    }
}

/// Check an entry's type tag and capture its text fields.
pub fn convert_opening_time(dto: &OpeningTimeDto) -> Result<OpeningTimeRecord, EntityError> {
    let kind = OpeningTimeType::parse(&dto.opening_time_type)?;

    let non_blank = |s: &Option<String>| {
        s.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let range = match (
        non_blank(&dto.times),
        non_blank(&dto.opening_time),
        non_blank(&dto.closing_time),
    ) {
        (Some(times), _, _) => Some(times),
        (None, Some(open), Some(close)) => Some(format!("{open}-{close}")),
        _ => None,
    };

    Ok(OpeningTimeRecord {
        weekday: dto.weekday.trim().to_string(),
        range,
        kind,
        additional_date: non_blank(&dto.additional_opening_date),
        is_open: dto.is_open,
    })
}

/// Build the weekly hours from entries of one type.
///
/// Entries count when they name one of the seven weekdays, have no
/// additional date, match `kind` and are open. Anything else is skipped.
/// A surviving entry whose time range does not parse fails the whole
/// extraction.
pub fn extract_standard(
    records: &[OpeningTimeRecord],
    kind: OpeningTimeType,
) -> Result<StandardOpeningTimes, OpeningTimesError> {
    let mut hours = StandardOpeningTimes::new();

    for record in records {
        let Ok(weekday) = Weekday::parse(&record.weekday) else {
            continue;
        };
        if record.is_specified() || record.kind != kind || !record.is_open {
            continue;
        }
        hours.add_open_period(record.period()?, weekday);
    }

    Ok(hours)
}

/// Build the date-specific hours from entries of one type.
///
/// Entries count when they have an additional date and match `kind`.
/// Closed entries are kept with no period. Entries are grouped by date;
/// see [`group_specified_rows`] for how open and closed entries on the same
/// date combine.
pub fn extract_specified(
    records: &[OpeningTimeRecord],
    kind: OpeningTimeType,
) -> Result<SpecifiedGrouping, OpeningTimesError> {
    let mut survivors: Vec<&OpeningTimeRecord> = records
        .iter()
        .filter(|r| r.is_specified() && r.kind == kind)
        .collect();
    survivors.sort_by(|a, b| {
        (&a.additional_date, &a.range).cmp(&(&b.additional_date, &b.range))
    });

    let mut rows = Vec::with_capacity(survivors.len());
    for record in survivors {
        let date_text = record.additional_date.as_deref().unwrap_or_default();
        let date = parse_additional_date(date_text)?;
        let period = if record.is_open {
            Some(record.period()?)
        } else {
            None
        };
        rows.push(SpecifiedRow {
            date,
            period,
            is_open: record.is_open,
        });
    }

    let grouping = group_specified_rows(rows);
    if !grouping.conflicting_dates.is_empty() {
        debug!(
            dates = ?grouping.conflicting_dates,
            "specified dates with both open and closed entries"
        );
    }
    Ok(grouping)
}
