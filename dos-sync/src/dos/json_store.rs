//! File-backed DoS fixture store.
//!
//! Loads a directory of JSON files and serves them through the lookup
//! traits, as if they were query results. Used by the CLI and by tests that
//! run without a database.
//!
//! Expected files (only `services.json` is required):
//!
//! - `services.json`: `{"columns": [...], "rows": [[...], ...]}` with
//!   columns in schema order
//! - `standard_opening_times.json`: `[{"service_id", "weekday", "start", "end"}]`
//! - `specified_opening_times.json`: `[{"service_id", "date", "start", "end", "is_closed"}]`
//! - `palliative_care.json`: list of service ids
//! - `locations.json`: list of locations

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::domain::{
    OpenPeriod, OpeningTimesError, SpecifiedOpeningTime, SpecifiedRow, StandardOpeningTimes, Weekday,
    group_specified_rows, normalise_postcode,
};

use super::lookup::{LocationLookup, OpeningTimesLookup, PalliativeCareLookup, ServiceLookup};
use super::schema::{ColumnValue, check_header};
use super::{DosLocation, DosService, LookupError};

#[derive(Debug, Deserialize)]
struct ServicesFile {
    columns: Vec<String>,
    rows: Vec<Vec<ColumnValue>>,
}

#[derive(Debug, Clone, Deserialize)]
struct StandardRow {
    service_id: i64,
    weekday: String,
    start: String,
    end: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SpecifiedFileRow {
    service_id: i64,
    date: NaiveDate,
    start: Option<String>,
    end: Option<String>,
    #[serde(default)]
    is_closed: bool,
}

/// DoS data loaded from JSON files.
pub struct JsonDos {
    services: Vec<DosService>,
    standard: HashMap<i64, Vec<StandardRow>>,
    specified: HashMap<i64, Vec<SpecifiedFileRow>>,
    palliative_care: HashSet<i64>,
    locations: Vec<DosLocation>,
}

impl JsonDos {
    /// Load every fixture file from a directory.
    ///
    /// Service rows are validated against the schema here, so a fixture that
    /// has drifted fails at load rather than mid-run.
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self, LookupError> {
        let data_dir = data_dir.as_ref();

        let file: ServicesFile = read_json(&data_dir.join("services.json"))?;
        check_header(&file.columns)?;
        let services = file
            .rows
            .iter()
            .map(|row| DosService::from_row(row))
            .collect::<Result<Vec<_>, _>>()?;

        let mut standard: HashMap<i64, Vec<StandardRow>> = HashMap::new();
        for row in read_optional::<Vec<StandardRow>>(&data_dir.join("standard_opening_times.json"))? {
            standard.entry(row.service_id).or_default().push(row);
        }

        let mut specified: HashMap<i64, Vec<SpecifiedFileRow>> = HashMap::new();
        for row in
            read_optional::<Vec<SpecifiedFileRow>>(&data_dir.join("specified_opening_times.json"))?
        {
            specified.entry(row.service_id).or_default().push(row);
        }

        let palliative_care =
            read_optional::<Vec<i64>>(&data_dir.join("palliative_care.json"))?
                .into_iter()
                .collect();
        let locations = read_optional(&data_dir.join("locations.json"))?;

        info!(
            dir = %data_dir.display(),
            services = services.len(),
            "loaded DoS fixtures"
        );

        Ok(Self {
            services,
            standard,
            specified,
            palliative_care,
            locations,
        })
    }

    /// Number of service rows loaded.
    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}

impl ServiceLookup for JsonDos {
    fn find_by_routing_prefix(&self, routing_key: &str) -> Result<Vec<DosService>, LookupError> {
        let matches: Vec<DosService> = self
            .services
            .iter()
            .filter(|s| {
                s.odscode
                    .as_deref()
                    .is_some_and(|code| code.starts_with(routing_key))
            })
            .cloned()
            .collect();
        debug!(routing_key, count = matches.len(), "services by prefix");
        Ok(matches)
    }
}

impl OpeningTimesLookup for JsonDos {
    fn load_standard_hours(&self, service_id: i64) -> Result<StandardOpeningTimes, LookupError> {
        let mut hours = StandardOpeningTimes::new();
        for row in self.standard.get(&service_id).into_iter().flatten() {
            let invalid = |e: OpeningTimesError| LookupError::OpeningTimes {
                service_id,
                message: e.to_string(),
            };
            let weekday = Weekday::parse(&row.weekday).map_err(invalid)?;
            let period = OpenPeriod::from_fields(&row.start, &row.end).map_err(invalid)?;
            hours.add_open_period(period, weekday);
        }
        Ok(hours)
    }

    fn load_specified_hours(
        &self,
        service_id: i64,
    ) -> Result<Vec<SpecifiedOpeningTime>, LookupError> {
        let mut rows = Vec::new();
        for row in self.specified.get(&service_id).into_iter().flatten() {
            let period = match (&row.start, &row.end) {
                (Some(start), Some(end)) if !row.is_closed => Some(
                    OpenPeriod::from_fields(start, end).map_err(|e| {
                        LookupError::OpeningTimes {
                            service_id,
                            message: e.to_string(),
                        }
                    })?,
                ),
                _ => None,
            };
            rows.push(SpecifiedRow {
                date: row.date,
                period,
                is_open: !row.is_closed,
            });
        }

        let grouping = group_specified_rows(rows);
        if !grouping.conflicting_dates.is_empty() {
            debug!(
                service_id,
                dates = ?grouping.conflicting_dates,
                "stored specified dates with both open and closed rows"
            );
        }
        Ok(grouping.times)
    }
}

impl PalliativeCareLookup for JsonDos {
    fn has_palliative_care(&self, service_id: i64) -> Result<bool, LookupError> {
        Ok(self.palliative_care.contains(&service_id))
    }
}

impl LocationLookup for JsonDos {
    fn find_by_postcode(&self, postcode: &str) -> Result<Vec<DosLocation>, LookupError> {
        let wanted = normalise_postcode(postcode);
        Ok(self
            .locations
            .iter()
            .filter(|l| l.normal_postcode() == wanted)
            .cloned()
            .collect())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LookupError> {
    let json = std::fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(|e| LookupError::Decode {
        source: path.display().to_string(),
        message: e.to_string(),
    })
}

fn read_optional<T: DeserializeOwned + Default>(path: &Path) -> Result<T, LookupError> {
    if path.exists() {
        read_json(path)
    } else {
        Ok(T::default())
    }
}
