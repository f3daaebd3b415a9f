//! Field-level comparison of an NHS UK entity against a DoS service.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::diagnostics::{Diagnostic, DiagnosticSink, Side};
use crate::domain::{
    OpeningTimesError, SpecifiedOpeningTime, StandardOpeningTimes, Weekday, differing_dates,
    future_only, normalise_postcode, valid_specified_list,
};
use crate::dos::{DosService, LookupError, OpeningTimesLookup, PalliativeCareLookup};
use crate::matching::PALLIATIVE_CARE_CODE;
use crate::nhs::NhsEntity;

use super::change_set::{ChangeKey, ChangeSet, ChangeValue};

/// Settings for one comparison pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareOptions {
    /// Date-specific entries before this date are ignored on both sides.
    pub today: NaiveDate,

    /// Only services of this type carry the palliative-care flag.
    pub primary_type_id: i64,
}

/// The entity's parsed General hours.
#[derive(Debug, Clone, Copy)]
pub struct EntityHours<'a> {
    pub standard: &'a StandardOpeningTimes,
    pub specified: &'a [SpecifiedOpeningTime],
}

impl<'a> EntityHours<'a> {
    /// Parse (or fetch the cached) hours of an entity.
    pub fn of(entity: &'a NhsEntity) -> Result<Self, OpeningTimesError> {
        Ok(Self {
            standard: entity.standard_opening_times()?,
            specified: &entity.specified_opening_times()?.times,
        })
    }

    /// No overlapping periods, and date-specific entries are well formed.
    pub fn is_valid(&self) -> bool {
        self.standard.is_valid() && valid_specified_list(self.specified)
    }
}

/// Compute the changes needed to make `service` match `entity`.
///
/// Pure: uses only what is passed in. Hours are compared only when
/// `hours` is given and the service has the matching hours attached.
pub fn compute_changes(
    entity: &NhsEntity,
    service: &DosService,
    hours: Option<&EntityHours<'_>>,
    options: &CompareOptions,
) -> ChangeSet {
    let mut changes = ChangeSet::new();

    if !same_text(entity.website.as_deref(), service.web.as_deref()) {
        changes.insert(ChangeKey::Website, ChangeValue::Text(entity.website.clone()));
    }

    if !same_phone(entity.phone.as_deref(), service.publicphone.as_deref()) {
        changes.insert(ChangeKey::Phone, ChangeValue::Text(entity.phone.clone()));
    }

    if !same_text(Some(&entity.organisation_name), service.publicname.as_deref()) {
        changes.insert(
            ChangeKey::PublicName,
            ChangeValue::Text(Some(entity.organisation_name.clone())),
        );
    }

    if entity.address_lines != service.address_lines() {
        changes.insert(
            ChangeKey::Address,
            ChangeValue::Lines(entity.address_lines.clone()),
        );
    }

    // NHS UK not sending a postcode is not a request to clear it
    if let Some(postcode) = &entity.postcode
        && Some(normalise_postcode(postcode)) != service.normal_postcode()
    {
        changes.insert(ChangeKey::Postcode, ChangeValue::Text(Some(postcode.clone())));
    }

    if let Some(hours) = hours {
        if let Some(dos_standard) = &service.standard_opening_times {
            for day in Weekday::ALL {
                if !hours.standard.same_openings(dos_standard, day) {
                    changes.insert(
                        ChangeKey::StandardOpeningTimes(day),
                        ChangeValue::Periods(hours.standard.export_cr_format(day)),
                    );
                }
            }
        }

        if let Some(dos_specified) = &service.specified_opening_times {
            let nhs_future = future_only(hours.specified, options.today);
            if nhs_future != future_only(dos_specified, options.today) {
                changes.insert(
                    ChangeKey::SpecifiedOpeningTimes,
                    ChangeValue::Specified(nhs_future),
                );
            }
        }
    }

    if service.typeid == options.primary_type_id
        && let Some(dos_palliative) = service.palliative_care
    {
        let nhs_palliative = entity.check_for_service(PALLIATIVE_CARE_CODE);
        if nhs_palliative != dos_palliative {
            changes.insert(ChangeKey::Sgsdid, ChangeValue::Flag(nhs_palliative));
        }
    }

    changes
}

/// Dates from today on whose date-specific hours differ between the two
/// sides, in date order.
///
/// The change set carries the whole future list; this names the days in it
/// that actually moved.
pub fn moved_specified_dates(
    nhs: &[SpecifiedOpeningTime],
    dos: &[SpecifiedOpeningTime],
    today: NaiveDate,
) -> Vec<NaiveDate> {
    differing_dates(&future_only(nhs, today), &future_only(dos, today))
}

/// Blank and absent are the same; otherwise exact after trimming.
fn same_text(nhs: Option<&str>, dos: Option<&str>) -> bool {
    fn clean(s: Option<&str>) -> Option<&str> {
        s.map(str::trim).filter(|s| !s.is_empty())
    }
    clean(nhs) == clean(dos)
}

/// Phone numbers compare with all whitespace removed.
fn same_phone(nhs: Option<&str>, dos: Option<&str>) -> bool {
    let clean = |s: Option<&str>| {
        s.map(|s| s.chars().filter(|c| !c.is_whitespace()).collect::<String>())
            .filter(|s| !s.is_empty())
    };
    clean(nhs) == clean(dos)
}

/// Compares one entity against each of its services, loading service data
/// on demand.
///
/// Created once per entity. Construction checks the entity's hours and
/// reports problems with them; if they are invalid, opening-time keys are
/// left out of every change set while contact fields still sync.
pub struct Comparator<'a> {
    entity: &'a NhsEntity,
    hours: EntityHours<'a>,
    compare_hours: bool,
    opening_times: &'a dyn OpeningTimesLookup,
    palliative_care: &'a dyn PalliativeCareLookup,
    sink: &'a dyn DiagnosticSink,
    options: CompareOptions,
}

impl<'a> Comparator<'a> {
    pub fn new(
        entity: &'a NhsEntity,
        opening_times: &'a dyn OpeningTimesLookup,
        palliative_care: &'a dyn PalliativeCareLookup,
        sink: &'a dyn DiagnosticSink,
        options: CompareOptions,
    ) -> Result<Self, OpeningTimesError> {
        let hours = EntityHours::of(entity)?;

        let conflicts = &entity.specified_opening_times()?.conflicting_dates;
        if !conflicts.is_empty() {
            sink.record_event(&Diagnostic::ConflictingSpecifiedDate {
                ods_code: entity.ods_code.to_string(),
                dates: conflicts.clone(),
            });
        }

        let compare_hours = hours.is_valid();
        if !compare_hours {
            sink.record_event(&Diagnostic::InvalidOpeningTimes {
                ods_code: entity.ods_code.to_string(),
                service_id: None,
                side: Side::Nhs,
                detail: describe_invalid(hours.standard, hours.specified),
            });
        }

        Ok(Self {
            entity,
            hours,
            compare_hours,
            opening_times,
            palliative_care,
            sink,
            options,
        })
    }

    /// Whether opening-time keys are being compared.
    pub fn compares_hours(&self) -> bool {
        self.compare_hours
    }

    /// Compare against one service, filling in its hours and palliative
    /// flag first if they are not attached.
    pub fn compare(&self, service: &mut DosService) -> Result<ChangeSet, LookupError> {
        if self.compare_hours {
            if service.standard_opening_times.is_none() {
                service.standard_opening_times =
                    Some(self.opening_times.load_standard_hours(service.id)?);
            }
            if service.specified_opening_times.is_none() {
                service.specified_opening_times =
                    Some(self.opening_times.load_specified_hours(service.id)?);
            }
            self.check_service_hours(service);
        }

        if service.typeid == self.options.primary_type_id && service.palliative_care.is_none() {
            service.palliative_care = Some(self.palliative_care.has_palliative_care(service.id)?);
        }

        let hours = self.compare_hours.then_some(&self.hours);
        let changes = compute_changes(self.entity, service, hours, &self.options);
        if changes.contains(ChangeKey::SpecifiedOpeningTimes)
            && let Some(dos_specified) = &service.specified_opening_times
        {
            let moved =
                moved_specified_dates(self.hours.specified, dos_specified, self.options.today);
            info!(
                service_id = service.id,
                dates = ?moved,
                "specified opening times moved"
            );
        }
        debug!(
            service_id = service.id,
            changes = ?changes.keys(),
            "compared service"
        );
        Ok(changes)
    }

    fn check_service_hours(&self, service: &DosService) {
        let (Some(standard), Some(specified)) = (
            &service.standard_opening_times,
            &service.specified_opening_times,
        ) else {
            return;
        };
        if standard.is_valid() && valid_specified_list(specified) {
            return;
        }
        self.sink.record_event(&Diagnostic::InvalidOpeningTimes {
            ods_code: self.entity.ods_code.to_string(),
            service_id: Some(service.id),
            side: Side::Dos,
            detail: describe_invalid(standard, specified),
        });
    }
}

fn describe_invalid(standard: &StandardOpeningTimes, specified: &[SpecifiedOpeningTime]) -> String {
    let mut problems = Vec::new();
    if !standard.is_valid() {
        problems.push("overlapping standard opening times".to_string());
    }
    if !valid_specified_list(specified) {
        problems.push("invalid specified opening times".to_string());
    }
    problems.join("; ")
}
