//! The normalised NHS UK organisation.

use std::fmt;
use std::sync::OnceLock;

use crate::domain::{OdsCode, OpeningTimesError, SpecifiedGrouping, StandardOpeningTimes};

use super::EntityError;
use super::convert::{OpeningTimeRecord, convert_opening_time, extract_specified, extract_standard};
use super::kinds::{ContactMethod, OpeningTimeType, OrganisationStatus, OrganisationType};
use super::types::ChangeEventPayload;

/// An organisation as described by one NHS UK change event.
///
/// Contact and classification fields are public and plain. Opening hours are
/// kept as raw entries and parsed on first use; the parsed General hours
/// (or the parse error) are cached for the lifetime of the entity. The cache
/// is a [`OnceLock`], so concurrent first access computes once.
#[derive(Clone)]
pub struct NhsEntity {
    pub ods_code: OdsCode,
    pub organisation_name: String,
    pub organisation_type: OrganisationType,
    pub organisation_sub_type: String,
    pub status: OrganisationStatus,
    /// Non-blank `Address1`..`Address5`, in order.
    pub address_lines: Vec<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub postcode: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    /// NHS UK codes of the ancillary services offered.
    pub services: Vec<String>,
    opening_times: Vec<OpeningTimeRecord>,
    standard: OnceLock<Result<StandardOpeningTimes, OpeningTimesError>>,
    specified: OnceLock<Result<SpecifiedGrouping, OpeningTimesError>>,
}

impl NhsEntity {
    /// Build an entity from a deserialised change event.
    ///
    /// `ODSCode`, `OrganisationName`, `OrganisationTypeId` and
    /// `OrganisationSubType` are required, and the ODS code must be exactly
    /// the length its organisation type calls for. Closed vocabularies (type,
    /// sub type, status, contact method, opening time type) are checked here.
    /// Times and dates are not parsed until the hours are first read.
    pub fn try_from_payload(payload: ChangeEventPayload) -> Result<Self, EntityError> {
        let ods_code = required(payload.ods_code, "ODSCode")?;
        let ods_code = OdsCode::parse(&ods_code)?;
        let organisation_name = required(payload.organisation_name, "OrganisationName")?;
        let organisation_type =
            OrganisationType::parse(&required(payload.organisation_type_id, "OrganisationTypeId")?)?;

        let expected = organisation_type.ods_code_length();
        if ods_code.as_str().len() != expected {
            return Err(EntityError::OdsCodeLength {
                code: ods_code.as_str().to_string(),
                org_type: organisation_type.feed_id(),
                expected,
            });
        }

        let organisation_sub_type =
            required(payload.organisation_sub_type, "OrganisationSubType")?;
        organisation_type.validate_sub_type(&organisation_sub_type)?;

        let status = OrganisationStatus::parse(payload.organisation_status.as_deref())?;

        let address_lines = [
            payload.address1,
            payload.address2,
            payload.address3,
            payload.address4,
            payload.address5,
        ]
        .into_iter()
        .filter_map(non_blank)
        .collect();

        // Typed contacts take precedence over the flat fields
        let mut website = None;
        let mut phone = None;
        for contact in &payload.contacts {
            let value = contact.contact_value.trim();
            match ContactMethod::parse(&contact.contact_method_type)? {
                ContactMethod::Website if website.is_none() && !value.is_empty() => {
                    website = Some(value.to_string());
                }
                ContactMethod::Telephone if phone.is_none() && !value.is_empty() => {
                    phone = Some(value.to_string());
                }
                _ => {}
            }
        }
        let website = website.or_else(|| non_blank(payload.website));
        let phone = phone.or_else(|| non_blank(payload.phone));

        let opening_times = payload
            .opening_times
            .iter()
            .map(convert_opening_time)
            .collect::<Result<Vec<_>, _>>()?;

        let services = payload
            .uec_services
            .into_iter()
            .map(|s| s.service_code.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            ods_code,
            organisation_name,
            organisation_type,
            organisation_sub_type,
            status,
            address_lines,
            city: non_blank(payload.city),
            county: non_blank(payload.county),
            postcode: non_blank(payload.postcode),
            website,
            phone,
            services,
            opening_times,
            standard: OnceLock::new(),
            specified: OnceLock::new(),
        })
    }

    /// Parse and build an entity from change event JSON.
    pub fn from_json(json: &str) -> Result<Self, EntityError> {
        let payload: ChangeEventPayload =
            serde_json::from_str(json).map_err(|e| EntityError::Json(e.to_string()))?;
        Self::try_from_payload(payload)
    }

    /// First five characters of the ODS code.
    pub fn routing_key(&self) -> &str {
        self.ods_code.routing_key()
    }

    /// True if the entity lists the given NHS UK service code.
    pub fn check_for_service(&self, service_code: &str) -> bool {
        self.services.iter().any(|s| s == service_code)
    }

    /// True unless the organisation is hidden or closed.
    pub fn is_visible(&self) -> bool {
        self.status == OrganisationStatus::Visible
    }

    /// General weekly hours, parsed on first call.
    pub fn standard_opening_times(&self) -> Result<&StandardOpeningTimes, OpeningTimesError> {
        self.standard
            .get_or_init(|| extract_standard(&self.opening_times, OpeningTimeType::General))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// General date-specific hours, parsed on first call.
    pub fn specified_opening_times(&self) -> Result<&SpecifiedGrouping, OpeningTimesError> {
        self.specified
            .get_or_init(|| extract_specified(&self.opening_times, OpeningTimeType::General))
            .as_ref()
            .map_err(Clone::clone)
    }
}

impl fmt::Debug for NhsEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<NhsEntity: name={} odscode={}>",
            self.organisation_name, self.ods_code
        )
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn required(value: Option<String>, field: &'static str) -> Result<String, EntityError> {
    non_blank(value).ok_or(EntityError::MissingField(field))
}
