//! NHS UK change event DTOs.
//!
//! These types map directly to the JSON the NHS UK feed sends. Almost every
//! field is optional: the feed omits or nulls fields freely, and the
//! required-field checks happen during conversion, not deserialisation.
//! Unknown keys are ignored.

use serde::Deserialize;

/// A change event describing one organisation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeEventPayload {
    /// Organisation code, e.g. "FXX11".
    #[serde(rename = "ODSCode")]
    pub ods_code: Option<String>,

    /// Display name, synced to the DoS public name.
    pub organisation_name: Option<String>,

    /// Organisation type, "PHA" or "Dentist".
    pub organisation_type_id: Option<String>,

    /// Sub type, e.g. "Community" for pharmacies.
    pub organisation_sub_type: Option<String>,

    /// "Visible", "Hidden" or "Closed". Absent means visible.
    pub organisation_status: Option<String>,

    pub address1: Option<String>,
    pub address2: Option<String>,
    pub address3: Option<String>,
    pub address4: Option<String>,
    pub address5: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub postcode: Option<String>,

    /// Flat website field, used when no website contact is listed.
    pub website: Option<String>,

    /// Flat phone field, used when no telephone contact is listed.
    pub phone: Option<String>,

    #[serde(default)]
    pub contacts: Vec<ContactDto>,

    #[serde(default)]
    pub opening_times: Vec<OpeningTimeDto>,

    /// Ancillary services the organisation offers.
    #[serde(default)]
    pub uec_services: Vec<UecServiceDto>,
}

/// One entry of the `Contacts` list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContactDto {
    /// e.g. "Primary".
    pub contact_type: Option<String>,

    /// "Website", "Telephone", "Email" or "Fax".
    #[serde(default)]
    pub contact_method_type: String,

    #[serde(default)]
    pub contact_value: String,
}

/// One entry of the `OpeningTimes` list.
///
/// Standard (weekly) entries carry a weekday and an empty
/// `AdditionalOpeningDate`; specified entries carry a date such as
/// "Dec 25 2025". The time range arrives either as `Times`
/// ("08:45-17:00") or as separate `OpeningTime`/`ClosingTime` fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OpeningTimeDto {
    #[serde(default)]
    pub weekday: String,

    pub times: Option<String>,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,

    /// "General" or "Surgery".
    #[serde(default)]
    pub opening_time_type: String,

    pub additional_opening_date: Option<String>,

    #[serde(default)]
    pub is_open: bool,
}

/// One entry of the `UecServices` list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UecServiceDto {
    /// NHS UK service code, e.g. "SRV0560".
    pub service_code: String,
    pub service_name: Option<String>,
}
