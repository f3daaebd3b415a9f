//! Closed vocabularies used by the NHS UK feed.
//!
//! The feed sends these as free text. Each is parsed once at the boundary so
//! that an unexpected value fails entity construction instead of falling
//! through a string comparison later.

use std::fmt;

use serde::Serialize;

use super::EntityError;

/// Which set of hours an opening-time entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpeningTimeType {
    /// Public-facing hours.
    General,
    /// Restricted clinical hours. Not synced unless asked for.
    Surgery,
}

impl OpeningTimeType {
    pub fn parse(s: &str) -> Result<Self, EntityError> {
        match s.trim() {
            "General" => Ok(Self::General),
            "Surgery" => Ok(Self::Surgery),
            other => Err(EntityError::UnknownOpeningTimeType(other.to_string())),
        }
    }
}

/// Listing status of an organisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OrganisationStatus {
    Visible,
    Hidden,
    Closed,
}

impl OrganisationStatus {
    /// Parse a status, ignoring case. An absent status means visible.
    pub fn parse(s: Option<&str>) -> Result<Self, EntityError> {
        let Some(s) = s else {
            return Ok(Self::Visible);
        };
        match s.trim().to_ascii_lowercase().as_str() {
            "visible" => Ok(Self::Visible),
            "hidden" => Ok(Self::Hidden),
            "closed" => Ok(Self::Closed),
            _ => Err(EntityError::UnknownStatus(s.to_string())),
        }
    }
}

/// How a contact entry is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactMethod {
    Website,
    Telephone,
    Email,
    Fax,
}

impl ContactMethod {
    pub fn parse(s: &str) -> Result<Self, EntityError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "website" => Ok(Self::Website),
            "telephone" => Ok(Self::Telephone),
            "email" => Ok(Self::Email),
            "fax" => Ok(Self::Fax),
            _ => Err(EntityError::UnknownContactMethod(s.to_string())),
        }
    }
}

/// The kind of organisation a change event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OrganisationType {
    /// Feed id "PHA".
    Pharmacy,
    /// Feed id "Dentist".
    Dentist,
}

impl OrganisationType {
    pub const ALL: [OrganisationType; 2] = [OrganisationType::Pharmacy, OrganisationType::Dentist];

    /// Parse the feed's `OrganisationTypeId`. Case-sensitive, as sent.
    pub fn parse(s: &str) -> Result<Self, EntityError> {
        Self::ALL
            .into_iter()
            .find(|t| t.feed_id() == s.trim())
            .ok_or_else(|| EntityError::UnknownOrganisationType(s.to_string()))
    }

    /// The id the feed uses for this type.
    pub fn feed_id(&self) -> &'static str {
        match self {
            OrganisationType::Pharmacy => "PHA",
            OrganisationType::Dentist => "Dentist",
        }
    }

    /// Exact length of a valid ODS code for this type.
    pub fn ods_code_length(&self) -> usize {
        match self {
            OrganisationType::Pharmacy => 5,
            OrganisationType::Dentist => 7,
        }
    }

    /// Sub types the feed may send with this type.
    pub fn sub_types(&self) -> &'static [&'static str] {
        match self {
            OrganisationType::Pharmacy => &["Community"],
            OrganisationType::Dentist => &["TBA"],
        }
    }

    /// Check a sub type belongs to this organisation type.
    pub fn validate_sub_type(&self, sub_type: &str) -> Result<(), EntityError> {
        if self.sub_types().contains(&sub_type) {
            Ok(())
        } else {
            Err(EntityError::UnknownSubType {
                org_type: self.feed_id(),
                sub_type: sub_type.to_string(),
            })
        }
    }
}

impl fmt::Display for OrganisationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.feed_id())
    }
}
