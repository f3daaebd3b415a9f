//! Entity construction errors.

use crate::domain::{InvalidOdsCode, OpeningTimesError};

/// Why a change event could not be turned into an [`NhsEntity`](super::NhsEntity).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
    /// Payload was not valid JSON for a change event
    #[error("malformed change event: {0}")]
    Json(String),

    /// A required field was absent or blank
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    InvalidOdsCode(#[from] InvalidOdsCode),

    /// ODS code is not the length its organisation type requires
    #[error("ODS code {code:?} is not length {expected} as required for {org_type}")]
    OdsCodeLength {
        code: String,
        org_type: &'static str,
        expected: usize,
    },

    /// Organisation type outside the recognised set
    #[error("unexpected organisation type: {0:?}")]
    UnknownOrganisationType(String),

    /// Sub type not valid for the organisation type
    #[error("unexpected organisation sub type {sub_type:?} for {org_type}")]
    UnknownSubType {
        org_type: &'static str,
        sub_type: String,
    },

    #[error("unexpected organisation status: {0:?}")]
    UnknownStatus(String),

    #[error("unexpected opening time type: {0:?}")]
    UnknownOpeningTimeType(String),

    #[error("unexpected contact method: {0:?}")]
    UnknownContactMethod(String),

    /// An opening-time entry could not be parsed
    #[error("invalid opening times: {0}")]
    OpeningTimes(#[from] OpeningTimesError),
}
