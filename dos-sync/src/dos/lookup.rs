//! Collaborator traits for reading DoS.
//!
//! The reconciliation core never talks to the database directly. Each trait
//! is a narrow, synchronous view of one query. Errors propagate to the
//! caller unchanged and are never retried here.

use crate::domain::{SpecifiedOpeningTime, StandardOpeningTimes};

use super::{DosLocation, DosService, LookupError};

/// Finds services by ODS code prefix.
pub trait ServiceLookup {
    /// Every service whose ODS code starts with `routing_key`.
    ///
    /// Result order carries no meaning.
    fn find_by_routing_prefix(&self, routing_key: &str) -> Result<Vec<DosService>, LookupError>;
}

/// Loads a service's stored opening times.
pub trait OpeningTimesLookup {
    fn load_standard_hours(&self, service_id: i64) -> Result<StandardOpeningTimes, LookupError>;

    /// One entry per date, in date order.
    fn load_specified_hours(
        &self,
        service_id: i64,
    ) -> Result<Vec<SpecifiedOpeningTime>, LookupError>;
}

/// Reads whether a service is flagged for palliative care.
pub trait PalliativeCareLookup {
    fn has_palliative_care(&self, service_id: i64) -> Result<bool, LookupError>;
}

/// Finds geocoded locations by postcode.
pub trait LocationLookup {
    /// Locations whose postcode normalises to the same value as `postcode`.
    fn find_by_postcode(&self, postcode: &str) -> Result<Vec<DosLocation>, LookupError>;
}
