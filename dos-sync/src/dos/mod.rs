//! The DoS (Directory of Services) side of a reconciliation.
//!
//! DoS is the downstream database being corrected. This module models its
//! service and location rows, the collaborator traits used to query it, and
//! a JSON fixture store that implements those traits.

mod error;
mod json_store;
mod location;
mod lookup;
mod schema;
mod service;

pub use error::{LookupError, RecordError};
pub use json_store::JsonDos;
pub use location::DosLocation;
pub use lookup::{LocationLookup, OpeningTimesLookup, PalliativeCareLookup, ServiceLookup};
pub use schema::{
    Column, ColumnKind, ColumnValue, SERVICE_COLUMNS, ServiceRow, check_header,
};
pub use service::{ADDRESS_SEPARATOR, DosService, NO_VALID_NAME, join_address};
