//! NHS UK change events.
//!
//! The NHS UK feed is the source of truth for an organisation's public
//! details. This module deserialises its change events and normalises them
//! into an [`NhsEntity`].

mod convert;
mod entity;
mod error;
mod kinds;
mod types;

pub use convert::{OpeningTimeRecord, convert_opening_time, extract_specified, extract_standard};
pub use entity::NhsEntity;
pub use error::EntityError;
pub use kinds::{ContactMethod, OpeningTimeType, OrganisationStatus, OrganisationType};
pub use types::{ChangeEventPayload, ContactDto, OpeningTimeDto, UecServiceDto};
