//! Matching an NHS UK organisation to its DoS services.

mod config;
mod policy;
mod select;
mod service_type;

pub use config::{MatchingRules, TypeRules};
pub use policy::{
    ACCEPTED_ORG_TYPES, FeatureFlags, FlagContext, FlagRule, PolicyError, StaticFlags,
    TOLERATE_PROFILING_AMBIGUITY, context,
};
pub use select::{
    Selection, find_candidates, log_missing_dos_services, org_type_accepted,
    remove_service_if_not_on_change_event, select_primary,
};
pub use service_type::{
    ACTIVE_STATUS_ID, AncillaryService, BLOOD_PRESSURE, CONTRACEPTION, DENTIST_TYPE_ID,
    PALLIATIVE_CARE_CODE, PHARMACY_TYPE_ID, PHARMACY_URGENT_CARE_TYPE_ID,
};
