//! DoS service classifications.

/// DoS status id of an active service.
pub const ACTIVE_STATUS_ID: i64 = 1;

/// DoS type id of a community pharmacy.
pub const PHARMACY_TYPE_ID: i64 = 13;

/// DoS type id of a pharmacy urgent-care service.
pub const PHARMACY_URGENT_CARE_TYPE_ID: i64 = 131;

/// DoS type id of a dental practice.
pub const DENTIST_TYPE_ID: i64 = 12;

/// NHS UK code for palliative care.
pub const PALLIATIVE_CARE_CODE: &str = "SRV0559";

/// A service NHS UK lists on an organisation and DoS models as a separate
/// service record of its own type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AncillaryService {
    pub name: &'static str,
    pub dos_type_id: i64,
    pub nhs_uk_service_code: &'static str,
}

pub const BLOOD_PRESSURE: AncillaryService = AncillaryService {
    name: "Blood Pressure",
    dos_type_id: 148,
    nhs_uk_service_code: "SRV0560",
};

pub const CONTRACEPTION: AncillaryService = AncillaryService {
    name: "Contraception",
    dos_type_id: 149,
    nhs_uk_service_code: "SRV2000",
};
