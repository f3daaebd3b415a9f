//! Matching rules.

use crate::nhs::OrganisationType;

use super::service_type::{
    ACTIVE_STATUS_ID, AncillaryService, BLOOD_PRESSURE, CONTRACEPTION, DENTIST_TYPE_ID,
    PHARMACY_TYPE_ID, PHARMACY_URGENT_CARE_TYPE_ID,
};

/// Which DoS services count as a match for one organisation type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRules {
    /// The canonical type. More than one active match of this type is a
    /// profiling ambiguity.
    pub primary_type_id: i64,

    /// Every type id that may be updated from this organisation.
    pub accepted_type_ids: Vec<i64>,

    /// Ancillary services modelled as their own DoS records.
    pub ancillary_services: Vec<AncillaryService>,
}

impl TypeRules {
    pub fn accepts(&self, type_id: i64) -> bool {
        self.accepted_type_ids.contains(&type_id)
    }
}

/// Configuration for candidate selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingRules {
    pub pharmacy: TypeRules,
    pub dentist: TypeRules,

    /// Status id a service must have to be updated.
    pub active_status_id: i64,
}

impl MatchingRules {
    pub fn for_type(&self, org_type: OrganisationType) -> &TypeRules {
        match org_type {
            OrganisationType::Pharmacy => &self.pharmacy,
            OrganisationType::Dentist => &self.dentist,
        }
    }
}

impl Default for MatchingRules {
    fn default() -> Self {
        Self {
            pharmacy: TypeRules {
                primary_type_id: PHARMACY_TYPE_ID,
                accepted_type_ids: vec![
                    PHARMACY_TYPE_ID,
                    PHARMACY_URGENT_CARE_TYPE_ID,
                    BLOOD_PRESSURE.dos_type_id,
                    CONTRACEPTION.dos_type_id,
                ],
                ancillary_services: vec![BLOOD_PRESSURE, CONTRACEPTION],
            },
            dentist: TypeRules {
                primary_type_id: DENTIST_TYPE_ID,
                accepted_type_ids: vec![DENTIST_TYPE_ID],
                ancillary_services: Vec::new(),
            },
            active_status_id: ACTIVE_STATUS_ID,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules() {
        let rules = MatchingRules::default();
        let pharmacy = rules.for_type(OrganisationType::Pharmacy);
        assert_eq!(pharmacy.primary_type_id, 13);
        assert!(pharmacy.accepts(13));
        assert!(pharmacy.accepts(131));
        assert!(pharmacy.accepts(148));
        assert!(!pharmacy.accepts(12));

        let dentist = rules.for_type(OrganisationType::Dentist);
        assert!(dentist.accepts(12));
        assert!(dentist.ancillary_services.is_empty());
        assert_eq!(rules.active_status_id, 1);
    }
}
