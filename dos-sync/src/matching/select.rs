//! Candidate lookup and selection.
//!
//! An organisation is matched to DoS services by the first five characters
//! of its ODS code. That prefix match is deliberately loose, so the
//! candidates are then filtered by type and status, checked for profiling
//! ambiguity, and pruned of ancillary services the organisation no longer
//! offers.

use tracing::{debug, info, warn};

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::dos::{DosService, LookupError, ServiceLookup};
use crate::nhs::NhsEntity;

use super::config::MatchingRules;
use super::policy::{
    ACCEPTED_ORG_TYPES, FeatureFlags, PolicyError, TOLERATE_PROFILING_AMBIGUITY, context,
};
use super::service_type::AncillaryService;

/// Result of filtering candidates down to update targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Services to compare and update.
    Selected(Vec<DosService>),
    /// More than one active primary service and ambiguity not tolerated.
    Ambiguous { service_ids: Vec<i64> },
    /// No candidate is an active service of an accepted type.
    NoneAccepted,
}

/// Every DoS service sharing the entity's routing key.
pub fn find_candidates(
    lookup: &dyn ServiceLookup,
    entity: &NhsEntity,
) -> Result<Vec<DosService>, LookupError> {
    let candidates = lookup.find_by_routing_prefix(entity.routing_key())?;
    debug!(
        ods_code = %entity.ods_code,
        count = candidates.len(),
        "found candidate services"
    );
    Ok(candidates)
}

/// Whether the policy accepts the entity's organisation type.
pub fn org_type_accepted(entity: &NhsEntity, flags: &dyn FeatureFlags) -> Result<bool, PolicyError> {
    flags.evaluate(
        ACCEPTED_ORG_TYPES,
        &context("org_type", entity.organisation_type.feed_id()),
    )
}

/// Keep active candidates of an accepted type, and check for ambiguity.
///
/// More than one surviving candidate of the primary type is reported to
/// `sink`. The selection then proceeds only if the ambiguity flag evaluates
/// true; if the flag cannot be evaluated the ambiguity is not tolerated.
pub fn select_primary(
    candidates: Vec<DosService>,
    entity: &NhsEntity,
    rules: &MatchingRules,
    flags: &dyn FeatureFlags,
    sink: &dyn DiagnosticSink,
) -> Selection {
    let type_rules = rules.for_type(entity.organisation_type);
    let retained: Vec<DosService> = candidates
        .into_iter()
        .filter(|s| s.statusid == rules.active_status_id && type_rules.accepts(s.typeid))
        .collect();

    if retained.is_empty() {
        return Selection::NoneAccepted;
    }

    let primary_ids: Vec<i64> = retained
        .iter()
        .filter(|s| s.typeid == type_rules.primary_type_id)
        .map(|s| s.id)
        .collect();

    if primary_ids.len() > 1 {
        let tolerated = match flags.evaluate(
            TOLERATE_PROFILING_AMBIGUITY,
            &context("ods_code", entity.ods_code.as_str()),
        ) {
            Ok(tolerated) => tolerated,
            Err(e) => {
                warn!(error = %e, "ambiguity flag unavailable, treating as not tolerated");
                false
            }
        };

        sink.record_event(&Diagnostic::ProfilingAmbiguity {
            ods_code: entity.ods_code.to_string(),
            service_ids: primary_ids.clone(),
            tolerated,
        });

        if !tolerated {
            return Selection::Ambiguous {
                service_ids: primary_ids,
            };
        }
    }

    Selection::Selected(retained)
}

/// Drop services of an ancillary type the entity does not list.
///
/// NHS UK is the source of truth for which ancillary services exist, so a
/// DoS record for one it no longer lists is not a target.
pub fn remove_service_if_not_on_change_event(
    services: Vec<DosService>,
    entity: &NhsEntity,
    ancillary: &AncillaryService,
) -> Vec<DosService> {
    if entity.check_for_service(ancillary.nhs_uk_service_code) {
        return services;
    }
    let before = services.len();
    let kept: Vec<DosService> = services
        .into_iter()
        .filter(|s| s.typeid != ancillary.dos_type_id)
        .collect();
    if kept.len() != before {
        info!(
            service = ancillary.name,
            removed = before - kept.len(),
            "removed services not listed on the change event"
        );
    }
    kept
}

/// Report an ancillary service the entity lists but DoS has no record of.
pub fn log_missing_dos_services(
    entity: &NhsEntity,
    matched: &[DosService],
    ancillary: &AncillaryService,
    sink: &dyn DiagnosticSink,
) {
    if !entity.check_for_service(ancillary.nhs_uk_service_code) {
        return;
    }
    if matched.iter().any(|s| s.typeid == ancillary.dos_type_id) {
        return;
    }
    sink.record_event(&Diagnostic::MissingDosService {
        ods_code: entity.ods_code.to_string(),
        service_name: ancillary.name.to_string(),
        dos_type_id: ancillary.dos_type_id,
    });
}
