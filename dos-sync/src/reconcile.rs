//! The reconciliation pipeline.
//!
//! One change event is taken from raw JSON to a batch of sent change
//! requests:
//!
//! 1. normalise the event into an [`NhsEntity`]
//! 2. check the organisation type is accepted
//! 3. find DoS candidates by routing key and select the targets
//! 4. compare each target and validate any postcode change
//! 5. assemble every request, then send them
//!
//! All I/O goes through the collaborators in [`Collaborators`]. Nothing is
//! sent until every request has been assembled, so a failure part way
//! through never leaves a partial batch behind.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::LocationCache;
use crate::changes::{ChangeKey, ChangeSet, Comparator, CompareOptions, EntityHours};
use crate::config::SyncConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::dos::{
    DosService, LocationLookup, LookupError, OpeningTimesLookup, PalliativeCareLookup,
    ServiceLookup,
};
use crate::matching::{
    FeatureFlags, MatchingRules, PolicyError, Selection, find_candidates, log_missing_dos_services,
    org_type_accepted, remove_service_if_not_on_change_event, select_primary,
};
use crate::nhs::{EntityError, NhsEntity, OrganisationType};
use crate::request::{
    ChangeRequest, ChangeRequestSender, RequestError, RoutingContext, TransportError,
    assemble_batch,
};

/// A collaborator failed; nothing was retried.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("dos lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("policy evaluation failed: {0}")]
    Policy(#[from] PolicyError),

    #[error("sending change request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("assembling change request failed: {0}")]
    Request(#[from] RequestError),
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("invalid change event: {0}")]
    Validation(#[from] EntityError),

    #[error("organisation type {0} is not accepted")]
    OrgTypeNotAccepted(OrganisationType),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl From<LookupError> for ReconcileError {
    fn from(e: LookupError) -> Self {
        ReconcileError::Collaborator(e.into())
    }
}

impl From<PolicyError> for ReconcileError {
    fn from(e: PolicyError) -> Self {
        ReconcileError::Collaborator(e.into())
    }
}

impl From<TransportError> for ReconcileError {
    fn from(e: TransportError) -> Self {
        ReconcileError::Collaborator(e.into())
    }
}

impl From<RequestError> for ReconcileError {
    fn from(e: RequestError) -> Self {
        ReconcileError::Collaborator(e.into())
    }
}

/// How a reconciliation ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No DoS service shares the routing key, or none is an active service
    /// of an accepted type.
    NoTargets,

    /// The organisation is hidden or closed; nothing was sent.
    ClosedOrHidden { service_ids: Vec<i64> },

    /// More than one primary service and ambiguity not tolerated.
    Ambiguous { service_ids: Vec<i64> },

    /// Requests for every target with at least one change. Either list may
    /// be empty.
    Sent {
        requests: Vec<ChangeRequest>,
        dead_lettered: Vec<ChangeRequest>,
    },
}

/// Everything the pipeline talks to.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub services: &'a dyn ServiceLookup,
    pub opening_times: &'a dyn OpeningTimesLookup,
    pub palliative_care: &'a dyn PalliativeCareLookup,
    pub locations: &'a dyn LocationLookup,
    pub flags: &'a dyn FeatureFlags,
    pub sender: &'a dyn ChangeRequestSender,
    pub sink: &'a dyn DiagnosticSink,
}

impl<'a> Collaborators<'a> {
    /// Use one store for every DoS lookup.
    pub fn from_store<D>(
        dos: &'a D,
        flags: &'a dyn FeatureFlags,
        sender: &'a dyn ChangeRequestSender,
        sink: &'a dyn DiagnosticSink,
    ) -> Self
    where
        D: ServiceLookup + OpeningTimesLookup + PalliativeCareLookup + LocationLookup,
    {
        Self {
            services: dos,
            opening_times: dos,
            palliative_care: dos,
            locations: dos,
            flags,
            sender,
            sink,
        }
    }
}

/// Runs the pipeline for one change event at a time.
///
/// Holds the only state shared between events: the rules, the config and
/// the location cache.
pub struct Reconciler {
    rules: MatchingRules,
    config: SyncConfig,
    locations: LocationCache,
}

impl Reconciler {
    pub fn new(rules: MatchingRules, config: SyncConfig) -> Self {
        let locations = LocationCache::new(&config.cache);
        Self::with_cache(rules, config, locations)
    }

    /// Share an existing location cache.
    pub fn with_cache(rules: MatchingRules, config: SyncConfig, locations: LocationCache) -> Self {
        Self {
            rules,
            config,
            locations,
        }
    }

    pub fn rules(&self) -> &MatchingRules {
        &self.rules
    }

    /// Normalise a raw change event and reconcile it.
    pub fn reconcile_payload(
        &self,
        json: &str,
        routing: &RoutingContext,
        today: NaiveDate,
        collaborators: Collaborators<'_>,
    ) -> Result<Outcome, ReconcileError> {
        let entity = match NhsEntity::from_json(json) {
            Ok(entity) => entity,
            Err(e) => {
                collaborators.sink.record_event(&Diagnostic::ValidationFailed {
                    ods_code: raw_ods_code(json),
                    error: e.to_string(),
                });
                return Err(e.into());
            }
        };
        self.reconcile(&entity, routing, today, collaborators)
    }

    /// Reconcile one entity against DoS and send the resulting requests.
    pub fn reconcile(
        &self,
        entity: &NhsEntity,
        routing: &RoutingContext,
        today: NaiveDate,
        collaborators: Collaborators<'_>,
    ) -> Result<Outcome, ReconcileError> {
        let sink = collaborators.sink;
        info!(
            ods_code = %entity.ods_code,
            correlation_id = %routing.correlation_id,
            sequence_number = routing.sequence_number,
            "reconciling change event"
        );

        if !org_type_accepted(entity, collaborators.flags)? {
            sink.record_event(&Diagnostic::ValidationFailed {
                ods_code: entity.ods_code.to_string(),
                error: format!(
                    "organisation type {} is not accepted",
                    entity.organisation_type
                ),
            });
            return Err(ReconcileError::OrgTypeNotAccepted(entity.organisation_type));
        }

        if let Err(e) = EntityHours::of(entity) {
            sink.record_event(&Diagnostic::ValidationFailed {
                ods_code: entity.ods_code.to_string(),
                error: e.to_string(),
            });
            return Err(EntityError::from(e).into());
        }

        let candidates = find_candidates(collaborators.services, entity)?;
        if candidates.is_empty() {
            sink.record_event(&Diagnostic::UnmatchedEntity {
                ods_code: entity.ods_code.to_string(),
                routing_key: entity.routing_key().to_string(),
            });
            info!(ods_code = %entity.ods_code, "no matching DoS services");
            return Ok(Outcome::NoTargets);
        }

        if !entity.is_visible() {
            let service_ids: Vec<i64> = candidates.iter().map(|s| s.id).collect();
            sink.record_event(&Diagnostic::ClosedOrHiddenEntity {
                ods_code: entity.ods_code.to_string(),
                status: entity.status,
                service_ids: service_ids.clone(),
            });
            return Ok(Outcome::ClosedOrHidden { service_ids });
        }

        let candidate_ids: Vec<i64> = candidates.iter().map(|s| s.id).collect();
        let mut targets =
            match select_primary(candidates, entity, &self.rules, collaborators.flags, sink) {
                Selection::Selected(services) => services,
                Selection::Ambiguous { service_ids } => {
                    return Ok(Outcome::Ambiguous { service_ids });
                }
                Selection::NoneAccepted => {
                    sink.record_event(&Diagnostic::NoPrimaryService {
                        ods_code: entity.ods_code.to_string(),
                        candidate_ids,
                    });
                    return Ok(Outcome::NoTargets);
                }
            };

        let type_rules = self.rules.for_type(entity.organisation_type);
        for ancillary in &type_rules.ancillary_services {
            targets = remove_service_if_not_on_change_event(targets, entity, ancillary);
            log_missing_dos_services(entity, &targets, ancillary, sink);
        }

        let comparator = Comparator::new(
            entity,
            collaborators.opening_times,
            collaborators.palliative_care,
            sink,
            CompareOptions {
                today,
                primary_type_id: type_rules.primary_type_id,
            },
        )
        .map_err(EntityError::from)?;

        let mut batch = Vec::new();
        for service in &mut targets {
            let mut changes = comparator.compare(service)?;
            self.check_postcode(entity, service, &mut changes, collaborators)?;
            if changes.is_empty() {
                debug!(service_id = service.id, "service already up to date");
                continue;
            }
            batch.push((service.id, changes));
        }

        let requests = assemble_batch(entity.ods_code.as_str(), batch, routing)?;
        self.send_all(requests, collaborators.sender)
    }

    /// Drop a postcode change DoS has no geocoded location for, along with
    /// the address it belongs to.
    fn check_postcode(
        &self,
        entity: &NhsEntity,
        service: &DosService,
        changes: &mut ChangeSet,
        collaborators: Collaborators<'_>,
    ) -> Result<(), LookupError> {
        let Some(postcode) = entity.postcode.as_deref() else {
            return Ok(());
        };
        if !changes.contains(ChangeKey::Postcode) {
            return Ok(());
        }
        if !self
            .locations
            .valid_locations(collaborators.locations, postcode)?
            .is_empty()
        {
            return Ok(());
        }

        changes.remove(ChangeKey::Postcode);
        changes.remove(ChangeKey::Address);
        collaborators.sink.record_event(&Diagnostic::InvalidPostcode {
            ods_code: entity.ods_code.to_string(),
            service_id: service.id,
            postcode: postcode.to_string(),
        });
        Ok(())
    }

    fn send_all(
        &self,
        requests: Vec<ChangeRequest>,
        sender: &dyn ChangeRequestSender,
    ) -> Result<Outcome, ReconcileError> {
        let mut sent = Vec::new();
        let mut dead_lettered = Vec::new();

        for request in requests {
            let size = request.encoded_len()?;
            if size > self.config.max_payload_bytes {
                let reason = format!(
                    "change request is {size} bytes, limit is {}",
                    self.config.max_payload_bytes
                );
                warn!(service_id = request.service_id, %reason, "dead-lettering change request");
                sender.send_to_dead_letter(&request, &reason)?;
                dead_lettered.push(request);
            } else {
                sender.send(&request)?;
                info!(
                    service_id = request.service_id,
                    changes = ?request.changes.keys(),
                    "sent change request"
                );
                sent.push(request);
            }
        }

        Ok(Outcome::Sent {
            requests: sent,
            dead_lettered,
        })
    }
}

/// Best-effort ODS code from an event that did not normalise.
fn raw_ods_code(json: &str) -> String {
    serde_json::from_str::<serde_json::Value>(json)
        .ok()
        .and_then(|v| v.get("ODSCode").and_then(|c| c.as_str()).map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticKind, RecordingSink};
    use crate::domain::{SpecifiedOpeningTime, StandardOpeningTimes, Weekday};
    use crate::dos::{DosLocation, join_address};
    use crate::matching::{FlagRule, StaticFlags, TOLERATE_PROFILING_AMBIGUITY};
    use crate::request::CollectingSender;
    use serde_json::json;

    #[derive(Default)]
    struct MemoryDos {
        services: Vec<DosService>,
        locations: Vec<DosLocation>,
        broken: bool,
    }

    impl ServiceLookup for MemoryDos {
        fn find_by_routing_prefix(&self, key: &str) -> Result<Vec<DosService>, LookupError> {
            if self.broken {
                return Err(LookupError::Unavailable("db down".into()));
            }
            Ok(self
                .services
                .iter()
                .filter(|s| s.routing_key() == Some(key))
                .cloned()
                .collect())
        }
    }

    impl OpeningTimesLookup for MemoryDos {
        fn load_standard_hours(&self, _id: i64) -> Result<StandardOpeningTimes, LookupError> {
            let mut hours = StandardOpeningTimes::new();
            hours.add_open_period("09:00-17:00".parse().unwrap(), Weekday::Monday);
            Ok(hours)
        }

        fn load_specified_hours(&self, _id: i64) -> Result<Vec<SpecifiedOpeningTime>, LookupError> {
            Ok(Vec::new())
        }
    }

    impl PalliativeCareLookup for MemoryDos {
        fn has_palliative_care(&self, _id: i64) -> Result<bool, LookupError> {
            Ok(false)
        }
    }

    impl LocationLookup for MemoryDos {
        fn find_by_postcode(&self, postcode: &str) -> Result<Vec<DosLocation>, LookupError> {
            Ok(self
                .locations
                .iter()
                .filter(|l| l.normal_postcode() == crate::domain::normalise_postcode(postcode))
                .cloned()
                .collect())
        }
    }

    fn service(id: i64, odscode: &str, typeid: i64) -> DosService {
        let mut s = DosService::new(id, odscode, typeid, 1);
        s.publicname = Some("Test Pharmacy".into());
        s.web = Some("www.test.com".into());
        s.publicphone = Some("01234 567890".into());
        s.address = Some(join_address(&["1 High Street".into()]));
        s.postcode = Some("TE5 7ER".into());
        s
    }

    fn location(postcode: &str) -> DosLocation {
        DosLocation {
            id: 1,
            postcode: postcode.into(),
            easting: Some(1),
            northing: Some(2),
            latitude: Some(53.0),
            longitude: Some(-1.0),
            postaltown: None,
        }
    }

    fn event() -> serde_json::Value {
        json!({
            "ODSCode": "FXX11",
            "OrganisationName": "Test Pharmacy",
            "OrganisationTypeId": "PHA",
            "OrganisationSubType": "Community",
            "Address1": "1 High Street",
            "Postcode": "TE5 7ER",
            "Website": "www.test.com",
            "Phone": "01234 567890",
            "OpeningTimes": [
                {"Weekday": "Monday", "Times": "09:00-17:00", "OpeningTimeType": "General",
                 "AdditionalOpeningDate": "", "IsOpen": true}
            ]
        })
    }

    fn routing() -> RoutingContext {
        RoutingContext {
            correlation_id: "corr".into(),
            sequence_number: 3,
            message_received: 0,
            record_id: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    struct Harness {
        dos: MemoryDos,
        flags: StaticFlags,
        sender: CollectingSender,
        sink: RecordingSink,
        reconciler: Reconciler,
    }

    impl Harness {
        fn new(services: Vec<DosService>) -> Self {
            Self {
                dos: MemoryDos {
                    services,
                    locations: vec![location("TE5 7ER")],
                    broken: false,
                },
                flags: StaticFlags::default(),
                sender: CollectingSender::new(),
                sink: RecordingSink::new(),
                reconciler: Reconciler::new(MatchingRules::default(), SyncConfig::default()),
            }
        }

        fn run(&self, event: &serde_json::Value) -> Result<Outcome, ReconcileError> {
            let collaborators =
                Collaborators::from_store(&self.dos, &self.flags, &self.sender, &self.sink);
            self.reconciler
                .reconcile_payload(&event.to_string(), &routing(), today(), collaborators)
        }
    }

    fn sent(outcome: Outcome) -> Vec<ChangeRequest> {
        match outcome {
            Outcome::Sent { requests, .. } => requests,
            other => panic!("expected sent, got {other:?}"),
        }
    }

    #[test]
    fn up_to_date_sends_nothing() {
        let h = Harness::new(vec![service(1, "FXX11", 13)]);
        assert!(sent(h.run(&event()).unwrap()).is_empty());
        assert!(h.sender.sent().is_empty());
        assert!(h.sink.events().is_empty());
    }

    #[test]
    fn website_change_is_sent() {
        let h = Harness::new(vec![service(1, "FXX11", 13)]);
        let mut e = event();
        e["Website"] = json!("www.new.com");

        let requests = sent(h.run(&e).unwrap());
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].changes.keys(), vec![ChangeKey::Website]);
        assert_eq!(requests[0].entry_id, "1-3");
        assert_eq!(h.sender.sent(), requests);
    }

    #[test]
    fn no_candidates_is_no_targets() {
        let h = Harness::new(vec![service(1, "FYY22", 13)]);
        assert_eq!(h.run(&event()).unwrap(), Outcome::NoTargets);
        assert_eq!(h.sink.kinds(), vec![DiagnosticKind::UnmatchedEntity]);
    }

    #[test]
    fn inactive_candidates_are_no_targets() {
        let mut closed = service(1, "FXX11", 13);
        closed.statusid = 2;
        let h = Harness::new(vec![closed]);
        assert_eq!(h.run(&event()).unwrap(), Outcome::NoTargets);
        assert_eq!(h.sink.kinds(), vec![DiagnosticKind::NoPrimaryService]);
    }

    #[test]
    fn hidden_entity_sends_nothing() {
        let h = Harness::new(vec![service(1, "FXX11", 13)]);
        let mut e = event();
        e["OrganisationStatus"] = json!("Hidden");
        e["Website"] = json!("www.new.com");
        assert_eq!(
            h.run(&e).unwrap(),
            Outcome::ClosedOrHidden {
                service_ids: vec![1]
            }
        );
        assert!(h.sender.sent().is_empty());
    }

    #[test]
    fn ambiguity_stops_pipeline() {
        let h = Harness::new(vec![service(1, "FXX11", 13), service(2, "FXX11001", 13)]);
        assert_eq!(
            h.run(&event()).unwrap(),
            Outcome::Ambiguous {
                service_ids: vec![1, 2]
            }
        );
        assert_eq!(h.sink.kinds(), vec![DiagnosticKind::ProfilingAmbiguity]);
    }

    #[test]
    fn tolerated_ambiguity_updates_both() {
        let mut h = Harness::new(vec![service(1, "FXX11", 13), service(2, "FXX11001", 13)]);
        h.flags = StaticFlags::default().with(TOLERATE_PROFILING_AMBIGUITY, FlagRule::Always(true));
        let mut e = event();
        e["Phone"] = json!("0999");
        let requests = sent(h.run(&e).unwrap());
        assert_eq!(
            requests.iter().map(|r| r.service_id).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn invalid_event_is_validation_error() {
        let h = Harness::new(vec![service(1, "FXX11", 13)]);
        let mut e = event();
        e["OrganisationName"] = json!("");
        assert!(matches!(
            h.run(&e),
            Err(ReconcileError::Validation(EntityError::MissingField(_)))
        ));
        assert_eq!(
            h.sink.events(),
            vec![Diagnostic::ValidationFailed {
                ods_code: "FXX11".into(),
                error: "missing required field: OrganisationName".into(),
            }]
        );
    }

    #[test]
    fn unparseable_hours_are_validation_error() {
        let h = Harness::new(vec![service(1, "FXX11", 13)]);
        let mut e = event();
        e["OpeningTimes"][0]["Times"] = json!("nine till five");
        assert!(matches!(h.run(&e), Err(ReconcileError::Validation(_))));
        assert_eq!(h.sink.kinds(), vec![DiagnosticKind::ValidationFailed]);
        assert!(h.sender.sent().is_empty());
    }

    #[test]
    fn rejected_org_type() {
        let mut h = Harness::new(vec![service(1, "FXX11", 13)]);
        h.flags = StaticFlags::default().with(
            crate::matching::ACCEPTED_ORG_TYPES,
            FlagRule::ContextIn {
                key: "org_type".into(),
                values: vec!["Dentist".into()],
            },
        );
        assert!(matches!(
            h.run(&event()),
            Err(ReconcileError::OrgTypeNotAccepted(OrganisationType::Pharmacy))
        ));
    }

    #[test]
    fn lookup_failure_propagates() {
        let mut h = Harness::new(vec![service(1, "FXX11", 13)]);
        h.dos.broken = true;
        let err = h.run(&event()).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Collaborator(CollaboratorError::Lookup(_))
        ));
        assert_eq!(err.to_string(), "dos lookup failed: lookup unavailable: db down");
    }

    #[test]
    fn unknown_postcode_drops_postcode_and_address() {
        let h = Harness::new(vec![service(1, "FXX11", 13)]);
        let mut e = event();
        e["Postcode"] = json!("AB1 2CD");
        e["Address1"] = json!("2 Low Street");
        e["Website"] = json!("www.new.com");

        let requests = sent(h.run(&e).unwrap());
        assert_eq!(requests[0].changes.keys(), vec![ChangeKey::Website]);
        assert_eq!(h.sink.kinds(), vec![DiagnosticKind::InvalidPostcode]);
    }

    #[test]
    fn known_postcode_change_is_kept() {
        let mut h = Harness::new(vec![service(1, "FXX11", 13)]);
        h.dos.locations.push(location("AB1 2CD"));
        let mut e = event();
        e["Postcode"] = json!("AB1 2CD");

        let requests = sent(h.run(&e).unwrap());
        assert_eq!(requests[0].changes.keys(), vec![ChangeKey::Postcode]);
    }

    #[test]
    fn oversized_request_is_dead_lettered() {
        let mut h = Harness::new(vec![service(1, "FXX11", 13)]);
        h.reconciler = Reconciler::new(
            MatchingRules::default(),
            SyncConfig {
                max_payload_bytes: 10,
                ..SyncConfig::default()
            },
        );
        let mut e = event();
        e["Website"] = json!("www.new.com");

        match h.run(&e).unwrap() {
            Outcome::Sent {
                requests,
                dead_lettered,
            } => {
                assert!(requests.is_empty());
                assert_eq!(dead_lettered.len(), 1);
            }
            other => panic!("expected sent, got {other:?}"),
        }
        assert!(h.sender.sent().is_empty());
        assert!(h.sender.dead_letters()[0].1.contains("limit is 10"));
    }

    #[test]
    fn error_display() {
        assert_eq!(
            ReconcileError::OrgTypeNotAccepted(OrganisationType::Dentist).to_string(),
            "organisation type Dentist is not accepted"
        );
    }
}
