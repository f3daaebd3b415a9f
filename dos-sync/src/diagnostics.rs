//! Anomaly reporting.
//!
//! Some conditions are worth telling a human about but are not errors: a
//! pharmacy profiled twice in DoS, an ancillary service NHS UK lists that
//! DoS lacks, opening times that overlap. These are recorded through a
//! [`DiagnosticSink`], which never fails and never blocks the pipeline.

use std::fmt;
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::nhs::OrganisationStatus;

/// Which side of a comparison some data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Nhs,
    Dos,
}

/// One reportable anomaly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The change event could not be turned into an entity, or its hours
    /// could not be parsed.
    ValidationFailed { ods_code: String, error: String },

    /// More than one active service of the primary type.
    ProfilingAmbiguity {
        ods_code: String,
        service_ids: Vec<i64>,
        tolerated: bool,
    },

    /// Candidates exist but none is an active service of an accepted type.
    NoPrimaryService {
        ods_code: String,
        candidate_ids: Vec<i64>,
    },

    /// NHS UK lists an ancillary service that DoS has no service for.
    MissingDosService {
        ods_code: String,
        service_name: String,
        dos_type_id: i64,
    },

    /// Opening times that overlap or are otherwise unusable.
    InvalidOpeningTimes {
        ods_code: String,
        service_id: Option<i64>,
        side: Side,
        detail: String,
    },

    /// A date with both open and closed entries; the open entries were used.
    ConflictingSpecifiedDate {
        ods_code: String,
        dates: Vec<NaiveDate>,
    },

    /// The organisation is hidden or closed, so nothing is sent.
    ClosedOrHiddenEntity {
        ods_code: String,
        status: OrganisationStatus,
        service_ids: Vec<i64>,
    },

    /// No DoS service shares the routing key.
    UnmatchedEntity { ods_code: String, routing_key: String },

    /// The NHS UK postcode has no geocoded DoS location.
    InvalidPostcode {
        ods_code: String,
        service_id: i64,
        postcode: String,
    },
}

/// Discriminant of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    ValidationFailed,
    ProfilingAmbiguity,
    NoPrimaryService,
    MissingDosService,
    InvalidOpeningTimes,
    ConflictingSpecifiedDate,
    ClosedOrHiddenEntity,
    UnmatchedEntity,
    InvalidPostcode,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::ValidationFailed => "validation_failed",
            DiagnosticKind::ProfilingAmbiguity => "profiling_ambiguity",
            DiagnosticKind::NoPrimaryService => "no_primary_service",
            DiagnosticKind::MissingDosService => "missing_dos_service",
            DiagnosticKind::InvalidOpeningTimes => "invalid_opening_times",
            DiagnosticKind::ConflictingSpecifiedDate => "conflicting_specified_date",
            DiagnosticKind::ClosedOrHiddenEntity => "closed_or_hidden_entity",
            DiagnosticKind::UnmatchedEntity => "unmatched_entity",
            DiagnosticKind::InvalidPostcode => "invalid_postcode",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::ValidationFailed { .. } => DiagnosticKind::ValidationFailed,
            Diagnostic::ProfilingAmbiguity { .. } => DiagnosticKind::ProfilingAmbiguity,
            Diagnostic::NoPrimaryService { .. } => DiagnosticKind::NoPrimaryService,
            Diagnostic::MissingDosService { .. } => DiagnosticKind::MissingDosService,
            Diagnostic::InvalidOpeningTimes { .. } => DiagnosticKind::InvalidOpeningTimes,
            Diagnostic::ConflictingSpecifiedDate { .. } => DiagnosticKind::ConflictingSpecifiedDate,
            Diagnostic::ClosedOrHiddenEntity { .. } => DiagnosticKind::ClosedOrHiddenEntity,
            Diagnostic::UnmatchedEntity { .. } => DiagnosticKind::UnmatchedEntity,
            Diagnostic::InvalidPostcode { .. } => DiagnosticKind::InvalidPostcode,
        }
    }
}

/// Receives diagnostics. Implementations must not panic or block.
pub trait DiagnosticSink {
    fn record_event(&self, diagnostic: &Diagnostic);
}

/// Writes each diagnostic as a `warn!` event with the details as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record_event(&self, diagnostic: &Diagnostic) {
        let details = serde_json::to_string(diagnostic).unwrap_or_default();
        warn!(kind = %diagnostic.kind(), %details, "reconciliation anomaly");
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in order.
    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Kinds recorded so far, in order.
    pub fn kinds(&self) -> Vec<DiagnosticKind> {
        self.events().iter().map(Diagnostic::kind).collect()
    }
}

impl DiagnosticSink for RecordingSink {
    fn record_event(&self, diagnostic: &Diagnostic) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(diagnostic.clone());
    }
}
