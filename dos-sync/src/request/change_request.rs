//! Outbound change requests.

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::changes::ChangeSet;

/// Value of [`RequestMetadata::system`] on every request.
pub const SYSTEM_NAME: &str = "DoS Integration";

/// Errors building a change request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("failed to encode change request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("service {service_id} appears twice in one batch")]
    DuplicateService { service_id: i64 },
}

/// Where a change event came from and how to route what it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingContext {
    pub correlation_id: String,

    /// Ordering number from the upstream event; later events win.
    pub sequence_number: u64,

    /// When the event arrived, in milliseconds since the Unix epoch.
    pub message_received: i64,

    /// Id of the event in the holding queue, if it came through one.
    pub record_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestMetadata {
    pub ods_code: String,
    pub message_received: i64,
    pub record_id: Option<String>,
    pub system: String,
}

/// One idempotent update to one DoS service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRequest {
    pub entry_id: String,
    pub service_id: i64,
    pub changes: ChangeSet,
    pub correlation_id: String,
    pub sequence_number: u64,
    pub message_group_id: String,
    pub deduplication_id: String,
    pub metadata: RequestMetadata,
}

impl ChangeRequest {
    /// The whole request as a JSON string.
    pub fn to_json(&self) -> Result<String, RequestError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Size of the encoded request in bytes.
    pub fn encoded_len(&self) -> Result<usize, RequestError> {
        Ok(self.to_json()?.len())
    }
}

#[derive(Serialize)]
struct Payload<'a> {
    service_id: i64,
    changes: &'a ChangeSet,
}

/// Canonical JSON of the part of a request that identifies its effect.
///
/// Fields are written in a fixed order and change keys in [`ChangeKey`]
/// order, so equal inputs always give identical text.
///
/// [`ChangeKey`]: crate::changes::ChangeKey
pub fn payload_json(service_id: i64, changes: &ChangeSet) -> Result<String, RequestError> {
    Ok(serde_json::to_string(&Payload {
        service_id,
        changes,
    })?)
}

/// `"<sequence>-<sha256 hex of payload>"`.
///
/// ```
/// use dos_sync::request::deduplication_id;
///
/// let id = deduplication_id(7, "{}");
/// assert!(id.starts_with("7-"));
/// assert_eq!(id.len(), 2 + 64);
/// ```
pub fn deduplication_id(sequence_number: u64, payload: &str) -> String {
    format!("{sequence_number}-{:x}", Sha256::digest(payload.as_bytes()))
}

/// Build a request for one service.
///
/// The entry id is `"{service_id}-{sequence_number}"`, not derived from the
/// correlation id.
pub fn assemble(
    ods_code: &str,
    service_id: i64,
    changes: ChangeSet,
    routing: &RoutingContext,
) -> Result<ChangeRequest, RequestError> {
    let payload = payload_json(service_id, &changes)?;
    Ok(ChangeRequest {
        entry_id: format!("{service_id}-{}", routing.sequence_number),
        service_id,
        deduplication_id: deduplication_id(routing.sequence_number, &payload),
        changes,
        correlation_id: routing.correlation_id.clone(),
        sequence_number: routing.sequence_number,
        message_group_id: routing.correlation_id.clone(),
        metadata: RequestMetadata {
            ods_code: ods_code.to_string(),
            message_received: routing.message_received,
            record_id: routing.record_id.clone(),
            system: SYSTEM_NAME.to_string(),
        },
    })
}

/// Build one request per service. Fails if a service id repeats, since
/// entry ids must be unique within a batch.
pub fn assemble_batch(
    ods_code: &str,
    changes: Vec<(i64, ChangeSet)>,
    routing: &RoutingContext,
) -> Result<Vec<ChangeRequest>, RequestError> {
    let mut requests: Vec<ChangeRequest> = Vec::with_capacity(changes.len());
    for (service_id, set) in changes {
        if requests.iter().any(|r| r.service_id == service_id) {
            return Err(RequestError::DuplicateService { service_id });
        }
        requests.push(assemble(ods_code, service_id, set, routing)?);
    }
    Ok(requests)
}
