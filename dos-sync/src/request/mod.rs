//! Change-request assembly and delivery.

mod change_request;
mod transport;

pub use change_request::{
    ChangeRequest, RequestError, RequestMetadata, RoutingContext, SYSTEM_NAME, assemble,
    assemble_batch, deduplication_id, payload_json,
};
pub use transport::{ChangeRequestSender, CollectingSender, JsonLinesSender, TransportError};
