//! Delivery of change requests.
//!
//! The real transport is an external queue. The crate only needs to hand a
//! finished request to something; [`JsonLinesSender`] writes them to any
//! [`Write`] and [`CollectingSender`] keeps them in memory.

use std::io::Write;
use std::sync::Mutex;

use serde::Serialize;
use thiserror::Error;

use super::{ChangeRequest, RequestError};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to write change request: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("change request rejected: {0}")]
    Rejected(String),
}

/// Accepts finished change requests.
pub trait ChangeRequestSender {
    fn send(&self, request: &ChangeRequest) -> Result<(), TransportError>;

    /// Park a request that cannot be delivered normally.
    fn send_to_dead_letter(&self, request: &ChangeRequest, reason: &str)
    -> Result<(), TransportError>;
}

#[derive(Serialize)]
#[serde(tag = "destination", rename_all = "snake_case")]
enum Envelope<'a> {
    ChangeRequest {
        request: &'a ChangeRequest,
    },
    DeadLetter {
        reason: &'a str,
        request: &'a ChangeRequest,
    },
}

/// Writes each request as one JSON line.
pub struct JsonLinesSender<W: Write> {
    out: Mutex<W>,
}

impl<W: Write> JsonLinesSender<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self, envelope: &Envelope<'_>) -> Result<(), TransportError> {
        let line = serde_json::to_string(envelope).map_err(RequestError::from)?;
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(())
    }
}

impl<W: Write> ChangeRequestSender for JsonLinesSender<W> {
    fn send(&self, request: &ChangeRequest) -> Result<(), TransportError> {
        self.write(&Envelope::ChangeRequest { request })
    }

    fn send_to_dead_letter(
        &self,
        request: &ChangeRequest,
        reason: &str,
    ) -> Result<(), TransportError> {
        self.write(&Envelope::DeadLetter { reason, request })
    }
}

/// Keeps everything it is given.
#[derive(Debug, Default)]
pub struct CollectingSender {
    sent: Mutex<Vec<ChangeRequest>>,
    dead_letters: Mutex<Vec<(ChangeRequest, String)>>,
}

impl CollectingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<ChangeRequest> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn dead_letters(&self) -> Vec<(ChangeRequest, String)> {
        self.dead_letters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ChangeRequestSender for CollectingSender {
    fn send(&self, request: &ChangeRequest) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());
        Ok(())
    }

    fn send_to_dead_letter(
        &self,
        request: &ChangeRequest,
        reason: &str,
    ) -> Result<(), TransportError> {
        self.dead_letters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((request.clone(), reason.to_string()));
        Ok(())
    }
}
