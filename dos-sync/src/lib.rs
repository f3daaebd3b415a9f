//! NHS UK to DoS profile reconciliation.
//!
//! Takes a change event describing an organisation from the NHS UK feed,
//! finds the DoS services it corresponds to, works out which fields differ,
//! and emits idempotent change requests that bring DoS in line.

pub mod cache;
pub mod changes;
pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod dos;
pub mod matching;
pub mod nhs;
pub mod reconcile;
pub mod request;
