//! Change detection.
//!
//! Compares a normalised NHS UK entity with a DoS service and produces the
//! minimal set of field changes that would bring DoS in line.

mod change_set;
mod compare;

pub use change_set::{ChangeKey, ChangeSet, ChangeValue};
pub use compare::{Comparator, CompareOptions, EntityHours, compute_changes, moved_specified_dates};
