//! The change set: fields to update and their new values.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::domain::{ChangePeriod, SpecifiedOpeningTime, Weekday};

/// A field that can be changed on a DoS service.
///
/// Ordering is the order keys appear in a serialised change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeKey {
    Website,
    Phone,
    Postcode,
    PublicName,
    Address,
    StandardOpeningTimes(Weekday),
    SpecifiedOpeningTimes,
    Sgsdid,
}

impl ChangeKey {
    /// Wire name of the key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKey::Website => "website",
            ChangeKey::Phone => "phone",
            ChangeKey::Postcode => "postcode",
            ChangeKey::PublicName => "public_name",
            ChangeKey::Address => "address",
            ChangeKey::StandardOpeningTimes(day) => match day {
                Weekday::Monday => "standard_opening_times_monday",
                Weekday::Tuesday => "standard_opening_times_tuesday",
                Weekday::Wednesday => "standard_opening_times_wednesday",
                Weekday::Thursday => "standard_opening_times_thursday",
                Weekday::Friday => "standard_opening_times_friday",
                Weekday::Saturday => "standard_opening_times_saturday",
                Weekday::Sunday => "standard_opening_times_sunday",
            },
            ChangeKey::SpecifiedOpeningTimes => "specified_opening_times",
            ChangeKey::Sgsdid => "sgsdid",
        }
    }
}

impl fmt::Display for ChangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ChangeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The new value for a changed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChangeValue {
    /// A text field; `None` clears it.
    Text(Option<String>),
    /// Address lines, in order.
    Lines(Vec<String>),
    /// One weekday's periods; empty means closed.
    Periods(Vec<ChangePeriod>),
    /// Every future date-specific entry.
    Specified(Vec<SpecifiedOpeningTime>),
    Flag(bool),
}

/// Fields whose NHS UK value differs from DoS, with the NHS UK value.
///
/// Absent keys mean "no change". An empty set does not allocate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet {
    changes: BTreeMap<ChangeKey, ChangeValue>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: ChangeKey, value: ChangeValue) {
        self.changes.insert(key, value);
    }

    pub fn remove(&mut self, key: ChangeKey) -> Option<ChangeValue> {
        self.changes.remove(&key)
    }

    pub fn get(&self, key: ChangeKey) -> Option<&ChangeValue> {
        self.changes.get(&key)
    }

    pub fn contains(&self, key: ChangeKey) -> bool {
        self.changes.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Keys in serialisation order.
    pub fn keys(&self) -> Vec<ChangeKey> {
        self.changes.keys().copied().collect()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, ChangeKey, ChangeValue> {
        self.changes.iter()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = (&'a ChangeKey, &'a ChangeValue);
    type IntoIter = btree_map::Iter<'a, ChangeKey, ChangeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}
