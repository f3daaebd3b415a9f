//! Weekday identifiers.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::OpeningTimesError;

/// One of the seven days a standard opening period can be attached to.
///
/// Both feeds name days in English ("Friday" from NHS UK, "Friday" or
/// "friday" from DoS), so parsing is case-insensitive.
///
/// # Examples
///
/// ```
/// use dos_sync::domain::Weekday;
///
/// assert_eq!(Weekday::parse("Friday").unwrap(), Weekday::Friday);
/// assert_eq!(Weekday::parse("  monday ").unwrap(), Weekday::Monday);
/// assert!(Weekday::parse("Funday").is_err());
/// assert_eq!(Weekday::Sunday.as_str(), "sunday");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All weekdays, Monday first.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Parse a weekday name, ignoring case and surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, OpeningTimesError> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|day| day.as_str() == lowered)
            .ok_or_else(|| OpeningTimesError::InvalidWeekday(s.to_string()))
    }

    /// Lowercase English name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

impl FromStr for Weekday {
    type Err = OpeningTimesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
