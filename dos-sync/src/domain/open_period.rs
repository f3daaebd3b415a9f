//! A single open interval within a day.
//!
//! Both feeds describe opening hours as wall-clock intervals with no date
//! attached. NHS UK sends them as "HH:MM-HH:MM" text (or as two separate
//! "HH:MM" fields); DoS stores start and end times in separate columns,
//! which may carry seconds.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::OpeningTimesError;

/// A wall-clock interval during which a service is open.
///
/// The start is always strictly before the end, and both are whole seconds;
/// there is no way to build an `OpenPeriod` that violates this. Ordering is
/// by `(start, end)`. Text is "HH:MM" per time, or "HH:MM:SS" for a time
/// with non-zero seconds.
///
/// # Examples
///
/// ```
/// use dos_sync::domain::OpenPeriod;
///
/// let period: OpenPeriod = "08:45-17:00".parse().unwrap();
/// assert_eq!(period.to_string(), "08:45-17:00");
///
/// // Start must come before end
/// assert!("17:00-08:45".parse::<OpenPeriod>().is_err());
/// assert!("08:45-08:45".parse::<OpenPeriod>().is_err());
///
/// let precise: OpenPeriod = "08:00:30-08:00:45".parse().unwrap();
/// assert_eq!(precise.to_string(), "08:00:30-08:00:45");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpenPeriod {
    start: NaiveTime,
    end: NaiveTime,
}

impl OpenPeriod {
    /// Create a period from two times.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, OpeningTimesError> {
        for time in [start, end] {
            if time.nanosecond() != 0 {
                return Err(OpeningTimesError::SubSecondTime(time));
            }
        }
        if start >= end {
            return Err(OpeningTimesError::InvalidPeriod { start, end });
        }
        Ok(Self { start, end })
    }

    /// Create a period from separate opening and closing time fields.
    pub fn from_fields(opening: &str, closing: &str) -> Result<Self, OpeningTimesError> {
        Self::new(parse_clock_time(opening)?, parse_clock_time(closing)?)
    }

    /// Opening time.
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    /// Closing time.
    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// True if the two intervals share any time. Touching ends don't count.
    pub fn overlaps(&self, other: &OpenPeriod) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True if one interval ends exactly where the other starts.
    pub fn touches(&self, other: &OpenPeriod) -> bool {
        self.end == other.start || other.end == self.start
    }
}

impl FromStr for OpenPeriod {
    type Err = OpeningTimesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| OpeningTimesError::MalformedPeriod(s.to_string()))?;
        let start = parse_clock_time(start)
            .map_err(|_| OpeningTimesError::MalformedPeriod(s.to_string()))?;
        let end =
            parse_clock_time(end).map_err(|_| OpeningTimesError::MalformedPeriod(s.to_string()))?;
        Self::new(start, end)
    }
}

impl fmt::Display for OpenPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            format_clock_time(self.start),
            format_clock_time(self.end)
        )
    }
}

impl fmt::Debug for OpenPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpenPeriod({self})")
    }
}

impl Serialize for OpenPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OpenPeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a zero-padded 24-hour "HH:MM" or "HH:MM:SS" time.
///
/// ```
/// use dos_sync::domain::parse_clock_time;
///
/// assert!(parse_clock_time("00:00").is_ok());
/// assert!(parse_clock_time("23:59").is_ok());
/// assert!(parse_clock_time("23:59:59").is_ok());
/// assert!(parse_clock_time("9:00").is_err());
/// assert!(parse_clock_time("24:00").is_err());
/// assert!(parse_clock_time("12:00:60").is_err());
/// ```
pub fn parse_clock_time(s: &str) -> Result<NaiveTime, OpeningTimesError> {
    let malformed = || OpeningTimesError::MalformedTime(s.to_string());
    let bytes = s.trim().as_bytes();

    // HH:MM, optionally followed by :SS
    let second = match bytes.len() {
        5 => 0,
        8 if bytes[5] == b':' => parse_two_digits(&bytes[6..8]).ok_or_else(malformed)?,
        _ => return Err(malformed()),
    };
    if bytes[2] != b':' {
        return Err(malformed());
    }

    let hour = parse_two_digits(&bytes[0..2]).ok_or_else(malformed)?;
    let minute = parse_two_digits(&bytes[3..5]).ok_or_else(malformed)?;

    NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(malformed)
}

/// "HH:MM", or "HH:MM:SS" when the seconds are not zero.
pub fn format_clock_time(time: NaiveTime) -> String {
    if time.second() == 0 {
        format!("{:02}:{:02}", time.hour(), time.minute())
    } else {
        format!(
            "{:02}:{:02}:{:02}",
            time.hour(),
            time.minute(),
            time.second()
        )
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn period(s: &str) -> OpenPeriod {
        s.parse().unwrap()
    }

    #[test]
    fn construct_valid() {
        let p = OpenPeriod::new(t(8, 45), t(17, 0)).unwrap();
        assert_eq!(p.start(), t(8, 45));
        assert_eq!(p.end(), t(17, 0));
    }

    #[test]
    fn construct_rejects_start_not_before_end() {
        assert_eq!(
            OpenPeriod::new(t(17, 0), t(8, 45)),
            Err(OpeningTimesError::InvalidPeriod {
                start: t(17, 0),
                end: t(8, 45)
            })
        );
        assert!(OpenPeriod::new(t(9, 0), t(9, 0)).is_err());
    }

    #[test]
    fn seconds_survive_text() {
        let p = OpenPeriod::new(
            NaiveTime::from_hms_opt(8, 0, 30).unwrap(),
            NaiveTime::from_hms_opt(8, 0, 45).unwrap(),
        )
        .unwrap();
        assert_eq!(p.to_string(), "08:00:30-08:00:45");
        assert_eq!(p.to_string().parse::<OpenPeriod>().unwrap(), p);

        // Mixed precision
        assert_eq!(period("08:00-08:00:45").to_string(), "08:00-08:00:45");
        assert_eq!(period("09:00:00-17:00:00").to_string(), "09:00-17:00");
    }

    #[test]
    fn construct_rejects_fractional_seconds() {
        let start = NaiveTime::from_hms_milli_opt(8, 0, 0, 250).unwrap();
        assert_eq!(
            OpenPeriod::new(start, t(9, 0)),
            Err(OpeningTimesError::SubSecondTime(start))
        );
    }

    #[test]
    fn from_fields() {
        let p = OpenPeriod::from_fields("09:00", "13:00").unwrap();
        assert_eq!(p, period("09:00-13:00"));
        assert!(OpenPeriod::from_fields("9am", "13:00").is_err());
    }

    #[test]
    fn parse_malformed() {
        for bad in [
            "",
            "08:45",
            "08:45-",
            "-17:00",
            "0845-1700",
            "08:45–17:00",
            "ab:cd-17:00",
            "08:45:6-17:00",
            "08:45.30-17:00",
        ] {
            assert!(bad.parse::<OpenPeriod>().is_err(), "{bad:?} should not parse");
        }
        assert_eq!(
            "08:45/17:00".parse::<OpenPeriod>(),
            Err(OpeningTimesError::MalformedPeriod("08:45/17:00".into()))
        );
    }

    #[test]
    fn parse_tolerates_surrounding_whitespace() {
        assert_eq!(period(" 08:45-17:00 "), period("08:45-17:00"));
        assert_eq!(period("08:45 - 17:00"), period("08:45-17:00"));
    }

    #[test]
    fn overlap_and_touch_are_distinct() {
        let morning = period("09:00-13:00");
        let lunch_overlap = period("12:00-17:30");
        let afternoon = period("13:00-17:00");
        let evening = period("18:00-20:00");

        assert!(morning.overlaps(&lunch_overlap));
        assert!(lunch_overlap.overlaps(&morning));

        assert!(!morning.overlaps(&afternoon));
        assert!(morning.touches(&afternoon));
        assert!(afternoon.touches(&morning));

        assert!(!morning.overlaps(&evening));
        assert!(!morning.touches(&evening));
    }

    #[test]
    fn nested_periods_overlap() {
        assert!(period("08:00-20:00").overlaps(&period("10:00-11:00")));
    }

    #[test]
    fn ordering_by_start_then_end() {
        let mut periods = vec![
            period("13:00-17:00"),
            period("09:00-12:00"),
            period("09:00-10:00"),
        ];
        periods.sort();
        assert_eq!(
            periods,
            vec![
                period("09:00-10:00"),
                period("09:00-12:00"),
                period("13:00-17:00")
            ]
        );
    }

    #[test]
    fn serde_uses_canonical_string() {
        let json = serde_json::to_string(&period("08:00-20:00")).unwrap();
        assert_eq!(json, "\"08:00-20:00\"");

        let back: OpenPeriod = serde_json::from_str(&json).unwrap();
        assert_eq!(back, period("08:00-20:00"));

        assert!(serde_json::from_str::<OpenPeriod>("\"20:00-08:00\"").is_err());
    }
}
