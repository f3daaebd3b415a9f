//! ODS organisation codes and routing keys.

use std::fmt;

use serde::Serialize;

/// Length of the routing key shared by an organisation and its services.
pub const ROUTING_KEY_LEN: usize = 5;

/// Error returned when parsing an invalid ODS code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid ODS code {code:?}: {reason}")]
pub struct InvalidOdsCode {
    code: String,
    reason: &'static str,
}

/// An NHS Organisation Data Service code, e.g. `FXX11`.
///
/// A pharmacy's services in DoS carry the organisation's code, sometimes with
/// a suffix (`FXX11001`), so only the first five characters identify the
/// organisation. An `OdsCode` is always at least that long.
///
/// # Examples
///
/// ```
/// use dos_sync::domain::OdsCode;
///
/// let code = OdsCode::parse("FXX11").unwrap();
/// assert_eq!(code.routing_key(), "FXX11");
///
/// let code = OdsCode::parse("fxx11001").unwrap();
/// assert_eq!(code.as_str(), "FXX11001");
/// assert_eq!(code.routing_key(), "FXX11");
///
/// assert!(OdsCode::parse("FX1").is_err());
/// assert!(OdsCode::parse("FX-11").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OdsCode(String);

impl OdsCode {
    /// Parse an ODS code, trimming whitespace and uppercasing.
    pub fn parse(s: &str) -> Result<Self, InvalidOdsCode> {
        let code = s.trim().to_ascii_uppercase();
        let invalid = |reason| InvalidOdsCode {
            code: s.to_string(),
            reason,
        };

        if code.len() < ROUTING_KEY_LEN {
            return Err(invalid("must be at least 5 characters"));
        }
        if !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(invalid("must be ASCII letters and digits"));
        }

        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first five characters, used for prefix lookups.
    pub fn routing_key(&self) -> &str {
        // Length and ASCII-ness checked in parse
        &self.0[..ROUTING_KEY_LEN]
    }
}

impl fmt::Debug for OdsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OdsCode({})", self.0)
    }
}

impl fmt::Display for OdsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Routing key of a free-text code as stored in DoS.
///
/// DoS does not validate its `odscode` column, so short or non-ASCII values
/// have no routing key.
pub fn routing_key(code: &str) -> Option<&str> {
    code.get(..ROUTING_KEY_LEN).filter(|key| key.is_ascii())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalises_case_and_whitespace() {
        let code = OdsCode::parse("  fa123 ").unwrap();
        assert_eq!(code.as_str(), "FA123");
        assert_eq!(code.to_string(), "FA123");
        assert_eq!(format!("{code:?}"), "OdsCode(FA123)");
    }

    #[test]
    fn reject_short_codes() {
        assert!(OdsCode::parse("").is_err());
        assert!(OdsCode::parse("FA12").is_err());
        assert_eq!(
            OdsCode::parse("FA12").unwrap_err().to_string(),
            "invalid ODS code \"FA12\": must be at least 5 characters"
        );
    }

    #[test]
    fn reject_non_alphanumeric() {
        assert!(OdsCode::parse("FA 123").is_err());
        assert!(OdsCode::parse("FA_123").is_err());
        assert!(OdsCode::parse("FAÖ123").is_err());
    }

    #[test]
    fn routing_key_of_long_code() {
        let code = OdsCode::parse("FA123001").unwrap();
        assert_eq!(code.routing_key(), "FA123");
    }

    #[test]
    fn free_text_routing_key() {
        assert_eq!(routing_key("FA123001"), Some("FA123"));
        assert_eq!(routing_key("FA123"), Some("FA123"));
        assert_eq!(routing_key("FA12"), None);
        assert_eq!(routing_key(""), None);
        // Multi-byte characters in the key
        assert_eq!(routing_key("FAÖ123"), None);
        assert_eq!(routing_key("FÖ123"), None);
        assert_eq!(routing_key("ÖÖÖ"), None);
        // Only the key itself must be ASCII
        assert_eq!(routing_key("FA123Ö"), Some("FA123"));
    }
}
