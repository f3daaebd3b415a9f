//! Postcode normalisation.

/// Normalise a postcode for comparison: remove all whitespace and uppercase.
///
/// ```
/// use dos_sync::domain::normalise_postcode;
///
/// assert_eq!(normalise_postcode("te5  7 e   r"), "TE57ER");
/// assert_eq!(normalise_postcode("TE5 7ER"), "TE57ER");
/// ```
pub fn normalise_postcode(postcode: &str) -> String {
    postcode
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}
