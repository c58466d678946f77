//! Row inclusion predicates.
//!
//! Rows failing either gate are dropped silently: partial, foreign, and
//! low-quality rows are expected noise in the export, not errors.

/// Two-stage row filter: a geography gate followed by a completeness gate.
///
/// The geography gate is a case-sensitive substring match against the free
/// text `countries_en` field, not a parsed-list match. A country name that
/// is a substring of another country's name will over-match; this mirrors
/// the upstream data semantics and is kept as-is.
#[derive(Debug, Clone)]
pub struct RowFilter {
    country: String,
    min_completeness: f64,
}

impl RowFilter {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            min_completeness: 0.8,
        }
    }

    /// Whether a row should be kept. Checks the cheap substring gate first
    /// so most foreign rows never reach the float parse.
    ///
    /// The completeness score is parsed as-is: padded or otherwise
    /// malformed values reject the row.
    pub fn accepts(&self, countries_en: &str, completeness: &str) -> bool {
        if !countries_en.contains(&self.country) {
            return false;
        }
        match completeness.parse::<f64>() {
            Ok(score) => score >= self.min_completeness,
            Err(_) => false,
        }
    }
}
