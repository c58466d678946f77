//! Field value normalization.
//!
//! Cleans individual field values on their way into a [`FoodRow`]: numeric
//! parsing with rounding, the OCR decimal-shift correction for macro
//! nutrients, the derived protein/fat ratio, and splitting of comma-joined
//! free text into JSON arrays.
//!
//! Everything here is absorbing: a malformed value becomes "absent" (or a
//! caller-side default), never an error. Run-level failures only exist
//! downstream in the loader and schema builder.

/// Parse a nutrient value, rounded to 2 decimal places.
///
/// Empty or whitespace-only input is absent, which is distinct from zero.
/// Unparseable input is also treated as absent; callers default the four
/// stored nutrient columns to 0.0.
pub fn parse_nutrient(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let f: f64 = s.parse().ok()?;
    Some((f * 100.0).round() / 100.0)
}

/// Correct an assumed misplaced decimal point in a per-100g macro-nutrient
/// value. "10,3" transcribed with the comma dropped reads as 103; anything
/// above 100g per 100g is physically impossible, so divide by 10.
///
/// Not applied to energy, where values above 100 kcal are legitimate.
pub fn fix_ocr_magnitude(value: f64) -> f64 {
    if value > 100.0 {
        value / 10.0
    } else {
        value
    }
}

/// Derived protein-to-fat ratio. Absent unless both inputs were present in
/// the source and fat is nonzero; never zero-defaulted and never an error.
pub fn protein_fat_index(protein: Option<f64>, fat: Option<f64>) -> Option<f64> {
    match (protein, fat) {
        (Some(p), Some(f)) if f != 0.0 => Some(p / f),
        _ => None,
    }
}

/// Split comma-joined free text into a JSON array of trimmed, non-empty
/// strings. Returns `None` when nothing usable remains: a resulting list is
/// never empty and never contains blank entries.
///
/// serde_json does not HTML-escape `&`, `<`, or `>`, so brand names like
/// "M&M's" round-trip verbatim.
pub fn split_multi_value(s: &str) -> Option<String> {
    let parts: Vec<&str> = s
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        return None;
    }
    // Serializing a Vec<&str> cannot fail; keep an empty array as the
    // fallback rather than panicking in the hot loop.
    Some(serde_json::to_string(&parts).unwrap_or_else(|_| "[]".to_string()))
}

/// Optional text: empty trims to absent.
pub fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
