//! Header-indexed field access for raw TSV records.
//!
//! The export file's header line is the only schema we get, so it is turned
//! into an immutable name-to-position map once per run. Lookups against a
//! record never fail: a column missing from the header, or a ragged record
//! shorter than the header, both read as the empty string. Callers treat
//! empty as "missing".

use csv::StringRecord;
use std::collections::HashMap;

/// The logical columns the pipeline reads. A column absent from the header
/// is warned about once at startup and yields empty values for every row.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    "product_name",
    "url",
    "image_url",
    "brands",
    "categories",
    "stores",
    "countries_en",
    "completeness",
    "fat_100g",
    "proteins_100g",
    "carbohydrates_100g",
    "energy-kcal_100g",
];

/// Immutable mapping from column name to position, built once from the
/// header line.
#[derive(Debug)]
pub struct HeaderIndex {
    index: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn from_headers(headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), i))
            .collect();
        Self { index }
    }

    /// The named field of `record`, or `""` when the column is absent from
    /// the header or the record is too short.
    pub fn get<'r>(&self, record: &'r StringRecord, name: &str) -> &'r str {
        self.index
            .get(name)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
    }

    /// Required columns that were not present in the header.
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|col| !self.index.contains_key(**col))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_get_by_name() {
        let index = HeaderIndex::from_headers(&record(&["product_name", "url", "brands"]));
        let row = record(&["Oat Milk", "https://example.org", "Oatly"]);
        assert_eq!(index.get(&row, "product_name"), "Oat Milk");
        assert_eq!(index.get(&row, "brands"), "Oatly");
    }

    #[test]
    fn test_missing_column_reads_empty() {
        let index = HeaderIndex::from_headers(&record(&["product_name"]));
        let row = record(&["Oat Milk"]);
        assert_eq!(index.get(&row, "stores"), "");
    }

    #[test]
    fn test_ragged_record_reads_empty() {
        let index = HeaderIndex::from_headers(&record(&["product_name", "url", "brands"]));
        let row = record(&["Oat Milk"]);
        assert_eq!(index.get(&row, "url"), "");
        assert_eq!(index.get(&row, "brands"), "");
    }

    #[test]
    fn test_missing_required() {
        let index = HeaderIndex::from_headers(&record(&["product_name", "url"]));
        let missing = index.missing_required();
        assert!(missing.contains(&"completeness"));
        assert!(!missing.contains(&"product_name"));
        assert_eq!(missing.len(), REQUIRED_COLUMNS.len() - 2);
    }
}
