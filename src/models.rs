//! Core data models used throughout the exporter.
//!
//! These types represent the rows that flow through the filter, normalizer,
//! and batch loader on their way into SQLite.

/// A normalized product row, ready for insertion into the `food` table.
///
/// Constructed once per accepted source record and never mutated afterwards;
/// each row is consumed by exactly one batch flush. The three list fields
/// (`brands`, `categories`, `stores`) hold serialized JSON arrays of trimmed,
/// non-empty strings, or `None` when the source field was blank.
///
/// The four nutrient fields are non-null: missing or unparseable source
/// values default to `0.0`. `protein_fat_index` keeps its absent state
/// instead; it is only derived when both protein and fat were present in
/// the source and fat was nonzero.
///
/// The row id is assigned by SQLite (`INTEGER PRIMARY KEY AUTOINCREMENT`);
/// the loader never assigns ids itself.
#[derive(Debug, Clone)]
pub struct FoodRow {
    pub name: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub brands: Option<String>,
    pub categories: Option<String>,
    pub stores: Option<String>,
    pub fat: f64,
    pub protein: f64,
    pub carbs: f64,
    pub energy: f64,
    pub protein_fat_index: Option<f64>,
}
