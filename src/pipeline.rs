//! Export pipeline orchestration.
//!
//! Coordinates the full run: reset the output schema, stream the TSV export
//! row by row through the filter and normalizer, accumulate accepted rows
//! into the batch loader, and finally derive the lookup, pivot, and search
//! structures once everything is committed.
//!
//! The pipeline is single-threaded and streaming: memory is bounded by the
//! batch size, not the input file size. Row-level problems (malformed
//! lines, bad numbers) are absorbed here with a stderr warning at most;
//! loader and schema errors propagate and end the run.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use sqlx::SqlitePool;

use crate::config::{expand_path, Config};
use crate::db;
use crate::extract::HeaderIndex;
use crate::filter::RowFilter;
use crate::loader::BatchLoader;
use crate::models::FoodRow;
use crate::normalize;
use crate::schema;

/// Counters reported after a successful run.
#[derive(Debug, Default)]
pub struct ExportSummary {
    /// Data lines read from the input (header excluded), including
    /// malformed ones.
    pub lines_read: u64,
    /// Lines rejected by the filters or skipped as malformed.
    pub rows_skipped: u64,
    /// Rows committed to the `food` table.
    pub rows_inserted: u64,
}

/// Run the whole export against an already-open pool.
///
/// Split out from [`run_export`] so tests can drive the pipeline against a
/// scratch database without going through path resolution.
pub async fn export_to_pool(config: &Config, pool: &SqlitePool) -> Result<ExportSummary> {
    let csv_path = expand_path(config.require_source()?);

    schema::reset(pool).await?;

    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_path(&csv_path)
        .with_context(|| format!("Failed to open input file: {}", csv_path.display()))?;

    let header_index = HeaderIndex::from_headers(reader.headers().context("read csv header")?);
    for col in header_index.missing_required() {
        eprintln!("Warning: column {} not found in CSV", col);
    }

    let filter = RowFilter::new(config.source.country.clone());
    let mut loader = BatchLoader::new(pool.clone(), config.batch.size, config.batch.chunk_rows);
    let mut summary = ExportSummary::default();
    // Header is line 1 in the file; data starts at line 2.
    let mut line: u64 = 1;

    for record in reader.records() {
        line += 1;
        summary.lines_read += 1;

        let record = match record {
            Ok(record) => record,
            Err(err) => {
                eprintln!("Warning: skipping malformed line {}: {}", line, err);
                summary.rows_skipped += 1;
                continue;
            }
        };

        let countries_en = header_index.get(&record, "countries_en");
        let completeness = header_index.get(&record, "completeness");
        if !filter.accepts(countries_en, completeness) {
            summary.rows_skipped += 1;
            continue;
        }

        let row = normalize_record(&header_index, &record);
        let flushed = loader.add(row).await?;
        if flushed > 0 {
            summary.rows_inserted += flushed;
            eprintln!("Inserted {} rows (batch)", flushed);
        }
    }

    let flushed = loader.flush().await?;
    if flushed > 0 {
        summary.rows_inserted += flushed;
        eprintln!("Inserted {} rows (final)", flushed);
    }

    eprintln!("Building derived tables and search indexes...");
    schema::build_derived(pool).await?;

    Ok(summary)
}

/// Run the export command end to end and print the summary.
pub async fn run_export(config: &Config) -> Result<()> {
    let db_path = expand_path(config.require_db()?);
    let pool = db::connect(&db_path).await?;

    let summary = export_to_pool(config, &pool).await?;

    println!("export {}", expand_path(config.require_source()?).display());
    println!("  lines read: {}", summary.lines_read);
    println!("  rows inserted: {}", summary.rows_inserted);
    println!("  rows skipped: {}", summary.rows_skipped);
    println!("ok");

    pool.close().await;
    Ok(())
}

/// Build a [`FoodRow`] from an accepted record.
fn normalize_record(header_index: &HeaderIndex, record: &csv::StringRecord) -> FoodRow {
    let mut name = header_index.get(record, "product_name");
    let brands_raw = header_index.get(record, "brands");
    if name.is_empty() {
        // Fall back to the raw brands text, not the cleaned list.
        name = brands_raw;
    }

    // Keep present/absent state through the ratio derivation; the stored
    // nutrient columns default to 0.0 afterwards.
    let fat = normalize::parse_nutrient(header_index.get(record, "fat_100g"))
        .map(normalize::fix_ocr_magnitude);
    let protein = normalize::parse_nutrient(header_index.get(record, "proteins_100g"))
        .map(normalize::fix_ocr_magnitude);
    let carbs = normalize::parse_nutrient(header_index.get(record, "carbohydrates_100g"))
        .map(normalize::fix_ocr_magnitude);
    let energy = normalize::parse_nutrient(header_index.get(record, "energy-kcal_100g"));

    let protein_fat_index = normalize::protein_fat_index(protein, fat);

    FoodRow {
        name: normalize::non_empty(name),
        url: normalize::non_empty(header_index.get(record, "url")),
        image_url: normalize::non_empty(header_index.get(record, "image_url")),
        brands: normalize::split_multi_value(brands_raw),
        categories: normalize::split_multi_value(header_index.get(record, "categories")),
        stores: normalize::split_multi_value(header_index.get(record, "stores")),
        fat: fat.unwrap_or(0.0),
        protein: protein.unwrap_or(0.0),
        carbs: carbs.unwrap_or(0.0),
        energy: energy.unwrap_or(0.0),
        protein_fat_index,
    }
}
