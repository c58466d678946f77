//! Database statistics overview.
//!
//! Prints row counts for the primary, lookup, and pivot tables plus the
//! database file size. Used by `foodex stats` for a quick check that an
//! export produced what was expected.

use anyhow::Result;

use crate::config::{expand_path, Config};
use crate::db;

pub async fn run_stats(config: &Config) -> Result<()> {
    let db_path = expand_path(config.require_db()?);
    let pool = db::connect(&db_path).await?;

    let food: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM food")
        .fetch_one(&pool)
        .await?;
    let brands: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM brands")
        .fetch_one(&pool)
        .await?;
    let categories: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(&pool)
        .await?;
    let stores: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stores")
        .fetch_one(&pool)
        .await?;
    let brand_links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM brand_food")
        .fetch_one(&pool)
        .await?;
    let category_links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM category_food")
        .fetch_one(&pool)
        .await?;
    let store_links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM store_food")
        .fetch_one(&pool)
        .await?;

    let db_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    println!("foodex — Database Stats");
    println!("=======================");
    println!();
    println!("  Database:    {}", db_path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Food:        {}", food);
    println!("  Brands:      {} ({} links)", brands, brand_links);
    println!("  Categories:  {} ({} links)", categories, category_links);
    println!("  Stores:      {} ({} links)", stores, store_links);
    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
