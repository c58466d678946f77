//! Schema lifecycle: the run-start reset and the post-load derivation pass.
//!
//! Every run rebuilds the database from scratch. [`reset`] drops all output
//! objects (search indexes first, then pivots, then base tables) and
//! recreates the primary `food` table. After ingestion, [`build_derived`]
//! runs a single transaction that derives the lookup tables, pivot tables,
//! pivot indexes, and FTS5 search indexes from the loaded rows, in that
//! fixed order. If any statement in that pass fails the transaction aborts
//! and nothing derived is committed.

use anyhow::{Context, Result};
use sqlx::SqlitePool;

/// Drop every output object and recreate the empty `food` table.
///
/// Drop order matters only for readability; SQLite has no dependency
/// tracking between these, but FTS indexes and pivots go first so a
/// partially failed reset never leaves a secondary object pointing at a
/// missing base table.
pub async fn reset(pool: &SqlitePool) -> Result<()> {
    const DROPS: [&str; 11] = [
        "DROP TABLE IF EXISTS food_fts",
        "DROP TABLE IF EXISTS brands_fts",
        "DROP TABLE IF EXISTS categories_fts",
        "DROP TABLE IF EXISTS stores_fts",
        "DROP TABLE IF EXISTS brand_food",
        "DROP TABLE IF EXISTS category_food",
        "DROP TABLE IF EXISTS store_food",
        "DROP TABLE IF EXISTS food",
        "DROP TABLE IF EXISTS brands",
        "DROP TABLE IF EXISTS categories",
        "DROP TABLE IF EXISTS stores",
    ];

    for drop in DROPS {
        sqlx::query(drop).execute(pool).await.context("drop tables")?;
    }

    sqlx::query(
        r#"
        CREATE TABLE food (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            url TEXT,
            image_url TEXT,
            brands JSON,
            categories JSON,
            stores JSON,
            fat DOUBLE NOT NULL,
            protein DOUBLE NOT NULL,
            carbs DOUBLE NOT NULL,
            energy DOUBLE NOT NULL,
            protein_fat_index DOUBLE
        )
        "#,
    )
    .execute(pool)
    .await
    .context("create food table")?;

    Ok(())
}

/// Derive lookup tables, pivot tables, pivot indexes, and FTS5 search
/// indexes from the loaded `food` rows, all inside one transaction.
pub async fn build_derived(pool: &SqlitePool) -> Result<()> {
    // Each step depends on the previous one: lookups before pivots (the
    // pivot population joins against them), pivots before their indexes,
    // and the brands/categories/stores FTS indexes read the populated
    // lookup tables.
    const STATEMENTS: &[&str] = &[
        // lookup tables with auto-increment ids
        "CREATE TABLE IF NOT EXISTS brands (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            brand TEXT NOT NULL UNIQUE
        )",
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category TEXT NOT NULL UNIQUE
        )",
        "CREATE TABLE IF NOT EXISTS stores (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            store TEXT NOT NULL UNIQUE
        )",
        // populate lookup tables from the JSON array columns; INSERT OR
        // IGNORE keys on the unique text so this step alone is idempotent
        "INSERT OR IGNORE INTO brands (brand)
         SELECT DISTINCT trim(value) AS brand
         FROM food
         CROSS JOIN json_each(food.brands)
         WHERE food.brands IS NOT NULL
           AND value IS NOT NULL
           AND trim(value) <> ''",
        "INSERT OR IGNORE INTO categories (category)
         SELECT DISTINCT trim(value) AS category
         FROM food
         CROSS JOIN json_each(food.categories)
         WHERE food.categories IS NOT NULL
           AND value IS NOT NULL
           AND trim(value) <> ''",
        "INSERT OR IGNORE INTO stores (store)
         SELECT DISTINCT trim(value) AS store
         FROM food
         CROSS JOIN json_each(food.stores)
         WHERE food.stores IS NOT NULL
           AND value IS NOT NULL
           AND trim(value) <> ''",
        // pivot tables
        "CREATE TABLE IF NOT EXISTS brand_food (
            brand_id INTEGER NOT NULL,
            food_id INTEGER NOT NULL,
            FOREIGN KEY (brand_id) REFERENCES brands(id),
            FOREIGN KEY (food_id) REFERENCES food(id)
        )",
        "CREATE TABLE IF NOT EXISTS category_food (
            category_id INTEGER NOT NULL,
            food_id INTEGER NOT NULL,
            FOREIGN KEY (category_id) REFERENCES categories(id),
            FOREIGN KEY (food_id) REFERENCES food(id)
        )",
        "CREATE TABLE IF NOT EXISTS store_food (
            store_id INTEGER NOT NULL,
            food_id INTEGER NOT NULL,
            FOREIGN KEY (store_id) REFERENCES stores(id),
            FOREIGN KEY (food_id) REFERENCES food(id)
        )",
        // populate pivot tables by re-expanding the JSON columns and
        // joining each trimmed token against the lookup table
        "INSERT INTO brand_food (brand_id, food_id)
         SELECT DISTINCT b.id AS brand_id, food.id AS food_id
         FROM food
         CROSS JOIN json_each(food.brands)
         JOIN brands b ON b.brand = trim(value)
         WHERE food.brands IS NOT NULL
           AND value IS NOT NULL
           AND trim(value) <> ''",
        "INSERT INTO category_food (category_id, food_id)
         SELECT DISTINCT c.id AS category_id, food.id AS food_id
         FROM food
         CROSS JOIN json_each(food.categories)
         JOIN categories c ON c.category = trim(value)
         WHERE food.categories IS NOT NULL
           AND value IS NOT NULL
           AND trim(value) <> ''",
        "INSERT INTO store_food (store_id, food_id)
         SELECT DISTINCT s.id AS store_id, food.id AS food_id
         FROM food
         CROSS JOIN json_each(food.stores)
         JOIN stores s ON s.store = trim(value)
         WHERE food.stores IS NOT NULL
           AND value IS NOT NULL
           AND trim(value) <> ''",
        // pivot indexes: unique pair plus one per direction
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_brand_food_unique ON brand_food(brand_id, food_id)",
        "CREATE INDEX IF NOT EXISTS idx_brand_food_brand_id ON brand_food(brand_id)",
        "CREATE INDEX IF NOT EXISTS idx_brand_food_food_id ON brand_food(food_id)",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_category_food_unique ON category_food(category_id, food_id)",
        "CREATE INDEX IF NOT EXISTS idx_category_food_category_id ON category_food(category_id)",
        "CREATE INDEX IF NOT EXISTS idx_category_food_food_id ON category_food(food_id)",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_store_food_unique ON store_food(store_id, food_id)",
        "CREATE INDEX IF NOT EXISTS idx_store_food_store_id ON store_food(store_id)",
        "CREATE INDEX IF NOT EXISTS idx_store_food_food_id ON store_food(food_id)",
        // external-content FTS5 indexes, keyed on the base table's rowid
        "CREATE VIRTUAL TABLE IF NOT EXISTS food_fts USING fts5(
            name,
            content='food',
            content_rowid='id'
        )",
        "INSERT INTO food_fts(rowid, name)
         SELECT id, name FROM food WHERE name IS NOT NULL",
        "CREATE VIRTUAL TABLE IF NOT EXISTS brands_fts USING fts5(
            brand,
            content='brands',
            content_rowid='id'
        )",
        "INSERT INTO brands_fts(rowid, brand) SELECT id, brand FROM brands",
        "CREATE VIRTUAL TABLE IF NOT EXISTS categories_fts USING fts5(
            category,
            content='categories',
            content_rowid='id'
        )",
        "INSERT INTO categories_fts(rowid, category) SELECT id, category FROM categories",
        "CREATE VIRTUAL TABLE IF NOT EXISTS stores_fts USING fts5(
            store,
            content='stores',
            content_rowid='id'
        )",
        "INSERT INTO stores_fts(rowid, store) SELECT id, store FROM stores",
    ];

    let mut tx = pool.begin().await.context("begin schema transaction")?;
    for statement in STATEMENTS.iter().copied() {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("exec schema statement: {}", first_line(statement)))?;
    }
    tx.commit().await.context("commit schema transaction")?;

    Ok(())
}

fn first_line(sql: &str) -> &str {
    sql.lines().next().unwrap_or(sql).trim()
}
