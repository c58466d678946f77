use sqlx::{Row, SqlitePool};
use tempfile::TempDir;

use foodex::config::Config;
use foodex::loader::BatchLoader;
use foodex::models::FoodRow;
use foodex::pipeline::export_to_pool;
use foodex::search::{self, run_search, SearchIndex};
use foodex::{db, schema};

const HEADER: &[&str] = &[
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

fn tsv(lines: &[&[&str]]) -> String {
    let mut out = String::new();
    out.push_str(&HEADER.join("\t"));
    out.push('\n');
    for line in lines {
        out.push_str(&line.join("\t"));
        out.push('\n');
    }
    out
}

fn german_row<'a>(name: &'a str) -> Vec<&'a str> {
    vec![
        name,
        "https://off.example/1",
        "https://img.example/1.jpg",
        "Oatly, Alpro",
        "Beverages, Plant milks",
        "Rewe",
        "France,Germany",
        "0.95",
        "103",
        "10.3",
        "6.5",
        "46",
    ]
}

fn french_row() -> Vec<&'static str> {
    vec![
        "Jus d'orange",
        "https://off.example/2",
        "",
        "Joker",
        "Beverages",
        "Carrefour",
        "France",
        "1.0",
        "0.1",
        "0.7",
        "9",
        "43",
    ]
}

async fn setup(content: &str) -> (TempDir, Config, SqlitePool) {
    let tmp = TempDir::new().unwrap();
    let csv_path = tmp.path().join("products.csv");
    std::fs::write(&csv_path, content).unwrap();

    let mut config = Config::default();
    config.source.path = Some(csv_path);
    config.db.path = Some(tmp.path().join("food.sqlite"));

    let pool = db::connect(config.db.path.as_deref().unwrap())
        .await
        .unwrap();
    (tmp, config, pool)
}

async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn lookup_values(pool: &SqlitePool, table: &str, column: &str) -> Vec<String> {
    sqlx::query_scalar(&format!(
        "SELECT {} FROM {} ORDER BY {}",
        column, table, column
    ))
    .fetch_all(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_end_to_end_export() {
    let content = tsv(&[&german_row("Haferdrink"), &french_row()]);
    let (_tmp, config, pool) = setup(&content).await;

    let summary = export_to_pool(&config, &pool).await.unwrap();
    assert_eq!(summary.lines_read, 2);
    assert_eq!(summary.rows_inserted, 1);
    assert_eq!(summary.rows_skipped, 1);

    let row = sqlx::query("SELECT * FROM food")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.get::<String, _>("name"), "Haferdrink");
    // fat 103 corrected by one decimal place, energy untouched
    assert_eq!(row.get::<f64, _>("fat"), 10.3);
    assert_eq!(row.get::<f64, _>("protein"), 10.3);
    assert_eq!(row.get::<f64, _>("energy"), 46.0);
    assert!((row.get::<f64, _>("protein_fat_index") - 1.0).abs() < 1e-9);
    assert_eq!(
        row.get::<String, _>("brands"),
        r#"["Oatly","Alpro"]"#
    );

    // Derived rows come only from the single accepted product
    assert_eq!(
        lookup_values(&pool, "brands", "brand").await,
        vec!["Alpro", "Oatly"]
    );
    assert_eq!(
        lookup_values(&pool, "categories", "category").await,
        vec!["Beverages", "Plant milks"]
    );
    assert_eq!(lookup_values(&pool, "stores", "store").await, vec!["Rewe"]);
    assert_eq!(count(&pool, "brand_food").await, 2);
    assert_eq!(count(&pool, "category_food").await, 2);
    assert_eq!(count(&pool, "store_food").await, 1);

    // The FTS index finds the loaded product by name
    let hits: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM food_fts WHERE food_fts MATCH ?")
        .bind("Haferdrink")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(hits, 1);

    pool.close().await;
}

#[tokio::test]
async fn test_rerun_rebuilds_identical_lookups() {
    let content = tsv(&[&german_row("Haferdrink"), &german_row("Hafermilch")]);
    let (_tmp, config, pool) = setup(&content).await;

    export_to_pool(&config, &pool).await.unwrap();
    let first_brands = lookup_values(&pool, "brands", "brand").await;
    let first_food = count(&pool, "food").await;

    export_to_pool(&config, &pool).await.unwrap();
    let second_brands = lookup_values(&pool, "brands", "brand").await;

    assert_eq!(first_food, 2);
    assert_eq!(count(&pool, "food").await, 2);
    // No duplicate brand entries across runs: full rebuild, not a merge
    assert_eq!(first_brands, second_brands);
    assert_eq!(first_brands, vec!["Alpro", "Oatly"]);

    pool.close().await;
}

#[tokio::test]
async fn test_malformed_line_is_skipped() {
    let mut content = tsv(&[&german_row("Haferdrink")]).into_bytes();
    // A line with an invalid UTF-8 byte in a field
    content.extend_from_slice(b"Bad\xff\tu\ti\tb\tc\ts\tGermany\t0.9\t1\t1\t1\t1\n");
    content.extend_from_slice(tsv(&[&german_row("Hafermilch")]).lines().nth(1).unwrap().as_bytes());
    content.push(b'\n');

    let tmp = TempDir::new().unwrap();
    let csv_path = tmp.path().join("products.csv");
    std::fs::write(&csv_path, &content).unwrap();

    let mut config = Config::default();
    config.source.path = Some(csv_path);
    config.db.path = Some(tmp.path().join("food.sqlite"));
    let pool = db::connect(config.db.path.as_deref().unwrap())
        .await
        .unwrap();

    let summary = export_to_pool(&config, &pool).await.unwrap();
    assert_eq!(summary.rows_inserted, 2);
    assert_eq!(summary.rows_skipped, 1);

    pool.close().await;
}

#[tokio::test]
async fn test_missing_column_yields_empty_values() {
    // No `stores` column at all: rows still load, stores just stays NULL
    let header: Vec<&str> = HEADER
        .iter()
        .copied()
        .filter(|c| *c != "stores")
        .collect();
    let row: Vec<&str> = vec![
        "Haferdrink",
        "https://off.example/1",
        "",
        "Oatly",
        "Beverages",
        "Germany",
        "0.9",
        "2",
        "1",
        "7",
        "40",
    ];
    let content = format!("{}\n{}\n", header.join("\t"), row.join("\t"));
    let (_tmp, config, pool) = setup(&content).await;

    let summary = export_to_pool(&config, &pool).await.unwrap();
    assert_eq!(summary.rows_inserted, 1);

    let stores: Option<String> = sqlx::query_scalar("SELECT stores FROM food")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stores, None);
    assert_eq!(count(&pool, "stores").await, 0);
    assert_eq!(count(&pool, "store_food").await, 0);

    pool.close().await;
}

fn make_row(name: &str) -> FoodRow {
    FoodRow {
        name: Some(name.to_string()),
        url: None,
        image_url: None,
        brands: None,
        categories: None,
        stores: None,
        fat: 1.0,
        protein: 2.0,
        carbs: 3.0,
        energy: 4.0,
        protein_fat_index: Some(2.0),
    }
}

async fn scratch_pool(tmp: &TempDir) -> SqlitePool {
    let pool = db::connect(&tmp.path().join("food.sqlite")).await.unwrap();
    schema::reset(&pool).await.unwrap();
    pool
}

#[tokio::test]
async fn test_chunked_flush_writes_all_rows() {
    let tmp = TempDir::new().unwrap();
    let pool = scratch_pool(&tmp).await;

    // 250 rows with a 90-row chunk limit: three sub-inserts, one transaction
    let mut loader = BatchLoader::new(pool.clone(), 10_000, 90);
    for i in 0..250 {
        loader.add(make_row(&format!("row-{}", i))).await.unwrap();
    }
    assert_eq!(loader.pending(), 250);
    let written = loader.flush().await.unwrap();
    assert_eq!(written, 250);
    assert_eq!(count(&pool, "food").await, 250);

    pool.close().await;
}

#[tokio::test]
async fn test_failed_flush_rolls_back_every_chunk() {
    let tmp = TempDir::new().unwrap();
    let pool = scratch_pool(&tmp).await;
    // Force a failure in the third sub-insert via a uniqueness violation
    sqlx::query("CREATE UNIQUE INDEX idx_food_name_test ON food(name)")
        .execute(&pool)
        .await
        .unwrap();

    let mut loader = BatchLoader::new(pool.clone(), 10_000, 90);
    for i in 0..250 {
        // rows 200 and 201 collide, which lands in the third chunk
        let name = if i == 201 { 200 } else { i };
        loader.add(make_row(&format!("row-{}", name))).await.unwrap();
    }
    let result = loader.flush().await;
    assert!(result.is_err());
    // Nothing from the earlier chunks is visible either
    assert_eq!(count(&pool, "food").await, 0);

    pool.close().await;
}

#[tokio::test]
async fn test_auto_flush_at_batch_size() {
    let tmp = TempDir::new().unwrap();
    let pool = scratch_pool(&tmp).await;

    let mut loader = BatchLoader::new(pool.clone(), 10, 90);
    let mut flushed_total = 0u64;
    for i in 0..25 {
        flushed_total += loader.add(make_row(&format!("row-{}", i))).await.unwrap();
    }
    // Two automatic flushes of 10, remainder still pending
    assert_eq!(flushed_total, 20);
    assert_eq!(loader.pending(), 5);
    flushed_total += loader.flush().await.unwrap();
    assert_eq!(flushed_total, 25);
    assert_eq!(count(&pool, "food").await, 25);

    pool.close().await;
}

#[tokio::test]
async fn test_search_across_all_indexes() {
    let content = tsv(&[&german_row("Haferdrink")]);
    let (_tmp, config, pool) = setup(&content).await;
    export_to_pool(&config, &pool).await.unwrap();

    // Product names come from food_fts, joined back to food by rowid
    let hits = search::fetch_hits(&pool, SearchIndex::Food, "Haferdrink", 12)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 1);
    assert_eq!(hits[0].text, "Haferdrink");
    assert!(hits[0].snippet.contains("Haferdrink"));

    let hits = search::fetch_hits(&pool, SearchIndex::Brands, "Oatly", 12)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "Oatly");

    let hits = search::fetch_hits(&pool, SearchIndex::Categories, "Beverages", 12)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "Beverages");

    let hits = search::fetch_hits(&pool, SearchIndex::Stores, "Rewe", 12)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "Rewe");

    // Unmatched queries return no hits rather than an error
    let hits = search::fetch_hits(&pool, SearchIndex::Food, "nomatch", 12)
        .await
        .unwrap();
    assert!(hits.is_empty());

    pool.close().await;
}

#[tokio::test]
async fn test_search_command_paths() {
    let content = tsv(&[&german_row("Haferdrink")]);
    let (_tmp, config, pool) = setup(&content).await;
    export_to_pool(&config, &pool).await.unwrap();
    pool.close().await;

    // full command paths: hit, no hits, blank query, unknown index
    run_search(&config, "Haferdrink", "food", None).await.unwrap();
    run_search(&config, "nomatch", "food", Some(3)).await.unwrap();
    run_search(&config, "   ", "food", None).await.unwrap();
    assert!(run_search(&config, "oat", "unknown", None).await.is_err());
}

#[tokio::test]
async fn test_oversized_chunk_rows_is_clamped() {
    let tmp = TempDir::new().unwrap();
    let pool = scratch_pool(&tmp).await;

    // 200 rows in one sub-insert would need 2200 bind parameters, past
    // the statement limit; the loader caps the chunk size on its own
    let mut loader = BatchLoader::new(pool.clone(), 10_000, 10_000);
    for i in 0..200 {
        loader.add(make_row(&format!("row-{}", i))).await.unwrap();
    }
    assert_eq!(loader.flush().await.unwrap(), 200);
    assert_eq!(count(&pool, "food").await, 200);

    pool.close().await;
}

#[tokio::test]
async fn test_export_fails_on_missing_input() {
    let tmp = TempDir::new().unwrap();
    let mut config = Config::default();
    config.source.path = Some(tmp.path().join("nope.csv"));
    config.db.path = Some(tmp.path().join("food.sqlite"));
    let pool = db::connect(config.db.path.as_deref().unwrap())
        .await
        .unwrap();

    let result = export_to_pool(&config, &pool).await;
    assert!(result.is_err());

    pool.close().await;
}
