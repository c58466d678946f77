use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};

use crate::config::{expand_path, Config};
use crate::db;

const DEFAULT_LIMIT: i64 = 12;

/// Which FTS5 index to query. Each maps to an external-content table built
/// by the schema derivation pass.
#[derive(Debug, Clone, Copy)]
pub enum SearchIndex {
    Food,
    Brands,
    Categories,
    Stores,
}

impl SearchIndex {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "food" => Ok(Self::Food),
            "brands" => Ok(Self::Brands),
            "categories" => Ok(Self::Categories),
            "stores" => Ok(Self::Stores),
            other => bail!(
                "Unknown search index: {}. Use food, brands, categories, or stores.",
                other
            ),
        }
    }
}

/// One ranked match from an FTS index, joined back to its content table.
#[derive(Debug)]
pub struct SearchHit {
    pub id: i64,
    pub text: String,
    pub snippet: String,
    pub score: f64,
}

pub async fn run_search(
    config: &Config,
    query: &str,
    index: &str,
    limit: Option<i64>,
) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let index = SearchIndex::parse(index)?;
    let db_path = expand_path(config.require_db()?);
    let pool = db::connect(&db_path).await?;

    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    let hits = fetch_hits(&pool, index, query, limit).await?;

    if hits.is_empty() {
        println!("No results.");
        pool.close().await;
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        println!("{}. [{:.2}] {}", i + 1, hit.score, hit.text);
        println!("    excerpt: \"{}\"", hit.snippet.replace('\n', " ").trim());
        println!("    id: {}", hit.id);
        println!();
    }

    pool.close().await;
    Ok(())
}

/// Query one FTS index, best matches first.
///
/// Public alongside [`run_search`] so callers (and tests) can get hits
/// without going through the printing command.
pub async fn fetch_hits(
    pool: &SqlitePool,
    index: SearchIndex,
    query: &str,
    limit: i64,
) -> Result<Vec<SearchHit>> {
    // External-content FTS tables share rowids with their base table, so
    // the join back is on rowid = id.
    let sql = match index {
        SearchIndex::Food => {
            "SELECT f.id AS id, COALESCE(f.name, '') AS text, rank,
                    snippet(food_fts, 0, '>>>', '<<<', '...', 12) AS snippet
             FROM food_fts
             JOIN food f ON f.id = food_fts.rowid
             WHERE food_fts MATCH ?
             ORDER BY rank
             LIMIT ?"
        }
        SearchIndex::Brands => {
            "SELECT b.id AS id, b.brand AS text, rank,
                    snippet(brands_fts, 0, '>>>', '<<<', '...', 12) AS snippet
             FROM brands_fts
             JOIN brands b ON b.id = brands_fts.rowid
             WHERE brands_fts MATCH ?
             ORDER BY rank
             LIMIT ?"
        }
        SearchIndex::Categories => {
            "SELECT c.id AS id, c.category AS text, rank,
                    snippet(categories_fts, 0, '>>>', '<<<', '...', 12) AS snippet
             FROM categories_fts
             JOIN categories c ON c.id = categories_fts.rowid
             WHERE categories_fts MATCH ?
             ORDER BY rank
             LIMIT ?"
        }
        SearchIndex::Stores => {
            "SELECT s.id AS id, s.store AS text, rank,
                    snippet(stores_fts, 0, '>>>', '<<<', '...', 12) AS snippet
             FROM stores_fts
             JOIN stores s ON s.id = stores_fts.rowid
             WHERE stores_fts MATCH ?
             ORDER BY rank
             LIMIT ?"
        }
    };

    let rows = sqlx::query(sql)
        .bind(query)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    let hits = rows
        .iter()
        .map(|row| {
            let rank: f64 = row.get("rank");
            SearchHit {
                id: row.get("id"),
                text: row.get("text"),
                snippet: row.get("snippet"),
                // negate so higher = better
                score: -rank,
            }
        })
        .collect();

    Ok(hits)
}
