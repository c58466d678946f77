//! Batched, transactional inserts into the `food` table.
//!
//! Rows accumulate in memory and are flushed automatically once the batch
//! reaches the configured size, plus once at end-of-stream for the
//! remainder. A flush is all-or-nothing: its chunked multi-row inserts all
//! run inside a single transaction, so a failure in any chunk rolls the
//! whole flush back and propagates to the caller as a run-fatal error.

use anyhow::{Context, Result};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::models::FoodRow;

/// Bind parameters per inserted row; matches the column list in `flush`.
const PARAMS_PER_ROW: usize = 11;

/// Hard cap on rows per sub-insert: 90 rows at 11 parameters each stays
/// under SQLite's 999 bind-parameter ceiling.
const MAX_CHUNK_ROWS: usize = 90;

pub struct BatchLoader {
    pool: SqlitePool,
    batch: Vec<FoodRow>,
    batch_size: usize,
    chunk_rows: usize,
}

impl BatchLoader {
    /// `chunk_rows` bounds each multi-row INSERT and is clamped into
    /// `1..=90` so a flush can never exceed the parameter ceiling, even
    /// for callers that skip config validation.
    pub fn new(pool: SqlitePool, batch_size: usize, chunk_rows: usize) -> Self {
        let chunk_rows = chunk_rows.clamp(1, MAX_CHUNK_ROWS);
        debug_assert!(chunk_rows * PARAMS_PER_ROW < 999);
        Self {
            pool,
            batch: Vec::with_capacity(batch_size),
            batch_size: batch_size.max(1),
            chunk_rows,
        }
    }

    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    /// Accumulate a row, flushing automatically once the batch is full.
    /// Returns the number of rows written (0 when no flush happened).
    pub async fn add(&mut self, row: FoodRow) -> Result<u64> {
        self.batch.push(row);
        if self.batch.len() >= self.batch_size {
            self.flush().await
        } else {
            Ok(0)
        }
    }

    /// Write the accumulated batch in one transaction and clear it.
    pub async fn flush(&mut self) -> Result<u64> {
        if self.batch.is_empty() {
            return Ok(0);
        }

        let rows = std::mem::take(&mut self.batch);

        let mut tx = self.pool.begin().await.context("begin flush transaction")?;
        for chunk in rows.chunks(self.chunk_rows) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO food (name, url, image_url, brands, categories, stores, \
                 fat, protein, carbs, energy, protein_fat_index) ",
            );
            qb.push_values(chunk, |mut b, row| {
                b.push_bind(row.name.as_deref())
                    .push_bind(row.url.as_deref())
                    .push_bind(row.image_url.as_deref())
                    .push_bind(row.brands.as_deref())
                    .push_bind(row.categories.as_deref())
                    .push_bind(row.stores.as_deref())
                    .push_bind(row.fat)
                    .push_bind(row.protein)
                    .push_bind(row.carbs)
                    .push_bind(row.energy)
                    .push_bind(row.protein_fat_index);
            });
            qb.build()
                .execute(&mut *tx)
                .await
                .context("exec batch insert")?;
        }
        tx.commit().await.context("commit flush transaction")?;

        Ok(rows.len() as u64)
    }
}
