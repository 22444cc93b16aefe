//! # Stock Repository
//!
//! Rows of `stock_entries`, keyed by (model, supply).

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use supply_core::{StockEntry, SupplyType};

/// Repository for stock entry operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// All entries ordered by model.
    pub async fn list_all(&self) -> DbResult<Vec<StockEntry>> {
        Self::load_all(&self.pool).await
    }

    pub async fn load_all<'e, E>(executor: E) -> DbResult<Vec<StockEntry>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let entries = sqlx::query_as::<_, StockEntry>(
            "SELECT model, supply, quantity FROM stock_entries ORDER BY model, supply",
        )
        .fetch_all(executor)
        .await?;

        debug!(count = entries.len(), "Loaded stock entries");
        Ok(entries)
    }

    pub async fn get(&self, model: &str, supply: SupplyType) -> DbResult<Option<StockEntry>> {
        let entry = sqlx::query_as::<_, StockEntry>(
            "SELECT model, supply, quantity FROM stock_entries WHERE model = ?1 AND supply = ?2",
        )
        .bind(model)
        .bind(supply)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Writes an entry, replacing any quantity already stored for its key.
    pub async fn upsert<'e, E>(executor: E, entry: &StockEntry) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(
            model = %entry.model,
            supply = %entry.supply,
            quantity = entry.quantity,
            "Writing stock entry"
        );

        sqlx::query(
            r#"
            INSERT INTO stock_entries (model, supply, quantity)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (model, supply) DO UPDATE SET quantity = excluded.quantity
            "#,
        )
        .bind(&entry.model)
        .bind(entry.supply)
        .bind(entry.quantity)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Sets the quantity of an existing entry.
    ///
    /// Returns the number of rows changed: 0 means the key does not exist.
    pub async fn update_quantity<'e, E>(executor: E, entry: &StockEntry) -> DbResult<u64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE stock_entries SET quantity = ?3 WHERE model = ?1 AND supply = ?2",
        )
        .bind(&entry.model)
        .bind(entry.supply)
        .bind(entry.quantity)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Inserts entries whose key is absent; existing rows are untouched.
    ///
    /// Returns how many rows were created.
    pub async fn insert_missing(&self, entries: &[StockEntry]) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut created = 0;

        for entry in entries {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO stock_entries (model, supply, quantity) VALUES (?1, ?2, ?3)",
            )
            .bind(&entry.model)
            .bind(entry.supply)
            .bind(entry.quantity)
            .execute(&mut *tx)
            .await?;
            created += result.rows_affected();
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Replaces the whole table with `entries` in one transaction.
    pub async fn replace_all(&self, entries: &[StockEntry]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM stock_entries")
            .execute(&mut *tx)
            .await?;
        for entry in entries {
            Self::upsert(&mut *tx, entry).await?;
        }

        tx.commit().await?;
        debug!(count = entries.len(), "Replaced stock entries");
        Ok(())
    }
}
