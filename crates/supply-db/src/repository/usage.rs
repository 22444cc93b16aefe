//! # Usage Event Repository
//!
//! Rows of `usage_events`, always read in id (append) order.
//!
//! Write helpers are generic over the executor so they run either on the
//! pool or inside a caller's transaction (`&mut *tx`).

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use supply_core::{SupplyType, UsageEvent};

const SELECT_EVENTS: &str = r#"
    SELECT id, printer, model, supply, date, time, user,
           counter_current, counter_previous, pages_consumed
    FROM usage_events
"#;

/// Repository for usage event operations.
#[derive(Debug, Clone)]
pub struct UsageRepository {
    pool: SqlitePool,
}

impl UsageRepository {
    /// Creates a new UsageRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UsageRepository { pool }
    }

    /// All events in append order.
    pub async fn list_all(&self) -> DbResult<Vec<UsageEvent>> {
        Self::load_all(&self.pool).await
    }

    /// All events in append order, read through `executor`.
    pub async fn load_all<'e, E>(executor: E) -> DbResult<Vec<UsageEvent>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let events = sqlx::query_as::<_, UsageEvent>(&format!("{SELECT_EVENTS} ORDER BY id"))
            .fetch_all(executor)
            .await?;

        debug!(count = events.len(), "Loaded usage events");
        Ok(events)
    }

    /// Events of one printer/supply pair in append order.
    pub async fn list_for_pair(
        &self,
        printer: &str,
        supply: SupplyType,
    ) -> DbResult<Vec<UsageEvent>> {
        let events = sqlx::query_as::<_, UsageEvent>(&format!(
            "{SELECT_EVENTS} WHERE printer = ?1 AND supply = ?2 ORDER BY id"
        ))
        .bind(printer)
        .bind(supply)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM usage_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Inserts one event with its precomputed id.
    pub async fn insert<'e, E>(executor: E, event: &UsageEvent) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(
            id = event.id,
            printer = %event.printer,
            supply = %event.supply,
            "Inserting usage event"
        );

        sqlx::query(
            r#"
            INSERT INTO usage_events (
                id, printer, model, supply, date, time, user,
                counter_current, counter_previous, pages_consumed
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(event.id)
        .bind(&event.printer)
        .bind(&event.model)
        .bind(event.supply)
        .bind(event.date)
        .bind(event.time)
        .bind(&event.user)
        .bind(event.counter_current)
        .bind(event.counter_previous)
        .bind(event.pages_consumed)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Replaces the whole table with `events` in one transaction.
    pub async fn replace_all(&self, events: &[UsageEvent]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM usage_events")
            .execute(&mut *tx)
            .await?;
        for event in events {
            Self::insert(&mut *tx, event).await?;
        }

        tx.commit().await?;
        debug!(count = events.len(), "Replaced usage events");
        Ok(())
    }
}
