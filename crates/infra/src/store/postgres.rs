//! Postgres-backed inventory store.
//!
//! Every statement binds its values through `$n` placeholders; nothing user-supplied
//! is ever spliced into SQL text.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique / foreign key / check / not-null violation) | `23505` / `23503` / `23514` / `23502` | `Constraint` |
//! | Database (other) | Any other | `Query` |
//! | PoolClosed / PoolTimedOut / Io / Tls | N/A | `Unavailable` |
//! | ColumnDecode / Decode / ColumnNotFound | N/A | `Decode` |
//! | Other | N/A | `Query` |
//!
//! ## Connection Lifecycle
//!
//! Each call checks a connection out of the pool and returns it on drop, on every
//! exit path. Writes run inside a transaction; an early `?` return drops the
//! transaction, which rolls it back.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use cutlery_core::EntryId;
use cutlery_inventory::{EntryFields, InventoryEntry, ItemCounts};

use super::{InventoryStore, StoreError};
use crate::config::DatabaseConfig;

macro_rules! entry_columns {
    () => {
        "id, venue, entry_date, forks, knives, steak_knives, spoons, dessert_spoons, \
         ice_cooler, plates, sugar_tongs, ice_tongs, ashtrays, responsible_name, \
         responsible_date, created_at"
    };
}

const LIST_BY_VENUE: &str = concat!(
    "SELECT ",
    entry_columns!(),
    " FROM inventory_entries WHERE venue = $1 \
     ORDER BY entry_date DESC, created_at DESC, id DESC"
);

const LIST_ALL: &str = concat!(
    "SELECT ",
    entry_columns!(),
    " FROM inventory_entries \
     ORDER BY venue ASC, entry_date DESC, created_at DESC, id DESC"
);

const INSERT: &str = concat!(
    "INSERT INTO inventory_entries (venue, entry_date, forks, knives, steak_knives, spoons, \
     dessert_spoons, ice_cooler, plates, sugar_tongs, ice_tongs, ashtrays, \
     responsible_name, responsible_date) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
     RETURNING ",
    entry_columns!()
);

const UPDATE: &str = concat!(
    "UPDATE inventory_entries SET venue = $2, entry_date = $3, forks = $4, knives = $5, \
     steak_knives = $6, spoons = $7, dessert_spoons = $8, ice_cooler = $9, plates = $10, \
     sugar_tongs = $11, ice_tongs = $12, ashtrays = $13, responsible_name = $14, \
     responsible_date = $15 \
     WHERE id = $1 RETURNING ",
    entry_columns!()
);

const DELETE: &str = "DELETE FROM inventory_entries WHERE id = $1";

const SCHEMA: &str = include_str!("../../migrations/0001_inventory_entries.sql");

/// Postgres-backed inventory table.
///
/// `PgPool` is internally reference counted, so clones share one pool.
#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool sized and timed out per `config`.
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the `inventory_entries` table and its index if they do not exist.
    #[instrument(skip(self), err)]
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("run_migrations", e))?;
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    #[instrument(skip(self), fields(operation = "list_by_venue"), err)]
    async fn list_by_venue(&self, venue: &str) -> Result<Vec<InventoryEntry>, StoreError> {
        let rows = sqlx::query(LIST_BY_VENUE)
            .bind(venue)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_by_venue", e))?;

        let entries = rows.iter().map(decode_entry).collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(count = entries.len(), "listed venue entries");
        Ok(entries)
    }

    #[instrument(skip(self, fields), fields(operation = "insert", venue = %fields.venue), err)]
    async fn insert(&self, fields: &EntryFields) -> Result<InventoryEntry, StoreError> {
        let c = &fields.counts;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query(INSERT)
            .bind(&fields.venue)
            .bind(fields.date)
            .bind(c.forks)
            .bind(c.knives)
            .bind(c.steak_knives)
            .bind(c.spoons)
            .bind(c.dessert_spoons)
            .bind(c.ice_cooler)
            .bind(c.plates)
            .bind(c.sugar_tongs)
            .bind(c.ice_tongs)
            .bind(c.ashtrays)
            .bind(fields.responsible_name.as_deref())
            .bind(fields.responsible_date)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_entry", e))?;

        let entry = decode_entry(&row)?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(entry)
    }

    #[instrument(skip(self, fields), fields(operation = "update", id = %id), err)]
    async fn update(
        &self,
        id: EntryId,
        fields: &EntryFields,
    ) -> Result<Option<InventoryEntry>, StoreError> {
        let c = &fields.counts;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query(UPDATE)
            .bind(id.get())
            .bind(&fields.venue)
            .bind(fields.date)
            .bind(c.forks)
            .bind(c.knives)
            .bind(c.steak_knives)
            .bind(c.spoons)
            .bind(c.dessert_spoons)
            .bind(c.ice_cooler)
            .bind(c.plates)
            .bind(c.sugar_tongs)
            .bind(c.ice_tongs)
            .bind(c.ashtrays)
            .bind(fields.responsible_name.as_deref())
            .bind(fields.responsible_date)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_entry", e))?;

        let entry = row.as_ref().map(decode_entry).transpose()?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(entry)
    }

    #[instrument(skip(self), fields(operation = "delete", id = %id), err)]
    async fn delete(&self, id: EntryId) -> Result<u64, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let result = sqlx::query(DELETE)
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_entry", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(operation = "list_all"), err)]
    async fn list_all(&self) -> Result<Vec<InventoryEntry>, StoreError> {
        let rows = sqlx::query(LIST_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_all", e))?;

        rows.iter().map(decode_entry).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ping", e))?;
        Ok(())
    }
}

// SQLx row types

#[derive(Debug)]
struct EntryRow {
    id: i64,
    venue: String,
    entry_date: NaiveDate,
    forks: i32,
    knives: i32,
    steak_knives: i32,
    spoons: i32,
    dessert_spoons: i32,
    ice_cooler: i32,
    plates: i32,
    sugar_tongs: i32,
    ice_tongs: i32,
    ashtrays: i32,
    responsible_name: Option<String>,
    responsible_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for EntryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(EntryRow {
            id: row.try_get("id")?,
            venue: row.try_get("venue")?,
            entry_date: row.try_get("entry_date")?,
            forks: row.try_get("forks")?,
            knives: row.try_get("knives")?,
            steak_knives: row.try_get("steak_knives")?,
            spoons: row.try_get("spoons")?,
            dessert_spoons: row.try_get("dessert_spoons")?,
            ice_cooler: row.try_get("ice_cooler")?,
            plates: row.try_get("plates")?,
            sugar_tongs: row.try_get("sugar_tongs")?,
            ice_tongs: row.try_get("ice_tongs")?,
            ashtrays: row.try_get("ashtrays")?,
            responsible_name: row.try_get("responsible_name")?,
            responsible_date: row.try_get("responsible_date")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<EntryRow> for InventoryEntry {
    type Error = StoreError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let id = EntryId::new(row.id).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(InventoryEntry {
            id,
            venue: row.venue,
            date: row.entry_date,
            counts: ItemCounts {
                forks: row.forks,
                knives: row.knives,
                steak_knives: row.steak_knives,
                spoons: row.spoons,
                dessert_spoons: row.dessert_spoons,
                ice_cooler: row.ice_cooler,
                plates: row.plates,
                sugar_tongs: row.sugar_tongs,
                ice_tongs: row.ice_tongs,
                ashtrays: row.ashtrays,
            },
            responsible_name: row.responsible_name,
            responsible_date: row.responsible_date,
            created_at: row.created_at,
        })
    }
}

fn decode_entry(row: &PgRow) -> Result<InventoryEntry, StoreError> {
    EntryRow::from_row(row)
        .map_err(|e| StoreError::Decode(format!("failed to deserialize entry row: {e}")))?
        .try_into()
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505" | "23503" | "23514" | "23502") => StoreError::Constraint(msg),
                _ => StoreError::Query(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("timed out acquiring a connection in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        sqlx::Error::Tls(e) => StoreError::Unavailable(format!("tls error in {operation}: {e}")),
        e @ (sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)) => {
            StoreError::Decode(format!("{operation}: {e}"))
        }
        other => StoreError::Query(format!("sqlx error in {operation}: {other}")),
    }
}
