//! Inventory entry storage boundary.
//!
//! The service talks to storage only through `InventoryStore`. Two adapters exist:
//! Postgres (production) and an in-memory table (tests/dev).

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use cutlery_core::EntryId;
use cutlery_inventory::{EntryFields, InventoryEntry};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;

/// Storage operation error.
///
/// These are **infrastructure errors** (connectivity, constraints, decoding) as
/// opposed to domain errors (validation).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("row decode failed: {0}")]
    Decode(String),
}

/// Persistent table of inventory entries.
///
/// Every method is a single statement against the store. Writes are committed
/// before the method returns.
///
/// Implementations must:
/// - assign `id` and `created_at` on insert and never change them afterwards
/// - return venue listings newest entry date first (see `InventoryEntry::listing_order`)
/// - return the full dump in `InventoryEntry::export_order`
/// - treat deletes of unknown ids as a no-op
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// All entries of one venue.
    async fn list_by_venue(&self, venue: &str) -> Result<Vec<InventoryEntry>, StoreError>;

    /// Insert a new entry and return the persisted row.
    async fn insert(&self, fields: &EntryFields) -> Result<InventoryEntry, StoreError>;

    /// Replace all mutable fields of an entry. `None` when no row has `id`.
    async fn update(
        &self,
        id: EntryId,
        fields: &EntryFields,
    ) -> Result<Option<InventoryEntry>, StoreError>;

    /// Remove an entry permanently. Returns the number of rows removed (0 or 1).
    async fn delete(&self, id: EntryId) -> Result<u64, StoreError>;

    /// Every entry across all venues.
    async fn list_all(&self) -> Result<Vec<InventoryEntry>, StoreError>;

    /// Cheap connectivity check used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    async fn list_by_venue(&self, venue: &str) -> Result<Vec<InventoryEntry>, StoreError> {
        (**self).list_by_venue(venue).await
    }

    async fn insert(&self, fields: &EntryFields) -> Result<InventoryEntry, StoreError> {
        (**self).insert(fields).await
    }

    async fn update(
        &self,
        id: EntryId,
        fields: &EntryFields,
    ) -> Result<Option<InventoryEntry>, StoreError> {
        (**self).update(id, fields).await
    }

    async fn delete(&self, id: EntryId) -> Result<u64, StoreError> {
        (**self).delete(id).await
    }

    async fn list_all(&self) -> Result<Vec<InventoryEntry>, StoreError> {
        (**self).list_all().await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        (**self).ping().await
    }
}
