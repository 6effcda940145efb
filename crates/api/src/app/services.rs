//! Service wiring: the inventory service and the store it runs on.

use std::sync::Arc;

use chrono::Utc;

use cutlery_core::{DomainError, EntryId};
use cutlery_infra::config::AppConfig;
use cutlery_infra::{InMemoryInventoryStore, InventoryStore, PostgresInventoryStore, StoreError};
use cutlery_inventory::{BackupDocument, DEFAULT_VENUE, EntryPayload, InventoryEntry};

use crate::app::errors::ServiceError;

/// List/create/update/delete/export over one inventory table.
///
/// Holds no per-request state. Each operation is one statement against the store;
/// two concurrent updates of the same id are last-writer-wins.
#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn InventoryStore>,
    default_venue: String,
}

impl InventoryService {
    pub fn new(store: Arc<dyn InventoryStore>, default_venue: impl Into<String>) -> Self {
        Self {
            store,
            default_venue: default_venue.into(),
        }
    }

    /// Service over a fresh in-memory store (dev/test).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryInventoryStore::new()), DEFAULT_VENUE)
    }

    /// Entries of `venue` (or the default venue), newest entry date first.
    pub async fn list(&self, venue: Option<&str>) -> Result<Vec<InventoryEntry>, ServiceError> {
        let venue = venue
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.default_venue);
        Ok(self.store.list_by_venue(venue).await?)
    }

    /// Validate and insert a new entry.
    pub async fn create(&self, payload: &EntryPayload) -> Result<InventoryEntry, ServiceError> {
        let fields = payload.to_fields()?;
        let entry = self.store.insert(&fields).await?;
        tracing::info!(id = %entry.id, venue = %entry.venue, date = %entry.date, "inventory entry created");
        Ok(entry)
    }

    /// Full-replace update of the entry named by the payload's `id`.
    ///
    /// Returns `None` when no entry has that id.
    pub async fn update(
        &self,
        payload: &EntryPayload,
    ) -> Result<Option<InventoryEntry>, ServiceError> {
        let id = payload.id()?;
        let fields = payload.to_fields()?;
        let updated = self.store.update(id, &fields).await?;
        match &updated {
            Some(_) => tracing::info!(%id, "inventory entry updated"),
            None => tracing::info!(%id, "update addressed unknown entry"),
        }
        Ok(updated)
    }

    /// Permanently remove an entry. Unknown ids succeed without effect.
    ///
    /// The id must be present and numeric. Zero and negative ids name no row (the
    /// sequence starts at 1), so they succeed without touching the store.
    pub async fn delete(&self, id: Option<&str>) -> Result<(), ServiceError> {
        let raw = id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DomainError::invalid_id("ID is required"))?;
        let value: i64 = raw
            .parse()
            .map_err(|e| DomainError::invalid_id(format!("EntryId: {e}")))?;
        let Ok(id) = EntryId::new(value) else {
            tracing::info!(id = value, "delete addressed non-existent entry");
            return Ok(());
        };

        let removed = self.store.delete(id).await?;
        tracing::info!(%id, removed, "inventory entry delete");
        Ok(())
    }

    /// Dump every entry, grouped by venue.
    pub async fn export_all(&self) -> Result<BackupDocument, ServiceError> {
        let entries = self.store.list_all().await?;
        Ok(BackupDocument::new(entries, Utc::now()))
    }

    /// Whether the store answers.
    pub async fn health(&self) -> Result<(), ServiceError> {
        Ok(self.store.ping().await?)
    }
}

/// Build the service from configuration.
///
/// With `database.url` set this connects to Postgres (and creates the schema when
/// `database.run_migrations` is on); otherwise it falls back to the in-memory store.
pub async fn build_services(config: &AppConfig) -> Result<InventoryService, StoreError> {
    let store: Arc<dyn InventoryStore> = match config.database.url.as_deref() {
        Some(url) => {
            let store = PostgresInventoryStore::connect(url, &config.database).await?;
            if config.database.run_migrations {
                store.run_migrations().await?;
                tracing::info!("inventory schema ensured");
            }
            tracing::info!("using postgres inventory store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("database.url / DATABASE_URL not set; using in-memory store (data is not persisted)");
            Arc::new(InMemoryInventoryStore::new())
        }
    };

    Ok(InventoryService::new(store, config.inventory.default_venue.clone()))
}
