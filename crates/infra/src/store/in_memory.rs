use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use cutlery_core::EntryId;
use cutlery_inventory::{EntryFields, InventoryEntry};

use super::{InventoryStore, StoreError};

#[derive(Debug, Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<EntryId, InventoryEntry>,
}

/// In-memory inventory table.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    table: RwLock<Table>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("lock poisoned".to_string())
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn list_by_venue(&self, venue: &str) -> Result<Vec<InventoryEntry>, StoreError> {
        let table = self.table.read().map_err(|_| Self::poisoned())?;
        let mut entries: Vec<InventoryEntry> = table
            .rows
            .values()
            .filter(|e| e.venue == venue)
            .cloned()
            .collect();
        entries.sort_by(InventoryEntry::listing_order);
        Ok(entries)
    }

    async fn insert(&self, fields: &EntryFields) -> Result<InventoryEntry, StoreError> {
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;

        // Sequence semantics: ids are never reused, even after deletes.
        let next = table.last_id + 1;
        let id = EntryId::new(next).map_err(|e| StoreError::Query(e.to_string()))?;
        table.last_id = next;

        let entry = InventoryEntry::from_fields(id, Utc::now(), fields.clone());
        table.rows.insert(id, entry.clone());
        Ok(entry)
    }

    async fn update(
        &self,
        id: EntryId,
        fields: &EntryFields,
    ) -> Result<Option<InventoryEntry>, StoreError> {
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;
        Ok(table.rows.get_mut(&id).map(|entry| {
            entry.replace_fields(fields.clone());
            entry.clone()
        }))
    }

    async fn delete(&self, id: EntryId) -> Result<u64, StoreError> {
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;
        Ok(u64::from(table.rows.remove(&id).is_some()))
    }

    async fn list_all(&self) -> Result<Vec<InventoryEntry>, StoreError> {
        let table = self.table.read().map_err(|_| Self::poisoned())?;
        let mut entries: Vec<InventoryEntry> = table.rows.values().cloned().collect();
        entries.sort_by(InventoryEntry::export_order);
        Ok(entries)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.table.read().map(|_| ()).map_err(|_| Self::poisoned())
    }
}
