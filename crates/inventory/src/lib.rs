//! Inventory domain module.
//!
//! Entry model, request payload validation and the backup document shape.
//! Pure domain logic (no IO, no HTTP, no storage).

pub mod backup;
pub mod entry;
pub mod payload;

pub use backup::{BACKUP_FORMAT_VERSION, BackupDocument};
pub use entry::{DEFAULT_VENUE, EntryFields, InventoryEntry, ItemCounts};
pub use payload::EntryPayload;
