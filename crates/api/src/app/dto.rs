use serde::{Deserialize, Serialize};

use cutlery_inventory::InventoryEntry;

// -------------------------
// Request DTOs
// -------------------------

/// `GET /inventory?venue=...`
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub venue: Option<String>,
}

/// `DELETE /inventory?id=...`
///
/// Kept as a string so that a malformed id surfaces as a validation error
/// instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    pub id: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct EntriesResponse {
    pub entries: Vec<InventoryEntry>,
}

/// `entry` is `null` when an update addressed an unknown id.
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub entry: Option<InventoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}
