use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::InventoryEntry;

/// Format tag written into every export.
pub const BACKUP_FORMAT_VERSION: &str = "1.0";

/// Full read-only dump of all entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupDocument {
    pub backup_date: DateTime<Utc>,
    pub total_records: usize,
    pub version: String,
    pub entries: Vec<InventoryEntry>,
}

impl BackupDocument {
    /// Wrap entries (already in export order) taken at `backup_date`.
    pub fn new(entries: Vec<InventoryEntry>, backup_date: DateTime<Utc>) -> Self {
        Self {
            backup_date,
            total_records: entries.len(),
            version: BACKUP_FORMAT_VERSION.to_string(),
            entries,
        }
    }

    /// Download name offered to clients, e.g. `inventory_backup_20240115_093000.json`.
    pub fn file_name(&self) -> String {
        format!(
            "inventory_backup_{}.json",
            self.backup_date.format("%Y%m%d_%H%M%S")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn empty_export_has_zero_records() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        let doc = BackupDocument::new(vec![], at);

        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["total_records"], 0);
        assert_eq!(v["version"], "1.0");
        assert_eq!(v["entries"], serde_json::json!([]));
        assert_eq!(doc.file_name(), "inventory_backup_20240115_093000.json");
    }
}
