use core::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use cutlery_core::EntryId;

/// Venue listed when a request does not name one.
pub const DEFAULT_VENUE: &str = "PORT";

/// Per-item counts recorded in one inventory entry.
///
/// All counts are non-negative and fit the store's 32-bit `INTEGER` columns;
/// `EntryPayload` enforces this before a value of this type is built from input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCounts {
    pub forks: i32,
    pub knives: i32,
    pub steak_knives: i32,
    pub spoons: i32,
    pub dessert_spoons: i32,
    /// Ice buckets.
    pub ice_cooler: i32,
    pub plates: i32,
    pub sugar_tongs: i32,
    pub ice_tongs: i32,
    #[serde(default)]
    pub ashtrays: i32,
}

/// Validated, store-ready field set for create and full-replace update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFields {
    pub venue: String,
    pub date: NaiveDate,
    pub counts: ItemCounts,
    pub responsible_name: Option<String>,
    pub responsible_date: Option<NaiveDate>,
}

/// A persisted inventory count for a venue on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub id: EntryId,
    pub venue: String,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub counts: ItemCounts,
    pub responsible_name: Option<String>,
    pub responsible_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl InventoryEntry {
    /// Build a freshly inserted entry from store-assigned identity.
    pub fn from_fields(id: EntryId, created_at: DateTime<Utc>, fields: EntryFields) -> Self {
        Self {
            id,
            venue: fields.venue,
            date: fields.date,
            counts: fields.counts,
            responsible_name: fields.responsible_name,
            responsible_date: fields.responsible_date,
            created_at,
        }
    }

    /// Replace every mutable field, leaving `id` and `created_at` untouched.
    pub fn replace_fields(&mut self, fields: EntryFields) {
        self.venue = fields.venue;
        self.date = fields.date;
        self.counts = fields.counts;
        self.responsible_name = fields.responsible_name;
        self.responsible_date = fields.responsible_date;
    }

    /// Order used when listing one venue: newest entry date first, then newest insert.
    pub fn listing_order(a: &Self, b: &Self) -> Ordering {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id))
    }

    /// Order used by the full export: venue ascending, then `listing_order`.
    pub fn export_order(a: &Self, b: &Self) -> Ordering {
        a.venue
            .cmp(&b.venue)
            .then_with(|| Self::listing_order(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(id: i64, venue: &str, date: &str, created_secs: i64) -> InventoryEntry {
        InventoryEntry {
            id: EntryId::new(id).unwrap(),
            venue: venue.to_string(),
            date: date.parse().unwrap(),
            counts: ItemCounts::default(),
            responsible_name: None,
            responsible_date: None,
            created_at: Utc.timestamp_opt(created_secs, 0).unwrap(),
        }
    }

    #[test]
    fn serializes_with_flat_snake_case_counts() {
        let mut e = entry(3, "PORT", "2024-01-15", 0);
        e.counts.steak_knives = 2;
        e.counts.ice_cooler = 1;

        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["id"], 3);
        assert_eq!(v["date"], "2024-01-15");
        assert_eq!(v["steak_knives"], 2);
        assert_eq!(v["ice_cooler"], 1);
        assert_eq!(v["ashtrays"], 0);
        assert!(v["responsible_name"].is_null());
        assert!(v["created_at"].is_string());
    }

    #[test]
    fn listing_puts_latest_date_first_and_breaks_ties_by_insert_time() {
        let mut entries = vec![
            entry(1, "PORT", "2024-01-10", 10),
            entry(2, "PORT", "2024-01-15", 20),
            entry(3, "PORT", "2024-01-15", 30),
        ];
        entries.sort_by(InventoryEntry::listing_order);

        let ids: Vec<i64> = entries.iter().map(|e| e.id.get()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn export_groups_by_venue() {
        let mut entries = vec![
            entry(1, "PORT", "2024-01-10", 10),
            entry(2, "DICKENS", "2024-01-01", 20),
            entry(3, "PORT", "2024-02-01", 30),
            entry(4, "DICKENS", "2024-03-01", 40),
        ];
        entries.sort_by(InventoryEntry::export_order);

        let ids: Vec<i64> = entries.iter().map(|e| e.id.get()).collect();
        assert_eq!(ids, vec![4, 2, 3, 1]);
    }

    #[test]
    fn replace_keeps_identity_and_creation_time() {
        let mut e = entry(9, "PORT", "2024-01-10", 100);
        let before = (e.id, e.created_at);

        e.replace_fields(EntryFields {
            venue: "DICKENS".to_string(),
            date: "2024-05-05".parse().unwrap(),
            counts: ItemCounts { forks: 4, ..ItemCounts::default() },
            responsible_name: Some("Anna".to_string()),
            responsible_date: None,
        });

        assert_eq!((e.id, e.created_at), before);
        assert_eq!(e.venue, "DICKENS");
        assert_eq!(e.counts.forks, 4);
    }
}
