//! Infrastructure layer: storage adapters and configuration.

pub mod config;
pub mod store;

pub use config::AppConfig;
pub use store::{InMemoryInventoryStore, InventoryStore, PostgresInventoryStore, StoreError};
