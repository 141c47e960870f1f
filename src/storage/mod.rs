//! clipkeep - Storage module
//!
//! Persistence for clipboard history entries

mod database;

pub use database::{HistoryStore, StorageError};
