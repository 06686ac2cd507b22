//! Storage subsystem
//!
//! Session store, NAS table and credentials lookup.
//!
//! Components:
//! - `storage_trait`: the `AccountingStore`, `NasDirectory` and `CredentialDirectory` traits.
//! - `types`: domain records exchanged with backends.
//! - `database_storage`: SeaORM implementation over SQLite.
//! - `session_filter`: helpers to build session queries.
//! - `db_entities`: SeaORM entity models for the FreeRADIUS tables.

pub mod database_storage;
pub mod db_entities;
pub mod session_filter;
pub mod storage_trait;
#[cfg(test)]
pub mod test_support;
pub mod types;

pub use database_storage::DatabaseStorage;
pub use storage_trait::{AccountingStore, CredentialDirectory, NasDirectory};
pub use types::{InsertOutcome, NasRecord, NewSession, SessionFilter, SessionRecord, SessionUpdate};
