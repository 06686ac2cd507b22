//! Storage traits
//!
//! The session store is reached only through these traits so the lifecycle
//! handler, aggregator and registry can be built on any backend.
//!
//! Every mutation of a (username, session id) lineage is a single atomic
//! statement on the backend: Start is a conditional insert guarded by the
//! "one open record per lineage" constraint, Interim-Update and Stop are
//! conditional updates of the open record. No in-process locking is needed.

use async_trait::async_trait;

use crate::error_handling::types::StorageError;
use crate::storage::types::{
    InsertOutcome, NasRecord, NewSession, SessionFilter, SessionRecord, SessionUpdate,
};

#[async_trait]
pub trait AccountingStore: Send + Sync {
    /// Inserts a new open record unless the lineage already has one.
    async fn insert_session(&self, session: &NewSession) -> Result<InsertOutcome, StorageError>;

    /// Overwrites counters and `update_time` of the open record.
    ///
    /// Returns `false` when no open record exists.
    async fn update_open_session(&self, update: &SessionUpdate) -> Result<bool, StorageError>;

    /// Closes the open record with final counters and terminate cause.
    ///
    /// Returns `false` when no open record exists.
    async fn close_open_session(&self, update: &SessionUpdate) -> Result<bool, StorageError>;

    async fn find_open_session(
        &self,
        username: &str,
        session_id: &str,
    ) -> Result<Option<SessionRecord>, StorageError>;

    /// Records matching `filter`, newest start first.
    async fn get_sessions(&self, filter: &SessionFilter)
        -> Result<Vec<SessionRecord>, StorageError>;
}

/// Read access to the NAS table.
#[async_trait]
pub trait NasDirectory: Send + Sync {
    async fn get_nas(&self, name: Option<&str>) -> Result<Vec<NasRecord>, StorageError>;
}

/// The credentials collaborator, consulted only for the registered-user count.
#[async_trait]
pub trait CredentialDirectory: Send + Sync {
    async fn distinct_username_count(&self) -> Result<u64, StorageError>;
}
