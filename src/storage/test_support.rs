//! Fixtures for tests that need a real store.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{EntityTrait, Set};
use tempfile::TempDir;

use crate::error_handling::types::StorageError;
use crate::storage::database_storage::DatabaseStorage;
use crate::storage::db_entities::{nas, radacct, radcheck};
use crate::storage::storage_trait::{AccountingStore, CredentialDirectory, NasDirectory};
use crate::storage::types::{
    InsertOutcome, NasRecord, NewSession, SessionFilter, SessionRecord, SessionUpdate,
};

pub async fn temp_storage() -> Arc<DatabaseStorage> {
    let dir = TempDir::new().unwrap();
    let path: PathBuf = dir.path().join("radacct-test.sqlite3");
    // Keep TempDir alive by leaking it for the test duration
    Box::leak(Box::new(dir));
    Arc::new(DatabaseStorage::new_file(path).await.unwrap())
}

pub async fn seed_nas(storage: &DatabaseStorage, name: &str, short: &str, secret: &str) {
    let row = nas::ActiveModel {
        nasname: Set(name.into()),
        shortname: Set(Some(short.into())),
        nas_type: Set(Some("other".into())),
        ports: Set(None),
        secret: Set(secret.into()),
        server: Set(None),
        community: Set(None),
        description: Set(Some(format!("{} access point", short))),
        ..Default::default()
    };
    nas::Entity::insert(row)
        .exec(storage.connection())
        .await
        .unwrap();
}

pub async fn seed_credential(storage: &DatabaseStorage, username: &str) {
    let row = radcheck::ActiveModel {
        username: Set(username.into()),
        attribute: Set("Cleartext-Password".into()),
        op: Set(":=".into()),
        value: Set("hunter2".into()),
        ..Default::default()
    };
    radcheck::Entity::insert(row)
        .exec(storage.connection())
        .await
        .unwrap();
}

/// Inserts a closed row bypassing the lifecycle handler, counters left as given.
pub async fn insert_raw_row(
    storage: &DatabaseStorage,
    username: &str,
    session_id: &str,
    start: Option<DateTime<Utc>>,
    input: Option<i64>,
    output: Option<i64>,
) {
    let row = radacct::ActiveModel {
        acctsessionid: Set(session_id.into()),
        acctuniqueid: Set(format!("raw-{}-{}", username, session_id)),
        username: Set(Some(username.into())),
        nasipaddress: Set("127.0.0.1".into()),
        acctstarttime: Set(start),
        acctupdatetime: Set(None),
        acctstoptime: Set(start),
        acctsessiontime: Set(None),
        acctinputoctets: Set(input),
        acctoutputoctets: Set(output),
        calledstationid: Set(None),
        callingstationid: Set(None),
        acctterminatecause: Set(None),
        framedipaddress: Set(None),
        ..Default::default()
    };
    radacct::Entity::insert(row)
        .exec(storage.connection())
        .await
        .unwrap();
}

/// Store double whose every call fails, optionally after sleeping `delay`.
pub struct BrokenStore {
    pub delay: Option<Duration>,
}

impl BrokenStore {
    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self { delay: None })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self { delay: Some(delay) })
    }

    async fn fail<T: Send>(&self) -> Result<T, StorageError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Err(StorageError::ConnectionFailed("database is unreachable".into()))
    }
}

#[async_trait]
impl AccountingStore for BrokenStore {
    async fn insert_session(&self, _: &NewSession) -> Result<InsertOutcome, StorageError> {
        self.fail().await
    }
    async fn update_open_session(&self, _: &SessionUpdate) -> Result<bool, StorageError> {
        self.fail().await
    }
    async fn close_open_session(&self, _: &SessionUpdate) -> Result<bool, StorageError> {
        self.fail().await
    }
    async fn find_open_session(
        &self,
        _: &str,
        _: &str,
    ) -> Result<Option<SessionRecord>, StorageError> {
        self.fail().await
    }
    async fn get_sessions(&self, _: &SessionFilter) -> Result<Vec<SessionRecord>, StorageError> {
        self.fail().await
    }
}

#[async_trait]
impl NasDirectory for BrokenStore {
    async fn get_nas(&self, _: Option<&str>) -> Result<Vec<NasRecord>, StorageError> {
        self.fail().await
    }
}

#[async_trait]
impl CredentialDirectory for BrokenStore {
    async fn distinct_username_count(&self) -> Result<u64, StorageError> {
        self.fail().await
    }
}
