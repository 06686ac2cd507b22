use std::path::Path;

use async_trait::async_trait;
use log::{debug, error, info};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};

use crate::configuration::types::DatabaseConfig;
use crate::error_handling::types::StorageError;
use crate::storage::db_entities::{nas, radacct, radcheck};
use crate::storage::storage_trait::{AccountingStore, CredentialDirectory, NasDirectory};
use crate::storage::types::{
    InsertOutcome, NasRecord, NewSession, SessionFilter, SessionRecord, SessionUpdate,
};

/// Idempotent schema bootstrap, one statement per entry.
///
/// `radacct_open_lineage` enforces at most one open record per
/// (username, acctsessionid); a racing second Start fails on it.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS radacct (
        radacctid INTEGER PRIMARY KEY AUTOINCREMENT,
        acctsessionid VARCHAR(64) NOT NULL,
        acctuniqueid VARCHAR(32) NOT NULL,
        username VARCHAR(64),
        nasipaddress VARCHAR(45) NOT NULL,
        acctstarttime TEXT,
        acctupdatetime TEXT,
        acctstoptime TEXT,
        acctsessiontime INTEGER,
        acctinputoctets BIGINT,
        acctoutputoctets BIGINT,
        calledstationid VARCHAR(50),
        callingstationid VARCHAR(50),
        acctterminatecause VARCHAR(32),
        framedipaddress VARCHAR(45)
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS radacct_acctuniqueid ON radacct (acctuniqueid)",
    "CREATE UNIQUE INDEX IF NOT EXISTS radacct_open_lineage
        ON radacct (username, acctsessionid) WHERE acctstoptime IS NULL",
    "CREATE INDEX IF NOT EXISTS radacct_username ON radacct (username)",
    "CREATE INDEX IF NOT EXISTS radacct_start ON radacct (acctstarttime)",
    "CREATE INDEX IF NOT EXISTS radacct_stop ON radacct (acctstoptime)",
    "CREATE TABLE IF NOT EXISTS nas (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nasname VARCHAR(128) NOT NULL,
        shortname VARCHAR(32),
        type VARCHAR(30) DEFAULT 'other',
        ports INTEGER,
        secret VARCHAR(60) NOT NULL,
        server VARCHAR(64),
        community VARCHAR(50),
        description VARCHAR(200)
    )",
    "CREATE INDEX IF NOT EXISTS nas_nasname ON nas (nasname)",
    "CREATE TABLE IF NOT EXISTS radcheck (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username VARCHAR(64) NOT NULL,
        attribute VARCHAR(64) NOT NULL,
        op CHAR(2) NOT NULL,
        value VARCHAR(253) NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS radcheck_username ON radcheck (username)",
];

/// SeaORM-backed session store.
pub struct DatabaseStorage {
    db: DatabaseConnection,
}

impl DatabaseStorage {
    /// Connects with the configured pool limits and ensures the schema exists.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StorageError> {
        let mut options = ConnectOptions::new(config.url.clone());
        options
            .max_connections(config.max_connections)
            .connect_timeout(config.connect_timeout())
            .acquire_timeout(config.acquire_timeout())
            .sqlx_logging(false);
        let db = Database::connect(options).await.map_err(|e| {
            error!("Failed to connect to {}: {}", config.url, e);
            StorageError::ConnectionFailed(e.to_string())
        })?;
        let storage = Self { db };
        storage.create_schema().await?;
        info!("Session store ready at {}", config.url);
        Ok(storage)
    }

    /// Opens (creating if missing) a SQLite file store.
    pub async fn new_file<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        }
        let config = DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", path.display()),
            ..Default::default()
        };
        Self::connect(&config).await
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn create_schema(&self) -> Result<(), StorageError> {
        for statement in SCHEMA {
            self.db
                .execute_unprepared(statement)
                .await
                .map_err(|e| classify(e, StorageError::WriteFailed))?;
        }
        debug!("Schema verified ({} statements)", SCHEMA.len());
        Ok(())
    }

    async fn apply_to_open(
        &self,
        update: &SessionUpdate,
        closing: bool,
    ) -> Result<bool, StorageError> {
        let mut statement = radacct::Entity::update_many()
            .col_expr(
                radacct::Column::Acctinputoctets,
                Expr::value(update.input_octets),
            )
            .col_expr(
                radacct::Column::Acctoutputoctets,
                Expr::value(update.output_octets),
            )
            .col_expr(
                radacct::Column::Acctsessiontime,
                Expr::value(update.session_duration_seconds),
            );
        statement = if closing {
            statement
                .col_expr(radacct::Column::Acctstoptime, Expr::value(update.at))
                .col_expr(
                    radacct::Column::Acctterminatecause,
                    Expr::value(update.terminate_cause.clone()),
                )
        } else {
            statement.col_expr(radacct::Column::Acctupdatetime, Expr::value(update.at))
        };
        let result = statement
            .filter(open_lineage(&update.username, &update.session_id))
            .exec(&self.db)
            .await
            .map_err(|e| classify(e, StorageError::WriteFailed))?;
        Ok(result.rows_affected > 0)
    }
}

fn open_lineage(username: &str, session_id: &str) -> Condition {
    Condition::all()
        .add(radacct::Column::Username.eq(username))
        .add(radacct::Column::Acctsessionid.eq(session_id))
        .add(radacct::Column::Acctstoptime.is_null())
}

/// True when `err` is the open-lineage index rejecting a second open row.
/// A clash on `acctuniqueid` is a real write failure.
fn violates_open_lineage(err: &DbErr) -> bool {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => {
            message.contains("acctsessionid") || message.contains("radacct_open_lineage")
        }
        _ => false,
    }
}

fn classify(err: DbErr, fallback: fn(String) -> StorageError) -> StorageError {
    let message = err.to_string();
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => StorageError::ConnectionFailed(message),
        _ => fallback(message),
    }
}

#[async_trait]
impl AccountingStore for DatabaseStorage {
    async fn insert_session(&self, session: &NewSession) -> Result<InsertOutcome, StorageError> {
        let row = radacct::ActiveModel {
            acctsessionid: Set(session.session_id.clone()),
            acctuniqueid: Set(session.unique_id.clone()),
            username: Set(Some(session.username.clone())),
            nasipaddress: Set(session.nas_address.clone()),
            acctstarttime: Set(Some(session.start_time)),
            acctupdatetime: Set(None),
            acctstoptime: Set(None),
            acctsessiontime: Set(None),
            acctinputoctets: Set(Some(session.input_octets)),
            acctoutputoctets: Set(Some(session.output_octets)),
            calledstationid: Set(session.called_station_id.clone()),
            callingstationid: Set(session.calling_station_id.clone()),
            acctterminatecause: Set(None),
            framedipaddress: Set(session.framed_ip_address.clone()),
            ..Default::default()
        };
        match radacct::Entity::insert(row).exec(&self.db).await {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if violates_open_lineage(&e) => {
                debug!(
                    "Open record already present for user {}, session {}",
                    session.username, session.session_id
                );
                Ok(InsertOutcome::AlreadyOpen)
            }
            Err(e) => Err(classify(e, StorageError::WriteFailed)),
        }
    }

    async fn update_open_session(&self, update: &SessionUpdate) -> Result<bool, StorageError> {
        self.apply_to_open(update, false).await
    }

    async fn close_open_session(&self, update: &SessionUpdate) -> Result<bool, StorageError> {
        self.apply_to_open(update, true).await
    }

    async fn find_open_session(
        &self,
        username: &str,
        session_id: &str,
    ) -> Result<Option<SessionRecord>, StorageError> {
        let row = radacct::Entity::find()
            .filter(open_lineage(username, session_id))
            .one(&self.db)
            .await
            .map_err(|e| classify(e, StorageError::ReadFailed))?;
        Ok(row.map(SessionRecord::from))
    }

    async fn get_sessions(
        &self,
        filter: &SessionFilter,
    ) -> Result<Vec<SessionRecord>, StorageError> {
        let mut query = radacct::Entity::find();
        if let Some(username) = &filter.username {
            query = query.filter(radacct::Column::Username.eq(username.as_str()));
        }
        if filter.open_only {
            query = query.filter(radacct::Column::Acctstoptime.is_null());
        }
        if let Some(since) = filter.window_since {
            query = query.filter(
                Condition::any()
                    .add(radacct::Column::Acctstarttime.gte(since))
                    .add(radacct::Column::Acctstoptime.is_null()),
            );
        }
        if let Some((from, to)) = filter.overlapping {
            query = query
                .filter(radacct::Column::Acctstarttime.lt(to))
                .filter(
                    Condition::any()
                        .add(radacct::Column::Acctstoptime.is_null())
                        .add(radacct::Column::Acctstoptime.gte(from)),
                );
        }
        let rows = query
            .order_by_desc(radacct::Column::Acctstarttime)
            .order_by_desc(radacct::Column::Radacctid)
            .all(&self.db)
            .await
            .map_err(|e| classify(e, StorageError::ReadFailed))?;
        Ok(rows.into_iter().map(SessionRecord::from).collect())
    }
}

#[async_trait]
impl NasDirectory for DatabaseStorage {
    async fn get_nas(&self, name: Option<&str>) -> Result<Vec<NasRecord>, StorageError> {
        let mut query = nas::Entity::find();
        if let Some(name) = name {
            query = query.filter(nas::Column::Nasname.eq(name));
        }
        let rows = query
            .order_by_asc(nas::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| classify(e, StorageError::ReadFailed))?;
        Ok(rows.into_iter().map(NasRecord::from).collect())
    }
}

#[async_trait]
impl CredentialDirectory for DatabaseStorage {
    async fn distinct_username_count(&self) -> Result<u64, StorageError> {
        radcheck::Entity::find()
            .select_only()
            .column(radcheck::Column::Username)
            .distinct()
            .count(&self.db)
            .await
            .map_err(|e| classify(e, StorageError::ReadFailed))
    }
}
