use log::{debug, info};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbBackend, EntityTrait,
    PaginatorTrait, QueryResult, Statement, TransactionError, TransactionTrait, Value,
};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use super::migrations;
use crate::entities::{activity, attendance_event, class_assignment, period, session, student};
use crate::error::{AppError, Result};

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Private in-memory database, gone when the handle is dropped
    Memory,
    File(PathBuf),
}

/// Local storage manager for session, roster, calendar and attendance data
#[derive(Debug, Clone)]
pub struct LocalStorage {
    pub(crate) conn: DatabaseConnection,
    location: StoreLocation,
}

impl LocalStorage {
    /// Open (creating if needed) the database and bring its schema up to date.
    ///
    /// Any failure to create or open the file is reported as
    /// [`AppError::StoreUnavailable`].
    pub async fn open(location: StoreLocation) -> Result<Self> {
        let options = match &location {
            StoreLocation::Memory => {
                // A pooled in-memory database is per-connection, so keep exactly one alive
                let mut options = ConnectOptions::new("sqlite::memory:");
                options
                    .min_connections(1)
                    .max_connections(1)
                    .idle_timeout(Duration::from_secs(24 * 60 * 60))
                    .max_lifetime(Duration::from_secs(24 * 60 * 60));
                options
            }
            StoreLocation::File(path) => {
                ensure_parent_dir(path)?;
                let mut options = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
                options.min_connections(1).max_connections(4);
                options
            }
        };

        let mut options = options;
        options.sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;

        if matches!(location, StoreLocation::File(_)) {
            // Readers keep working while an upload batch is being marked
            conn.execute_unprepared("PRAGMA journal_mode=WAL")
                .await
                .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        }

        let applied = migrations::run(&conn)
            .await
            .map_err(|e| AppError::StoreUnavailable(format!("schema migration failed: {e}")))?;
        if !applied.is_empty() {
            info!("💾 Applied schema migrations {:?}", applied);
        }
        debug!("💾 Local store ready at {:?}", location);

        Ok(Self { conn, location })
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Run `body` inside one write transaction.
    ///
    /// Commits when `body` returns `Ok`, rolls back on `Err`; if the future is
    /// dropped mid-way the transaction is rolled back as well.
    pub async fn transaction<F, T>(&self, body: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c DatabaseTransaction) -> Pin<Box<dyn Future<Output = Result<T>> + Send + 'c>> + Send,
        T: Send,
    {
        self.conn.transaction::<F, T, AppError>(body).await.map_err(|e| match e {
            TransactionError::Connection(db) => AppError::Store(db),
            TransactionError::Transaction(inner) => inner,
        })
    }

    /// Execute a parameterized statement and return the affected row count.
    pub async fn execute(&self, sql: &str, values: Vec<Value>) -> Result<u64> {
        let statement = Statement::from_sql_and_values(DbBackend::Sqlite, sql, values);
        Ok(self.conn.execute(statement).await?.rows_affected())
    }

    /// Run a parameterized query and return the raw rows.
    pub async fn query(&self, sql: &str, values: Vec<Value>) -> Result<Vec<QueryResult>> {
        let statement = Statement::from_sql_and_values(DbBackend::Sqlite, sql, values);
        Ok(self.conn.query_all(statement).await?)
    }

    /// Check if reference data has been downloaded
    pub async fn has_data(&self) -> Result<bool> {
        Ok(student::Entity::find().count(&self.conn).await? > 0)
    }

    /// Delete every row of every data table in one transaction.
    ///
    /// The schema and its version history are kept.
    pub async fn clear_all_data(&self) -> Result<()> {
        self.transaction(|txn| Box::pin(async move { wipe_tables(txn).await })).await?;
        info!("♻️ Local database wiped");
        Ok(())
    }
}

/// Delete every data row, children first.
pub(crate) async fn wipe_tables<C>(conn: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    attendance_event::Entity::delete_many().exec(conn).await?;
    activity::Entity::delete_many().exec(conn).await?;
    period::Entity::delete_many().exec(conn).await?;
    student::Entity::delete_many().exec(conn).await?;
    class_assignment::Entity::delete_many().exec(conn).await?;
    session::Entity::delete_many().exec(conn).await?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::StoreUnavailable(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }
    }
    Ok(())
}
