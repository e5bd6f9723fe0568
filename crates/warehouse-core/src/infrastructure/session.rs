//! Shared database session
//!
//! A `Session` is the ambient transaction that repositories and the unit of
//! work operate on. Clones share the same transaction. The transaction is
//! begun lazily on first use and stays open until `commit` or `rollback`.

use std::fmt;
use std::sync::Arc;

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::Database;

type SqliteTransaction = Transaction<'static, Sqlite>;

/// Connection guard into the session's open transaction
pub type SessionConnection<'a> = MappedMutexGuard<'a, SqliteConnection>;

/// Shared handle to one open transaction
#[derive(Clone)]
pub struct Session {
    pool: SqlitePool,
    transaction: Arc<Mutex<Option<SqliteTransaction>>>,
}

impl Session {
    pub fn new(db: &Database) -> Self {
        Self::from_pool(db.pool().clone())
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            transaction: Arc::new(Mutex::new(None)),
        }
    }

    /// Connection inside the open transaction, beginning one if needed
    ///
    /// The guard serializes access; drop it before calling back into the
    /// session.
    pub async fn connection(&self) -> Result<SessionConnection<'_>> {
        let mut slot = self.transaction.lock().await;
        if slot.is_none() {
            *slot = Some(self.pool.begin().await?);
            debug!("Began transaction");
        }

        MutexGuard::try_map(slot, |slot| slot.as_mut().map(|tx| &mut **tx))
            .map_err(|_| Error::InvalidState("session has no open transaction".to_string()))
    }

    /// Make sure a transaction is open
    pub async fn begin(&self) -> Result<()> {
        let mut slot = self.transaction.lock().await;
        if slot.is_none() {
            *slot = Some(self.pool.begin().await?);
            debug!("Began transaction");
        }
        Ok(())
    }

    /// Commit the open transaction, if any
    pub async fn commit(&self) -> Result<()> {
        let transaction = self.transaction.lock().await.take();
        if let Some(transaction) = transaction {
            transaction.commit().await?;
            debug!("Committed transaction");
        }
        Ok(())
    }

    /// Roll back the open transaction, if any
    pub async fn rollback(&self) -> Result<()> {
        let transaction = self.transaction.lock().await.take();
        if let Some(transaction) = transaction {
            transaction.rollback().await?;
            debug!("Rolled back transaction");
        }
        Ok(())
    }

    /// Drop the open transaction without awaiting
    ///
    /// sqlx rolls back a transaction that is dropped uncommitted. Returns
    /// false if the session is busy and nothing was dropped.
    pub fn discard(&self) -> bool {
        match self.transaction.try_lock() {
            Ok(mut slot) => {
                if slot.take().is_some() {
                    debug!("Discarded open transaction");
                }
                true
            }
            Err(_) => false,
        }
    }

    pub async fn in_transaction(&self) -> bool {
        self.transaction.lock().await.is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}
