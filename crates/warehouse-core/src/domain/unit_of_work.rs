//! Unit of work contract
//!
//! A unit of work brackets one or more repository calls in a single
//! transaction. [`run_in_transaction`] is the scoped form: it commits when
//! the work succeeds and rolls back when it fails.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{Error, Result};

/// Lifecycle of a unit of work
///
/// `Idle` until `begin`, `Active` until `commit` or `rollback`, then
/// `Closed` for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOfWorkState {
    Idle,
    Active,
    Closed,
}

impl UnitOfWorkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }

    /// State after `begin`, or `InvalidState` if the unit was already closed
    pub fn begin(self) -> Result<Self> {
        match self {
            Self::Idle | Self::Active => Ok(Self::Active),
            Self::Closed => Err(Error::InvalidState(
                "unit of work is closed and cannot be re-entered".to_string(),
            )),
        }
    }
}

impl fmt::Display for UnitOfWorkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction boundary over the repositories sharing its session
#[async_trait]
pub trait UnitOfWork: Send {
    /// Enter the scope; a closed unit cannot be re-entered
    async fn begin(&mut self) -> Result<()>;

    /// Persist all pending changes and close the unit
    ///
    /// No-op once closed. Committing a unit that never began is an error.
    async fn commit(&mut self) -> Result<()>;

    /// Discard all pending changes and close the unit
    ///
    /// No-op once closed.
    async fn rollback(&mut self) -> Result<()>;

    fn state(&self) -> UnitOfWorkState;
}

/// Run `work` inside `uow`
///
/// Commits exactly once when `work` returns `Ok`, rolls back exactly once
/// when it returns `Err`. The error from `work` is returned even if the
/// rollback fails too; that failure is only logged.
pub async fn run_in_transaction<U, F, Fut, T>(uow: &mut U, work: F) -> Result<T>
where
    U: UnitOfWork + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    uow.begin().await?;

    match work().await {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "Rollback failed after error: {}", err);
            }
            Err(err)
        }
    }
}
