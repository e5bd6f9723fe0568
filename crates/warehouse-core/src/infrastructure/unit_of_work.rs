//! SQLite unit of work

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkState};
use crate::error::{Error, Result};

use super::session::Session;

/// Unit of work over a shared [`Session`]
///
/// Repositories built from clones of the same session take part in the
/// transaction. Dropping an active unit of work rolls it back.
#[derive(Debug)]
pub struct SqliteUnitOfWork {
    session: Session,
    state: UnitOfWorkState,
}

impl SqliteUnitOfWork {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            state: UnitOfWorkState::Idle,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
    async fn begin(&mut self) -> Result<()> {
        let next = self.state.begin()?;
        if self.state == UnitOfWorkState::Idle {
            self.session.begin().await?;
            debug!("Unit of work started");
        }
        self.state = next;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        match self.state {
            UnitOfWorkState::Closed => Ok(()),
            UnitOfWorkState::Idle => Err(Error::InvalidState(
                "cannot commit a unit of work that has not begun".to_string(),
            )),
            UnitOfWorkState::Active => {
                // Closed either way: a failed commit drops the transaction,
                // which rolls it back.
                self.state = UnitOfWorkState::Closed;
                self.session.commit().await?;
                info!("Unit of work committed");
                Ok(())
            }
        }
    }

    async fn rollback(&mut self) -> Result<()> {
        match self.state {
            UnitOfWorkState::Closed => Ok(()),
            UnitOfWorkState::Idle => {
                self.state = UnitOfWorkState::Closed;
                Ok(())
            }
            UnitOfWorkState::Active => {
                self.state = UnitOfWorkState::Closed;
                self.session.rollback().await?;
                info!("Unit of work rolled back");
                Ok(())
            }
        }
    }

    fn state(&self) -> UnitOfWorkState {
        self.state
    }
}

impl Drop for SqliteUnitOfWork {
    fn drop(&mut self) {
        if self.state == UnitOfWorkState::Active {
            if self.session.discard() {
                warn!("Unit of work dropped while active; transaction rolled back");
            } else {
                warn!("Unit of work dropped while active and session busy; transaction left open");
            }
        }
    }
}
