//! Transaction wrapper with after-commit callbacks.
//!
//! Work that must only happen once rows are durably visible (such as
//! enqueueing the embedding job for a new post) is registered with
//! [`UnitOfWork::on_commit`]. Callbacks run after a successful commit and are
//! dropped on rollback, on commit failure, or when the unit of work is dropped.

use anyhow::Result;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::debug;

type CommitCallback = Box<dyn FnOnce() + Send + 'static>;

/// Callbacks waiting for a commit.
#[derive(Default)]
pub struct CommitHooks {
    callbacks: Vec<CommitCallback>,
}

impl CommitHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Run every callback in registration order.
    pub fn run(self) {
        for callback in self.callbacks {
            callback();
        }
    }

    /// Drop every callback without running it. Returns how many were dropped.
    pub fn discard(self) -> usize {
        self.callbacks.len()
    }
}

/// A database transaction plus the callbacks to run once it commits.
pub struct UnitOfWork {
    tx: Transaction<'static, Postgres>,
    hooks: CommitHooks,
}

impl UnitOfWork {
    pub async fn begin(pool: &PgPool) -> Result<Self> {
        Ok(Self {
            tx: pool.begin().await?,
            hooks: CommitHooks::new(),
        })
    }

    /// Connection bound to the open transaction
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut *self.tx
    }

    /// Schedule `callback` to run after this unit of work commits.
    pub fn on_commit(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.hooks.push(callback);
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        debug!(callbacks = self.hooks.len(), "transaction committed");
        self.hooks.run();
        Ok(())
    }

    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        let discarded = self.hooks.discard();
        debug!(discarded, "transaction rolled back, commit callbacks dropped");
        Ok(())
    }
}
