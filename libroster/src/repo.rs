//! User repository
//!
//! Thin pass-through over [`Database`]: mutations delegate one-to-one, and
//! `observe_all` packages the store's change feed as a live query that
//! yields the current snapshot immediately and a fresh one after every
//! committed write.

use tokio::sync::watch;

use crate::db::Database;
use crate::error::{DbError, Result};
use crate::types::User;

#[derive(Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open a live query over all users.
    ///
    /// The first [`UserSubscription::recv`] resolves immediately with the
    /// current snapshot; each later call waits for the next write. The
    /// subscription only ends when it is dropped.
    pub fn observe_all(&self) -> UserSubscription {
        UserSubscription {
            db: self.db.clone(),
            changes: self.db.subscribe_changes(),
            primed: false,
        }
    }

    pub async fn get(&self, id: i64) -> Result<Option<User>> {
        self.db.get_user(id).await
    }

    pub async fn insert(&self, user: &User) -> Result<()> {
        self.db.insert_user(user).await.map(|_| ())
    }

    pub async fn update(&self, user: &User) -> Result<()> {
        self.db.update_user(user).await
    }

    pub async fn delete(&self, user: &User) -> Result<()> {
        self.db.delete_user(user).await
    }

    pub async fn delete_all(&self) -> Result<()> {
        self.db.delete_all_users().await
    }
}

/// Live query handle returned by [`UserRepository::observe_all`].
pub struct UserSubscription {
    db: Database,
    changes: watch::Receiver<u64>,
    primed: bool,
}

impl UserSubscription {
    /// Wait for the next snapshot.
    ///
    /// Bursts of writes may be coalesced into a single snapshot; the
    /// snapshot always reflects the latest committed state.
    pub async fn recv(&mut self) -> Result<Vec<User>> {
        if self.primed {
            self.changes
                .changed()
                .await
                .map_err(|_| DbError::ChangeFeedClosed)?;
        } else {
            // Writes that landed before the first read are already part of
            // the first snapshot; clear the marker so they are not replayed.
            self.changes.borrow_and_update();
            self.primed = true;
        }

        self.db.list_users().await
    }
}
