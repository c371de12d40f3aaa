//! Reactive user-list state holder
//!
//! [`UserListState`] bridges the repository's cold live query into hot
//! `watch` cells that any number of late subscribers can read. One internal
//! task owns the single upstream subscription for the lifetime of the
//! instance and republishes every snapshot; observers never trigger their
//! own queries.
//!
//! Mutation entry points delegate to the repository and toggle the busy cell
//! around the call. Failures are returned to the caller, recorded in the
//! last-error cell, and announced on the event bus; the snapshot cell is
//! only ever fed by the subscription, so a failed mutation leaves it
//! untouched.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::Result;
use crate::repo::UserRepository;
use crate::service::events::{Event, EventBus};
use crate::types::User;

pub struct UserListState {
    repo: UserRepository,
    event_bus: EventBus,
    users_tx: Arc<watch::Sender<Vec<User>>>,
    busy_tx: Arc<watch::Sender<bool>>,
    error_tx: Arc<watch::Sender<Option<String>>>,
    forwarder: JoinHandle<()>,
}

impl UserListState {
    /// Create a state holder and issue its one upstream subscription.
    ///
    /// The snapshot cell is seeded with the current query result before this
    /// returns, so a subscriber attached immediately afterwards sees the
    /// full current state, never an empty placeholder.
    pub async fn new(repo: UserRepository, event_bus: EventBus) -> Result<Self> {
        let mut subscription = repo.observe_all();
        let seed = subscription.recv().await?;

        let users_tx = Arc::new(watch::channel(seed).0);
        let busy_tx = Arc::new(watch::channel(false).0);
        let error_tx = Arc::new(watch::channel(None).0);

        let publisher = Arc::clone(&users_tx);
        let forwarder = tokio::spawn(async move {
            loop {
                match subscription.recv().await {
                    Ok(snapshot) => {
                        debug!(users = snapshot.len(), "publishing snapshot");
                        publisher.send_replace(snapshot);
                    }
                    Err(error) => {
                        warn!(%error, "live query ended");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            repo,
            event_bus,
            users_tx,
            busy_tx,
            error_tx,
            forwarder,
        })
    }

    /// Observe the user-list snapshot. The receiver holds the current value
    /// immediately; every committed write produces a fresh one.
    pub fn subscribe(&self) -> watch::Receiver<Vec<User>> {
        self.users_tx.subscribe()
    }

    /// Observe the advisory busy flag.
    pub fn busy(&self) -> watch::Receiver<bool> {
        self.busy_tx.subscribe()
    }

    /// Observe the last mutation error, if any.
    pub fn last_error(&self) -> watch::Receiver<Option<String>> {
        self.error_tx.subscribe()
    }

    /// Current snapshot without subscribing.
    pub fn snapshot(&self) -> Vec<User> {
        self.users_tx.borrow().clone()
    }

    /// Reset the last-error cell.
    pub fn clear_error(&self) {
        self.error_tx.send_replace(None);
    }

    /// Persist a new user. The id is assigned by the store; the updated
    /// snapshot arrives through the subscription.
    pub async fn add(&self, name: &str, email: &str, age: i64) -> Result<()> {
        let user = User::new(name, email, age);
        self.mutate("add", self.repo.insert(&user)).await
    }

    /// Replace the stored fields of an existing user.
    pub async fn update(&self, user: &User) -> Result<()> {
        self.mutate("update", self.repo.update(user)).await
    }

    /// Remove a user by identity.
    pub async fn delete(&self, user: &User) -> Result<()> {
        self.mutate("delete", self.repo.delete(user)).await
    }

    /// Remove every user.
    pub async fn clear(&self) -> Result<()> {
        self.mutate("clear", self.repo.delete_all()).await
    }

    async fn mutate<F>(&self, operation: &str, call: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        self.busy_tx.send_replace(true);
        let result = call.await;

        if let Err(error) = &result {
            let message = error.to_string();
            warn!(operation, error = %message, "mutation failed");
            self.error_tx.send_replace(Some(message.clone()));
            self.event_bus.emit(Event::MutationFailed {
                operation: operation.to_string(),
                error: message,
            });
        }

        // Unconditionally, also on failure
        self.busy_tx.send_replace(false);
        result
    }
}

impl Drop for UserListState {
    fn drop(&mut self) {
        // Owning scope is gone: cancel the subscription, no further emissions
        self.forwarder.abort();
    }
}
