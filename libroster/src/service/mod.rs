//! Service layer for Roster
//!
//! A single facade, [`RosterService`], owns the shared resources (database,
//! config, event bus) and hands out the working parts: the repository, live
//! user-list state holders, the preferences store, the sync worker, and the
//! remote profile client.
//!
//! # Example
//!
//! ```no_run
//! use libroster::service::RosterService;
//!
//! # async fn example() -> libroster::Result<()> {
//! let service = RosterService::new().await?;
//!
//! let state = service.user_list().await?;
//! state.add("Alice", "a@x.com", 30).await?;
//!
//! let users = state.snapshot();
//! println!("{} users", users.len());
//! # Ok(())
//! # }
//! ```

pub mod events;
pub mod state;
pub mod sync;

pub use events::{Event, EventBus, EventReceiver};
pub use state::UserListState;
pub use sync::{SyncOutcome, SyncWorker};

use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::prefs::Preferences;
use crate::remote::HttpProfileSource;
use crate::repo::UserRepository;
use crate::error::Result;

/// Main service facade coordinating all sub-services
pub struct RosterService {
    config: Arc<Config>,
    db: Database,
    repo: UserRepository,
    event_bus: EventBus,
}

impl RosterService {
    /// Create a service from the default configuration location.
    pub async fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config).await
    }

    /// Create a service from an explicit configuration.
    pub async fn from_config(config: Config) -> Result<Self> {
        let db = Database::open(&config.database).await?;
        Ok(Self::with_database(config, db))
    }

    /// Create a service over an already-open database. Used by tests and by
    /// tools that manage the connection themselves.
    pub fn with_database(config: Config, db: Database) -> Self {
        let repo = UserRepository::new(db.clone());
        Self {
            config: Arc::new(config),
            db,
            repo,
            event_bus: EventBus::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn repository(&self) -> &UserRepository {
        &self.repo
    }

    /// Create a live state holder over the user list. Each holder owns its
    /// own upstream subscription and is torn down when dropped.
    pub async fn user_list(&self) -> Result<UserListState> {
        UserListState::new(self.repo.clone(), self.event_bus.clone()).await
    }

    /// Preferences store backed by the same database.
    pub fn preferences(&self) -> Preferences {
        Preferences::new(self.db.clone())
    }

    /// One-shot sync worker configured from `[sync]`.
    pub fn sync_worker(&self) -> Result<SyncWorker> {
        let duration = self.config.sync.parsed_duration()?;
        Ok(SyncWorker::new(duration, self.event_bus.clone()))
    }

    /// Remote profile client configured from `[remote]`.
    pub fn remote(&self) -> Result<HttpProfileSource> {
        HttpProfileSource::new(&self.config.remote)
    }

    /// Subscribe to service events.
    pub fn subscribe(&self) -> EventReceiver {
        self.event_bus.subscribe()
    }
}
