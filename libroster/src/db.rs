//! Database operations for Roster
//!
//! All SQL lives here. The store owns a change feed (a `watch` generation
//! counter) that is bumped after every committed write to the `users` table;
//! live queries subscribe to it and re-read on each bump.

use sqlx::sqlite::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;
use crate::error::{DbError, Result, RosterError};
use crate::types::User;

/// Version stamped into `PRAGMA user_version`. Bump on any schema change.
pub const SCHEMA_VERSION: i64 = 1;

const CREATE_USERS: &str = "\
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    age INTEGER NOT NULL
)";

const CREATE_PREFERENCES: &str = "\
CREATE TABLE IF NOT EXISTS preferences (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    changes: Arc<watch::Sender<u64>>,
}

impl Database {
    /// Open (or create) the database at the configured path.
    ///
    /// On a schema version mismatch the behavior depends on
    /// `destructive_migration`: when set, all tables are dropped and
    /// recreated (logged, intentional data loss); when unset the mismatch is
    /// returned as an error.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let expanded_path = shellexpand::tilde(&config.path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
        }

        // Forward slashes keep the SQLite URL valid on Windows too; mode=rwc
        // creates the file when it does not exist.
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(DbError::SqlxError)?;

        init_schema(&pool, config.destructive_migration).await?;

        Ok(Self::from_pool(pool))
    }

    /// In-memory database, schema applied. Used by tests and throwaway runs.
    ///
    /// Pinned to one connection that is never reaped: every pooled
    /// `sqlite::memory:` connection would otherwise see its own empty
    /// database.
    pub async fn in_memory() -> Result<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(DbError::SqlxError)?;
        apply_schema(&pool).await?;
        Ok(Self::from_pool(pool))
    }

    fn from_pool(pool: SqlitePool) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            pool,
            changes: Arc::new(changes),
        }
    }

    /// Subscribe to the change feed. The receiver's value is a generation
    /// counter; any observed change means the `users` table was written.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    fn notify_changed(&self) {
        self.changes.send_modify(|generation| *generation += 1);
    }

    /// All users, ordered by id.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, name, email, age FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(users)
    }

    /// Point lookup; a miss is `None`, not an error.
    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, age FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(user)
    }

    /// Insert a user. With `id: None` the store assigns the next id; with an
    /// explicit id an existing row is replaced rather than rejected.
    ///
    /// Returns the id of the stored row.
    pub async fn insert_user(&self, user: &User) -> Result<i64> {
        let result = sqlx::query(
            "INSERT OR REPLACE INTO users (id, name, email, age) VALUES (?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.age)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        let id = user.id.unwrap_or_else(|| result.last_insert_rowid());
        debug!(id, "inserted user");
        self.notify_changed();
        Ok(id)
    }

    /// Replace the non-identity fields of the row matching `user.id`.
    /// A non-matching id is a silent no-op, indistinguishable from success.
    pub async fn update_user(&self, user: &User) -> Result<()> {
        let id = require_id(user)?;

        let result = sqlx::query("UPDATE users SET name = ?, email = ?, age = ? WHERE id = ?")
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.age)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        if result.rows_affected() > 0 {
            self.notify_changed();
        }
        Ok(())
    }

    /// Delete the row matching `user.id`; no-op if absent.
    pub async fn delete_user(&self, user: &User) -> Result<()> {
        let id = require_id(user)?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        if result.rows_affected() > 0 {
            debug!(id, "deleted user");
            self.notify_changed();
        }
        Ok(())
    }

    /// Delete every user. Idempotent; the second call touches nothing.
    pub async fn delete_all_users(&self) -> Result<()> {
        let result = sqlx::query("DELETE FROM users")
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        if result.rows_affected() > 0 {
            debug!(removed = result.rows_affected(), "cleared users");
            self.notify_changed();
        }
        Ok(())
    }

    /// Read a preference value by key.
    pub async fn get_preference(&self, key: &str) -> Result<Option<String>> {
        let value: Option<(String,)> =
            sqlx::query_as("SELECT value FROM preferences WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(DbError::SqlxError)?;

        Ok(value.map(|(v,)| v))
    }

    /// Upsert a preference value.
    pub async fn set_preference(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO preferences (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Remove every stored preference.
    pub async fn clear_preferences(&self) -> Result<()> {
        sqlx::query("DELETE FROM preferences")
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Close the underlying pool. Subsequent operations fail; used by tests
    /// to provoke store-layer errors.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn require_id(user: &User) -> Result<i64> {
    user.id.ok_or_else(|| {
        RosterError::InvalidInput("user has no id; it was never persisted".to_string())
    })
}

async fn init_schema(pool: &SqlitePool, destructive_migration: bool) -> Result<()> {
    let found: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .map_err(DbError::SqlxError)?;

    if found == SCHEMA_VERSION {
        return Ok(());
    }

    // A brand-new file reports version 0 and has no tables yet.
    if found == 0 && !has_table(pool, "users").await? {
        apply_schema(pool).await?;
        return Ok(());
    }

    if !destructive_migration {
        return Err(DbError::SchemaVersionMismatch {
            found,
            expected: SCHEMA_VERSION,
        }
        .into());
    }

    warn!(
        found,
        expected = SCHEMA_VERSION,
        "schema version mismatch: dropping and recreating all tables, existing data is discarded"
    );

    sqlx::query("DROP TABLE IF EXISTS users")
        .execute(pool)
        .await
        .map_err(DbError::SqlxError)?;
    sqlx::query("DROP TABLE IF EXISTS preferences")
        .execute(pool)
        .await
        .map_err(DbError::SqlxError)?;

    apply_schema(pool).await
}

async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(CREATE_USERS)
        .execute(pool)
        .await
        .map_err(DbError::SqlxError)?;
    sqlx::query(CREATE_PREFERENCES)
        .execute(pool)
        .await
        .map_err(DbError::SqlxError)?;

    // PRAGMA does not support bind parameters
    sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
        .execute(pool)
        .await
        .map_err(DbError::SqlxError)?;

    Ok(())
}

async fn has_table(pool: &SqlitePool, name: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .map_err(DbError::SqlxError)?;

    Ok(count > 0)
}
