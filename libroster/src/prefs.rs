//! Preferences store
//!
//! Small string key/value settings kept in the same database as the user
//! table. Typed accessors cover the two well-known keys; anything else goes
//! through `get`/`set`.

use crate::db::Database;
use crate::error::Result;

pub const KEY_USER_NAME: &str = "user.name";
pub const KEY_USER_EMAIL: &str = "user.email";

#[derive(Clone)]
pub struct Preferences {
    db: Database,
}

impl Preferences {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.db.get_preference(key).await
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db.set_preference(key, value).await
    }

    pub async fn user_name(&self) -> Result<Option<String>> {
        self.get(KEY_USER_NAME).await
    }

    pub async fn set_user_name(&self, name: &str) -> Result<()> {
        self.set(KEY_USER_NAME, name).await
    }

    pub async fn user_email(&self) -> Result<Option<String>> {
        self.get(KEY_USER_EMAIL).await
    }

    pub async fn set_user_email(&self, email: &str) -> Result<()> {
        self.set(KEY_USER_EMAIL, email).await
    }

    /// Remove every stored preference.
    pub async fn clear_all(&self) -> Result<()> {
        self.db.clear_preferences().await
    }
}
