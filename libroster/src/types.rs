//! Core types for Roster

use serde::{Deserialize, Serialize};

/// A user record in the local directory.
///
/// `id` is assigned by the store on first insert and is immutable afterwards.
/// A record that has not been persisted yet carries `id: None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub age: i64,
}

impl User {
    /// Create a not-yet-persisted user. The store assigns the id on insert.
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: i64) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            age,
        }
    }

    /// Same record pinned to an explicit identity. Inserting it replaces any
    /// existing row with that id.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "#{} {} <{}> ({})", id, self.name, self.email, self.age),
            None => write!(f, "#- {} <{}> ({})", self.name, self.email, self.age),
        }
    }
}
