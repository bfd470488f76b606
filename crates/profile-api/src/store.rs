//! User persistence
//!
//! The handlers only depend on the [`UserStore`] trait. Production uses the
//! MySQL-backed store; the in-memory store backs tests and local development
//! where no database is available.

use crate::config::DatabaseConfig;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::sync::atomic::{AtomicI64, Ordering};
use thiserror::Error;

/// Account disabled
pub const USER_STATUS_DISABLED: i8 = 0;
/// Account active
pub const USER_STATUS_ACTIVE: i8 = 1;

/// Store failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Insert would violate the one-row-per-email invariant
    #[error("duplicate row for email {0}")]
    Duplicate(String),

    /// For store implementations that do not sit on sqlx
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

/// Persisted user row.
///
/// The `id` column is internal and never serialized into responses.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    #[serde(skip_serializing, default)]
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub avatar: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub status: i8,
}

/// Row created lazily on first authenticated access
#[derive(Debug, Clone)]
pub struct NewUser {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub avatar: String,
    pub status: i8,
}

/// Fields accepted by the profile update endpoint
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub firstname: String,
    pub lastname: String,
    pub description: String,
    pub phone: String,
    pub avatar: String,
}

/// User table access
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Rows matching the given email, in store order
    async fn find_by_email(&self, email: &str) -> Result<Vec<User>, StoreError>;

    /// Insert a new user row
    async fn insert(&self, user: &NewUser) -> Result<(), StoreError>;

    /// Overwrite the profile fields of the row matching the email
    async fn update_profile(&self, email: &str, profile: &ProfileUpdate)
        -> Result<(), StoreError>;
}

/// MySQL-backed store
pub struct MySqlUserStore {
    pool: MySqlPool,
}

impl MySqlUserStore {
    /// Connect a pooled client
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(10)
            .connect(&config.url())
            .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl UserStore for MySqlUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert(&self, user: &NewUser) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (firstname, lastname, email, avatar, status) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(&user.email)
        .bind(&user.avatar)
        .bind(user.status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_profile(
        &self,
        email: &str,
        profile: &ProfileUpdate,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET firstname = ?, lastname = ?, description = ?, \
             phone = ?, avatar = ? WHERE email LIKE ?",
        )
        .bind(&profile.firstname)
        .bind(&profile.lastname)
        .bind(&profile.description)
        .bind(&profile.phone)
        .bind(&profile.avatar)
        .bind(email)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// In-memory store keyed by email.
///
/// The email key enforces the one-row-per-email invariant the MySQL schema
/// expresses with a unique index.
pub struct MemoryUserStore {
    users: DashMap<String, User>,
    next_id: AtomicI64,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Vec<User>, StoreError> {
        Ok(self
            .users
            .get(email)
            .map(|entry| vec![entry.value().clone()])
            .unwrap_or_default())
    }

    async fn insert(&self, user: &NewUser) -> Result<(), StoreError> {
        // Duplicate emails fail here the way the unique key makes them fail
        // in MySQL.
        match self.users.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(user.email.clone())),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                slot.insert(User {
                    id,
                    firstname: user.firstname.clone(),
                    lastname: user.lastname.clone(),
                    email: user.email.clone(),
                    avatar: user.avatar.clone(),
                    description: None,
                    phone: None,
                    status: user.status,
                });
                Ok(())
            }
        }
    }

    async fn update_profile(
        &self,
        email: &str,
        profile: &ProfileUpdate,
    ) -> Result<(), StoreError> {
        if let Some(mut entry) = self.users.get_mut(email) {
            let user = entry.value_mut();
            user.firstname = profile.firstname.clone();
            user.lastname = profile.lastname.clone();
            user.description = Some(profile.description.clone());
            user.phone = Some(profile.phone.clone());
            user.avatar = profile.avatar.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            firstname: "Ada".to_string(),
            lastname: "Lovelace".to_string(),
            email: email.to_string(),
            avatar: "3.jpg".to_string(),
            status: USER_STATUS_ACTIVE,
        }
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryUserStore::new();
        assert!(store.find_by_email("ada@example.com").await.unwrap().is_empty());

        store.insert(&new_user("ada@example.com")).await.unwrap();
        let rows = store.find_by_email("ada@example.com").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].firstname, "Ada");
        assert_eq!(rows[0].status, USER_STATUS_ACTIVE);
    }

    #[tokio::test]
    async fn test_memory_store_duplicate_email_insert_fails() {
        let store = MemoryUserStore::new();
        store.insert(&new_user("ada@example.com")).await.unwrap();

        let mut duplicate = new_user("ada@example.com");
        duplicate.firstname = "Imposter".to_string();
        let result = store.insert(&duplicate).await;
        assert!(matches!(result, Err(StoreError::Duplicate(_))));

        // The original row is untouched.
        let rows = store.find_by_email("ada@example.com").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].firstname, "Ada");
    }

    #[tokio::test]
    async fn test_memory_store_update_profile() {
        let store = MemoryUserStore::new();
        store.insert(&new_user("ada@example.com")).await.unwrap();

        let update = ProfileUpdate {
            firstname: "Augusta".to_string(),
            lastname: "King".to_string(),
            description: "mathematician".to_string(),
            phone: "555-0100".to_string(),
            avatar: "7.jpg".to_string(),
        };
        store.update_profile("ada@example.com", &update).await.unwrap();

        let rows = store.find_by_email("ada@example.com").await.unwrap();
        assert_eq!(rows[0].firstname, "Augusta");
        assert_eq!(rows[0].description.as_deref(), Some("mathematician"));
        assert_eq!(rows[0].avatar, "7.jpg");
    }

    #[test]
    fn test_user_serialization_strips_id() {
        let user = User {
            id: 42,
            firstname: "Ada".to_string(),
            lastname: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            avatar: "1.jpg".to_string(),
            description: None,
            phone: None,
            status: USER_STATUS_ACTIVE,
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["email"], "ada@example.com");
    }
}
