//! Per-user profile persistence.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, params};

use super::database::{Database, encode_timestamp};
use crate::types::{Result, ResultExt, UserId, UserProfile};

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Existing profile, or a new one holding `default_balance`
    async fn get_or_create(&self, user: &UserId, default_balance: f64) -> Result<UserProfile>;

    /// Set the initial balance, creating the profile if needed
    async fn upsert(&self, user: &UserId, initial_balance: f64) -> Result<UserProfile>;
}

fn load_profile(conn: &Connection, user: &UserId) -> Result<UserProfile> {
    conn.query_row(
        "SELECT id, user_id, initial_balance FROM user_profiles WHERE user_id = ?1",
        params![user.as_str()],
        |row| {
            Ok(UserProfile {
                id: row.get(0)?,
                user_id: row.get(1)?,
                initial_balance: row.get(2)?,
            })
        },
    )
    .with_context("Failed to load profile")
}

impl Database {
    pub fn get_or_create_profile(&self, user: &UserId, default_balance: f64) -> Result<UserProfile> {
        let now = encode_timestamp(&Utc::now());
        self.transaction(|conn| {
            let inserted = conn
                .execute(
                    "INSERT INTO user_profiles (user_id, initial_balance, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?3)
                     ON CONFLICT(user_id) DO NOTHING",
                    params![user.as_str(), default_balance, now],
                )
                .with_context("Failed to create profile")?;
            if inserted > 0 {
                tracing::info!(user = %user, initial_balance = default_balance, "Created profile");
            }
            load_profile(conn, user)
        })
    }

    pub fn upsert_profile(&self, user: &UserId, initial_balance: f64) -> Result<UserProfile> {
        let now = encode_timestamp(&Utc::now());
        self.transaction(|conn| {
            conn.execute(
                "INSERT INTO user_profiles (user_id, initial_balance, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                     initial_balance = excluded.initial_balance,
                     updated_at = excluded.updated_at",
                params![user.as_str(), initial_balance, now],
            )
            .with_context("Failed to save profile")?;
            load_profile(conn, user)
        })
    }
}

#[async_trait]
impl ProfileStore for Database {
    async fn get_or_create(&self, user: &UserId, default_balance: f64) -> Result<UserProfile> {
        let user = user.clone();
        self.run_blocking(move |db| db.get_or_create_profile(&user, default_balance))
            .await
    }

    async fn upsert(&self, user: &UserId, initial_balance: f64) -> Result<UserProfile> {
        let user = user.clone();
        self.run_blocking(move |db| db.upsert_profile(&user, initial_balance))
            .await
    }
}
