//! Transaction persistence.
//!
//! Every query is scoped by `user_id`: a transaction owned by someone else
//! behaves exactly like one that does not exist.

use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row, params};

use super::database::{Database, decode_timestamp, encode_timestamp};
use crate::types::{FinError, Result, ResultExt, Transaction, TransactionDraft, UserId};

const ENTITY: &str = "Transaction";

const SELECT_COLUMNS: &str = "SELECT id, user_id, amount, category, description, date FROM transactions";

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create(&self, user: &UserId, draft: TransactionDraft) -> Result<Transaction>;

    /// Replace every field of an owned transaction
    async fn update(&self, user: &UserId, id: i64, draft: TransactionDraft) -> Result<Transaction>;

    async fn delete(&self, user: &UserId, id: i64) -> Result<()>;

    async fn get(&self, user: &UserId, id: i64) -> Result<Transaction>;

    /// Page through a user's transactions, newest first
    async fn list(&self, user: &UserId, skip: u32, limit: u32) -> Result<Vec<Transaction>>;

    /// Most recent transactions by date, newest first
    async fn list_recent(&self, user: &UserId, limit: usize) -> Result<Vec<Transaction>>;
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: row.get(2)?,
        category: row.get(3)?,
        description: row.get(4)?,
        date: decode_timestamp(5, row.get(5)?)?,
    })
}

impl Database {
    pub fn insert_transaction(&self, user: &UserId, draft: &TransactionDraft) -> Result<Transaction> {
        self.transaction(|conn| {
            conn.execute(
                "INSERT INTO transactions (user_id, amount, category, description, date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user.as_str(),
                    draft.amount,
                    draft.category,
                    draft.description,
                    encode_timestamp(&draft.date)
                ],
            )
            .with_context("Failed to insert transaction")?;

            Ok(Transaction {
                id: conn.last_insert_rowid(),
                user_id: user.as_str().to_string(),
                amount: draft.amount,
                category: draft.category.clone(),
                description: draft.description.clone(),
                date: draft.date,
            })
        })
    }

    pub fn update_transaction(
        &self,
        user: &UserId,
        id: i64,
        draft: &TransactionDraft,
    ) -> Result<Transaction> {
        let changed = self
            .connection()?
            .execute(
                "UPDATE transactions
                 SET amount = ?1, category = ?2, description = ?3, date = ?4
                 WHERE id = ?5 AND user_id = ?6",
                params![
                    draft.amount,
                    draft.category,
                    draft.description,
                    encode_timestamp(&draft.date),
                    id,
                    user.as_str()
                ],
            )
            .with_context("Failed to update transaction")?;

        if changed == 0 {
            return Err(FinError::not_found(ENTITY, id));
        }

        Ok(Transaction {
            id,
            user_id: user.as_str().to_string(),
            amount: draft.amount,
            category: draft.category.clone(),
            description: draft.description.clone(),
            date: draft.date,
        })
    }

    pub fn delete_transaction(&self, user: &UserId, id: i64) -> Result<()> {
        let removed = self
            .connection()?
            .execute(
                "DELETE FROM transactions WHERE id = ?1 AND user_id = ?2",
                params![id, user.as_str()],
            )
            .with_context("Failed to delete transaction")?;

        if removed == 0 {
            return Err(FinError::not_found(ENTITY, id));
        }
        Ok(())
    }

    pub fn get_transaction(&self, user: &UserId, id: i64) -> Result<Transaction> {
        self.connection()?
            .query_row(
                &format!("{} WHERE id = ?1 AND user_id = ?2", SELECT_COLUMNS),
                params![id, user.as_str()],
                map_row,
            )
            .optional()
            .with_context("Failed to load transaction")?
            .ok_or_else(|| FinError::not_found(ENTITY, id))
    }

    pub fn list_transactions(&self, user: &UserId, skip: u32, limit: u32) -> Result<Vec<Transaction>> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare(&format!(
                "{} WHERE user_id = ?1 ORDER BY date DESC, id DESC LIMIT ?2 OFFSET ?3",
                SELECT_COLUMNS
            ))
            .with_context("Failed to prepare transaction listing")?;

        let rows = stmt
            .query_map(params![user.as_str(), limit, skip], map_row)
            .with_context("Failed to list transactions")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .with_context("Failed to read transaction row")
    }

    pub fn recent_transactions(&self, user: &UserId, limit: usize) -> Result<Vec<Transaction>> {
        let limit = u32::try_from(limit).unwrap_or(u32::MAX);
        self.list_transactions(user, 0, limit)
    }
}

#[async_trait]
impl TransactionStore for Database {
    async fn create(&self, user: &UserId, draft: TransactionDraft) -> Result<Transaction> {
        let user = user.clone();
        self.run_blocking(move |db| db.insert_transaction(&user, &draft))
            .await
    }

    async fn update(&self, user: &UserId, id: i64, draft: TransactionDraft) -> Result<Transaction> {
        let user = user.clone();
        self.run_blocking(move |db| db.update_transaction(&user, id, &draft))
            .await
    }

    async fn delete(&self, user: &UserId, id: i64) -> Result<()> {
        let user = user.clone();
        self.run_blocking(move |db| db.delete_transaction(&user, id))
            .await
    }

    async fn get(&self, user: &UserId, id: i64) -> Result<Transaction> {
        let user = user.clone();
        self.run_blocking(move |db| db.get_transaction(&user, id))
            .await
    }

    async fn list(&self, user: &UserId, skip: u32, limit: u32) -> Result<Vec<Transaction>> {
        let user = user.clone();
        self.run_blocking(move |db| db.list_transactions(&user, skip, limit))
            .await
    }

    async fn list_recent(&self, user: &UserId, limit: usize) -> Result<Vec<Transaction>> {
        let user = user.clone();
        self.run_blocking(move |db| db.recent_transactions(&user, limit))
            .await
    }
}
