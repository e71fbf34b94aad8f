//! SQLite persistence.
//!
//! [`Database`] owns the connection pool; the store traits are what the rest
//! of the crate depends on.

pub mod database;
pub mod profiles;
pub mod transactions;

pub use database::{Database, PoolConfig, SharedDatabase};
pub use profiles::ProfileStore;
pub use transactions::TransactionStore;
