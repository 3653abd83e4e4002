//! SQLite backend for the Strata way-history store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The commit path wraps the parent row
//! and all child rows in a single transaction.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteHistoryStore;

#[cfg(test)]
mod tests;
