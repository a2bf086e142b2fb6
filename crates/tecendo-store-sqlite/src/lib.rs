//! SQLite backend for the Tecendo Arte store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. That thread also serialises every
//! unit of work, which together with `BEGIN IMMEDIATE` write transactions
//! gives the isolation the identity manager and moderation engine rely on.

mod encode;
mod schema;
mod store;
mod unit;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
