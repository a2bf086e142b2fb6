//! The SQLite implementation of [`Store`].

use std::path::Path;

use rusqlite::TransactionBehavior;
use tecendo_core::{
  Result as CoreResult,
  store::{Store, UnitOfWork},
};

use crate::{Error, Result, schema::SCHEMA, unit::SqliteUnit};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tecendo Arte store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `work` inside one transaction on the connection thread.
  ///
  /// The transaction commits only if `work` returns `Ok`; dropping it on the
  /// error path rolls it back. A failed commit surfaces as a storage error.
  async fn transact<T, F>(&self, behavior: TransactionBehavior, work: F) -> CoreResult<T>
  where
    F: FnOnce(&mut SqliteUnit<'_>) -> CoreResult<T> + Send + 'static,
    T: Send + 'static,
  {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(behavior)?;
        let result = work(&mut SqliteUnit { conn: &tx });
        if result.is_ok() {
          tx.commit()?;
        }
        Ok(result)
      })
      .await
      .map_err(Error::from)?;
    outcome
  }
}

// ─── Store impl ──────────────────────────────────────────────────────────────

impl Store for SqliteStore {
  async fn read<T, F>(&self, work: F) -> CoreResult<T>
  where
    F: FnOnce(&dyn UnitOfWork) -> CoreResult<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .transact(TransactionBehavior::Deferred, move |unit| work(&*unit))
      .await
  }

  async fn write<T, F>(&self, work: F) -> CoreResult<T>
  where
    F: FnOnce(&mut dyn UnitOfWork) -> CoreResult<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .transact(TransactionBehavior::Immediate, move |unit| work(unit))
      .await
  }
}
