//! Error types for `tecendo-core`.
//!
//! Every domain failure has its own variant. Anything the storage backend
//! reports that is not one of those is carried opaquely in
//! [`Error::Storage`].

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("an account with email {0:?} already exists")]
  DuplicateEmail(String),

  #[error("account not found: {0}")]
  AccountNotFound(Uuid),

  #[error("no account registered for {0:?}")]
  EmailNotFound(String),

  #[error("report not found: {0}")]
  ReportNotFound(Uuid),

  #[error("invalid credentials")]
  InvalidCredentials,

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("invalid transition: {0}")]
  InvalidTransition(String),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend failure.
  pub fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Storage(Box::new(e))
  }

  /// `true` for every lookup that came back empty.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::AccountNotFound(_) | Self::EmailNotFound(_) | Self::ReportNotFound(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
