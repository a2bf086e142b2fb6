//! Credential collaborators consumed by the identity manager.
//!
//! Hashing and token signing are opaque to the core; concrete
//! implementations live with the server binary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, account::AccountType};

/// One-way password hashing.
pub trait PasswordHasher: Send + Sync {
  fn hash(&self, plain: &str) -> Result<String>;

  /// `false` for a mismatch and for a hash that cannot be parsed.
  fn verify(&self, plain: &str, hash: &str) -> bool;
}

/// What a bearer token asserts about its holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  /// The account id.
  pub sub:   Uuid,
  pub role:  AccountType,
  pub email: String,
  #[serde(with = "chrono::serde::ts_seconds")]
  pub iat:   DateTime<Utc>,
  #[serde(with = "chrono::serde::ts_seconds")]
  pub exp:   DateTime<Utc>,
}

/// Issues and validates bearer credentials. Expiry policy belongs to the
/// implementation.
pub trait TokenIssuer: Send + Sync {
  fn issue(&self, subject_id: Uuid, role: AccountType, email: &str) -> Result<String>;

  /// `None` for a forged, malformed, or expired token.
  fn verify(&self, token: &str) -> Option<Claims>;
}

/// Successful outcome of
/// [`AccountIdentityManager::authenticate`](crate::identity::AccountIdentityManager::authenticate).
#[derive(Debug, Clone, Serialize)]
pub struct AuthResult {
  pub account_id:   Uuid,
  pub account_type: AccountType,
  pub token:        String,
}
