//! Accounts, the identity root.
//!
//! An account holds credentials and a mutable [`AccountType`]. Everything
//! role-specific lives in the account's [`Profile`](crate::profile::Profile),
//! whose variant always follows the account type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, profile::ProfileKind};

/// Which role an account currently plays on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
  /// Backs projects; carries a donor profile.
  Donor,
  /// Publishes projects; carries a creator profile.
  Creator,
  /// Moderates reports; carries no profile.
  Admin,
}

impl AccountType {
  /// The profile variant an account of this type must own, if any.
  pub fn profile_kind(self) -> Option<ProfileKind> {
    match self {
      Self::Donor => Some(ProfileKind::Donor),
      Self::Creator => Some(ProfileKind::Creator),
      Self::Admin => None,
    }
  }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  pub account_id:    Uuid,
  /// The address as entered at registration (or last update).
  pub email:         String,
  /// PHC string produced by the configured password hasher.
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub display_name:  String,
  pub account_type:  AccountType,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Account {
  /// The uniqueness key for this account's email.
  pub fn email_key(&self) -> String { normalize_email(&self.email) }
}

/// Partial update of an account's own fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdate {
  pub display_name: Option<String>,
  pub email:        Option<String>,
  pub password:     Option<String>,
}

// ─── Email ───────────────────────────────────────────────────────────────────

/// Email uniqueness is case-insensitive; this is the comparison key.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

/// Reject addresses that cannot possibly be deliverable.
///
/// Full RFC 5322 validation is the facade's business; the core only refuses
/// input that would make the uniqueness key meaningless.
pub fn check_email(email: &str) -> Result<()> {
  let trimmed = email.trim();
  match trimmed.split_once('@') {
    Some((local, domain))
      if !local.is_empty() && !domain.is_empty() && !trimmed.contains(char::is_whitespace) =>
    {
      Ok(())
    }
    _ => Err(Error::InvalidInput(format!("malformed email address: {email:?}"))),
  }
}

/// Reject blank required text.
pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::InvalidInput(format!("{field} must not be blank")));
  }
  Ok(())
}
