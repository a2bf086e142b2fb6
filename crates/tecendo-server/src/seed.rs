//! Startup seeding of the initial admin account.

use argon2::PasswordHash;
use tecendo_core::{
  Error, Result, account::AccountType, identity::AccountIdentityManager, store::Store,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::SeedAdmin;

/// Create the configured admin account unless its email is already taken.
///
/// Returns the new account id, or `None` when nothing was created. A seed
/// whose password hash is missing or is not a PHC string is skipped with a
/// warning.
pub async fn seed_admin<S: Store>(
  identity: &AccountIdentityManager<S>,
  seed: &SeedAdmin,
) -> Result<Option<Uuid>> {
  let Some(hash) = seed
    .password_hash
    .as_deref()
    .map(str::trim)
    .filter(|h| !h.is_empty())
  else {
    warn!(email = %seed.email, "seed_admin has no password_hash; no admin account created");
    return Ok(None);
  };
  if let Err(e) = PasswordHash::new(hash) {
    warn!(
      email = %seed.email,
      error = %e,
      "seed_admin password_hash is not a PHC string; no admin account created"
    );
    return Ok(None);
  }

  match identity
    .register_prehashed(&seed.email, &seed.name, hash.to_owned(), AccountType::Admin)
    .await
  {
    Ok(id) => {
      info!(account_id = %id, email = %seed.email, "seeded admin account");
      Ok(Some(id))
    }
    Err(Error::DuplicateEmail(_)) => {
      info!(email = %seed.email, "admin seed skipped, email already registered");
      Ok(None)
    }
    Err(e) => Err(e),
  }
}
