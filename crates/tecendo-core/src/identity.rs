//! Account lifecycle and role transitions, owned by [`AccountIdentityManager`].
//!
//! The manager is the only writer of account and profile rows. Every public
//! operation is one unit of work on the [`Store`], so a reader sees an
//! account either with its old profile or with its new one, never with both
//! or neither.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  account::{Account, AccountType, AccountUpdate, check_email, normalize_email, require_text},
  auth::{AuthResult, PasswordHasher, TokenIssuer},
  profile::{Category, CreatorProfile, NewProject, Profile, ProfileKind, ProfileUpdate, ProjectRef},
  report::touched_at,
  store::{Store, UnitOfWork},
};

/// Plaintext verified against when a login names an unknown email, so that
/// path costs the same as a wrong password.
const DECOY_PASSWORD: &str = "tecendo-decoy-password";

/// Raised when a unit of work would commit an account whose profile rows do
/// not match its type. Surfaces as [`Error::Storage`] and rolls the unit back.
#[derive(Debug, Error)]
#[error(
  "account {account_id} ({account_type:?}) would have {rows} profile row(s) of kind {found:?}"
)]
pub struct ProfileMismatch {
  pub account_id:   Uuid,
  pub account_type: AccountType,
  pub rows:         usize,
  pub found:        Option<ProfileKind>,
}

/// `true` if `profile` is exactly what an account of `account_type` must own.
pub fn profile_matches_type(account_type: AccountType, profile: Option<&Profile>) -> bool {
  account_type.profile_kind() == profile.map(Profile::kind)
}

/// A creator account together with its profile.
#[derive(Debug, Clone)]
pub struct Artist {
  pub account: Account,
  pub profile: CreatorProfile,
}

/// Narrows [`AccountIdentityManager::list_artists`]. Empty matches everyone.
#[derive(Debug, Clone, Default)]
pub struct ArtistFilter {
  /// Case-insensitive substring of the display name.
  pub name:     Option<String>,
  pub category: Option<Category>,
}

impl ArtistFilter {
  fn matches(&self, artist: &Artist) -> bool {
    let name_ok = self.name.as_deref().map(str::trim).is_none_or(|needle| {
      artist
        .account
        .display_name
        .to_lowercase()
        .contains(&needle.to_lowercase())
    });
    let category_ok = self
      .category
      .is_none_or(|c| artist.profile.categories.contains(&c));
    name_ok && category_ok
  }
}

pub struct AccountIdentityManager<S> {
  store:      Arc<S>,
  hasher:     Arc<dyn PasswordHasher>,
  tokens:     Arc<dyn TokenIssuer>,
  decoy_hash: String,
}

impl<S: Store> AccountIdentityManager<S> {
  pub fn new(
    store: Arc<S>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
  ) -> Result<Self> {
    let decoy_hash = hasher.hash(DECOY_PASSWORD)?;
    Ok(Self { store, hasher, tokens, decoy_hash })
  }

  // ── Registration ──────────────────────────────────────────────────────────

  /// Create an account and its matching, empty profile.
  pub async fn register(
    &self,
    email: &str,
    display_name: &str,
    plain_password: &str,
    account_type: AccountType,
  ) -> Result<Uuid> {
    require_text("password", plain_password)?;
    let password_hash = self.hasher.hash(plain_password)?;
    self
      .register_prehashed(email, display_name, password_hash, account_type)
      .await
  }

  /// [`register`](Self::register) with a password that is already hashed.
  pub async fn register_prehashed(
    &self,
    email: &str,
    display_name: &str,
    password_hash: String,
    account_type: AccountType,
  ) -> Result<Uuid> {
    check_email(email)?;
    require_text("display name", display_name)?;
    require_text("password hash", &password_hash)?;

    let now = Utc::now();
    let account = Account {
      account_id: Uuid::new_v4(),
      email: email.trim().to_owned(),
      password_hash,
      display_name: display_name.trim().to_owned(),
      account_type,
      created_at: now,
      updated_at: now,
    };
    let account_id = account.account_id;

    self
      .store
      .write(move |uow| {
        if uow.find_account_by_email(&account.email)?.is_some() {
          return Err(Error::DuplicateEmail(account.email));
        }
        uow.insert_account(&account)?;
        if let Some(kind) = account.account_type.profile_kind() {
          uow.insert_profile(&Profile::fresh(kind, account.account_id))?;
        }
        check_profile_invariant(uow, &account)
      })
      .await?;

    info!(%account_id, ?account_type, "registered account");
    Ok(account_id)
  }

  // ── Authentication ────────────────────────────────────────────────────────

  /// Check a password and issue a bearer token for the account.
  pub async fn authenticate(&self, email: &str, plain_password: &str) -> Result<AuthResult> {
    let lookup = email.to_owned();
    let account = self
      .store
      .read(move |uow| uow.find_account_by_email(&lookup))
      .await?;

    let Some(account) = account else {
      // Burn the same hashing work as a real mismatch.
      let _ = self.hasher.verify(plain_password, &self.decoy_hash);
      warn!("login attempt for unregistered email");
      return Err(Error::EmailNotFound(email.to_owned()));
    };

    if !self.hasher.verify(plain_password, &account.password_hash) {
      warn!(account_id = %account.account_id, "login attempt with wrong password");
      return Err(Error::InvalidCredentials);
    }

    let token = self
      .tokens
      .issue(account.account_id, account.account_type, &account.email)?;

    info!(account_id = %account.account_id, "authenticated");
    Ok(AuthResult {
      account_id: account.account_id,
      account_type: account.account_type,
      token,
    })
  }

  // ── Role transitions ──────────────────────────────────────────────────────

  /// Move an account to `new_type`, swapping its profile in the same unit of
  /// work. A no-op if the account already has that type.
  pub async fn change_account_type(&self, account_id: Uuid, new_type: AccountType) -> Result<()> {
    let previous = self
      .store
      .write(move |uow| {
        let mut account = uow
          .find_account(account_id)?
          .ok_or(Error::AccountNotFound(account_id))?;
        if account.account_type == new_type {
          return Ok(None);
        }
        let previous = account.account_type;

        if let Some(old) = uow.find_profile(account_id)? {
          retire_profile(uow, &old)?;
        }

        account.account_type = new_type;
        account.updated_at = touched_at(account.updated_at);

        if let Some(kind) = new_type.profile_kind() {
          uow.insert_profile(&Profile::fresh(kind, account_id))?;
        }
        uow.update_account(&account)?;

        check_profile_invariant(uow, &account)?;
        Ok(Some(previous))
      })
      .await?;

    match previous {
      Some(from) => info!(%account_id, ?from, to = ?new_type, "changed account type"),
      None => debug!(%account_id, ?new_type, "account type unchanged"),
    }
    Ok(())
  }

  // ── Deletion ──────────────────────────────────────────────────────────────

  /// Delete an account: project references, then the profile, then the
  /// account row. Reports filed by the account are kept for audit and are
  /// not touched.
  pub async fn delete_account(&self, account_id: Uuid) -> Result<()> {
    self
      .store
      .write(move |uow| {
        uow
          .find_account(account_id)?
          .ok_or(Error::AccountNotFound(account_id))?;

        if let Some(profile) = uow.find_profile(account_id)? {
          retire_profile(uow, &profile)?;
        }
        if !uow.delete_account(account_id)? {
          return Err(Error::AccountNotFound(account_id));
        }
        Ok(())
      })
      .await?;

    info!(%account_id, "deleted account");
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub async fn get_account(&self, account_id: Uuid) -> Result<Account> {
    self
      .store
      .read(move |uow| {
        uow
          .find_account(account_id)?
          .ok_or(Error::AccountNotFound(account_id))
      })
      .await
  }

  /// The account's profile; `None` for admin accounts.
  pub async fn get_profile(&self, account_id: Uuid) -> Result<Option<Profile>> {
    self
      .store
      .read(move |uow| {
        uow
          .find_account(account_id)?
          .ok_or(Error::AccountNotFound(account_id))?;
        uow.find_profile(account_id)
      })
      .await
  }

  pub async fn list_accounts(&self, account_type: Option<AccountType>) -> Result<Vec<Account>> {
    self
      .store
      .read(move |uow| uow.list_accounts(account_type))
      .await
  }

  /// Creator accounts with their profiles, oldest account first.
  pub async fn list_artists(&self, filter: ArtistFilter) -> Result<Vec<Artist>> {
    self
      .store
      .read(move |uow| {
        let mut artists = Vec::new();
        for account in uow.list_accounts(Some(AccountType::Creator))? {
          let profile = match uow.find_profile(account.account_id)? {
            Some(Profile::Creator(p)) => p,
            _ => return Err(no_profile(&account)),
          };
          let artist = Artist { account, profile };
          if filter.matches(&artist) {
            artists.push(artist);
          }
        }
        Ok(artists)
      })
      .await
  }

  // ── In-place updates ──────────────────────────────────────────────────────

  /// Change an account's name, email, or password. The account type is not
  /// touched here; see [`change_account_type`](Self::change_account_type).
  pub async fn update_account(&self, account_id: Uuid, update: AccountUpdate) -> Result<Account> {
    if let Some(name) = &update.display_name {
      require_text("display name", name)?;
    }
    if let Some(email) = &update.email {
      check_email(email)?;
    }
    let password_hash = match &update.password {
      Some(plain) => {
        require_text("password", plain)?;
        Some(self.hasher.hash(plain)?)
      }
      None => None,
    };

    let account = self
      .store
      .write(move |uow| {
        let mut account = uow
          .find_account(account_id)?
          .ok_or(Error::AccountNotFound(account_id))?;

        if let Some(email) = update.email {
          if normalize_email(&email) != account.email_key()
            && uow.find_account_by_email(&email)?.is_some()
          {
            return Err(Error::DuplicateEmail(email));
          }
          account.email = email.trim().to_owned();
        }
        if let Some(name) = update.display_name {
          account.display_name = name.trim().to_owned();
        }
        if let Some(hash) = password_hash {
          account.password_hash = hash;
        }

        account.updated_at = touched_at(account.updated_at);
        uow.update_account(&account)?;
        Ok(account)
      })
      .await?;

    info!(%account_id, "updated account");
    Ok(account)
  }

  /// Replace the role-specific fields of the account's current profile.
  pub async fn update_profile(&self, account_id: Uuid, update: ProfileUpdate) -> Result<Profile> {
    self
      .store
      .write(move |uow| {
        let account = uow
          .find_account(account_id)?
          .ok_or(Error::AccountNotFound(account_id))?;
        let profile = uow
          .find_profile(account_id)?
          .ok_or_else(|| no_profile(&account))?;

        let updated = match (profile, update) {
          (Profile::Donor(mut p), ProfileUpdate::Donor { interests }) => {
            p.interests = interests;
            Profile::Donor(p)
          }
          (Profile::Creator(mut p), ProfileUpdate::Creator { bio, categories }) => {
            p.bio = bio.trim().to_owned();
            p.categories = categories;
            Profile::Creator(p)
          }
          (profile, update) => {
            return Err(Error::InvalidInput(format!(
              "cannot apply a {:?} update to a {:?} profile",
              update.kind(),
              profile.kind()
            )));
          }
        };

        uow.update_profile(&updated)?;
        Ok(updated)
      })
      .await
  }

  /// Append a project reference to a creator's profile.
  pub async fn add_project(&self, account_id: Uuid, new: NewProject) -> Result<ProjectRef> {
    require_text("project title", &new.title)?;
    require_text("project description", &new.description)?;
    let project = ProjectRef {
      project_id:  Uuid::new_v4(),
      title:       new.title.trim().to_owned(),
      description: new.description.trim().to_owned(),
      category:    new.category,
    };

    let project = self
      .store
      .write(move |uow| {
        let account = uow
          .find_account(account_id)?
          .ok_or(Error::AccountNotFound(account_id))?;
        match uow.find_profile(account_id)? {
          Some(Profile::Creator(p)) => {
            uow.append_project(p.profile_id, &project)?;
            Ok(project)
          }
          Some(_) => Err(Error::InvalidInput(format!(
            "account {account_id} is not a creator"
          ))),
          None => Err(no_profile(&account)),
        }
      })
      .await?;

    info!(%account_id, project_id = %project.project_id, "added project");
    Ok(project)
  }
}

// ─── Unit-of-work steps ──────────────────────────────────────────────────────

/// Delete a profile, children first.
fn retire_profile(uow: &mut dyn UnitOfWork, profile: &Profile) -> Result<()> {
  let profile_id = profile.profile_id();
  uow.delete_projects(profile_id)?;
  uow.delete_profile(profile_id)?;
  Ok(())
}

/// Refuse to commit unless the account owns exactly the profile its type
/// calls for.
fn check_profile_invariant(uow: &dyn UnitOfWork, account: &Account) -> Result<()> {
  let rows = uow.count_profiles(account.account_id)?;
  let profile = uow.find_profile(account.account_id)?;
  let expected_rows = usize::from(account.account_type.profile_kind().is_some());

  if rows != expected_rows || !profile_matches_type(account.account_type, profile.as_ref()) {
    return Err(Error::storage(ProfileMismatch {
      account_id: account.account_id,
      account_type: account.account_type,
      rows,
      found: profile.map(|p| p.kind()),
    }));
  }
  Ok(())
}

fn no_profile(account: &Account) -> Error {
  Error::InvalidInput(format!(
    "{:?} account {} has no profile",
    account.account_type, account.account_id
  ))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn profile_matches_type_table() {
    let id = Uuid::new_v4();
    let donor = Profile::fresh(ProfileKind::Donor, id);
    let creator = Profile::fresh(ProfileKind::Creator, id);

    assert!(profile_matches_type(AccountType::Donor, Some(&donor)));
    assert!(profile_matches_type(AccountType::Creator, Some(&creator)));
    assert!(profile_matches_type(AccountType::Admin, None));

    assert!(!profile_matches_type(AccountType::Donor, Some(&creator)));
    assert!(!profile_matches_type(AccountType::Creator, None));
    assert!(!profile_matches_type(AccountType::Admin, Some(&donor)));
  }

  #[test]
  fn artist_filter_matches_name_and_category() {
    let now = Utc::now();
    let account = Account {
      account_id:    Uuid::new_v4(),
      email:         "bia@example.com".into(),
      password_hash: "x".into(),
      display_name:  "Beatriz Rendeira".into(),
      account_type:  AccountType::Creator,
      created_at:    now,
      updated_at:    now,
    };
    let Profile::Creator(mut profile) = Profile::fresh(ProfileKind::Creator, account.account_id)
    else {
      panic!("expected creator profile");
    };
    profile.categories.insert(Category::Drawing);
    let artist = Artist { account, profile };

    assert!(ArtistFilter::default().matches(&artist));
    let by_name = |n: &str| ArtistFilter { name: Some(n.into()), category: None };
    assert!(by_name("rendeira").matches(&artist));
    assert!(by_name("  BEATRIZ ").matches(&artist));
    assert!(!by_name("ana").matches(&artist));

    let by_category = |c| ArtistFilter { name: None, category: Some(c) };
    assert!(by_category(Category::Drawing).matches(&artist));
    assert!(!by_category(Category::Sculpture).matches(&artist));
  }
}
