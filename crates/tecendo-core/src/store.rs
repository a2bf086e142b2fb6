//! Repository traits and the [`Store`] unit-of-work abstraction.
//!
//! Repositories are synchronous: their methods only ever run inside a unit
//! of work handed out by a [`Store`], on whatever thread the backend does its
//! I/O on. A unit of work is one transaction. It commits if the closure
//! returns `Ok` and rolls back otherwise, so no intermediate state of a
//! multi-row change is ever visible to other units.
//!
//! The managers in [`identity`](crate::identity) and
//! [`moderation`](crate::moderation) are the only writers. Backends
//! (e.g. `tecendo-store-sqlite`) implement these traits and nothing else.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Result,
  account::{Account, AccountType},
  profile::{Profile, ProjectRef},
  report::{Report, ReportFilter, ReportStatus},
};

// ─── Repositories ────────────────────────────────────────────────────────────

pub trait AccountRepository {
  fn find_account(&self, account_id: Uuid) -> Result<Option<Account>>;

  /// Case-insensitive lookup; `email` need not be normalised by the caller.
  fn find_account_by_email(&self, email: &str) -> Result<Option<Account>>;

  /// All accounts, oldest first, optionally restricted to one type.
  fn list_accounts(&self, account_type: Option<AccountType>) -> Result<Vec<Account>>;

  /// Persist a new account. Fails with
  /// [`Error::DuplicateEmail`](crate::Error::DuplicateEmail) if the
  /// normalised email is taken.
  fn insert_account(&mut self, account: &Account) -> Result<()>;

  /// Overwrite every mutable column of an existing account.
  fn update_account(&mut self, account: &Account) -> Result<()>;

  /// Returns `false` if no row was deleted.
  fn delete_account(&mut self, account_id: Uuid) -> Result<bool>;
}

pub trait ProfileRepository {
  fn find_profile(&self, account_id: Uuid) -> Result<Option<Profile>>;

  /// Number of profile rows referencing `account_id`. At most one in a
  /// consistent store.
  fn count_profiles(&self, account_id: Uuid) -> Result<usize>;

  /// Insert a profile row together with any project references it carries.
  fn insert_profile(&mut self, profile: &Profile) -> Result<()>;

  /// Overwrite the role-specific columns of an existing profile row.
  /// Project references are not touched.
  fn update_profile(&mut self, profile: &Profile) -> Result<()>;

  /// Append a project reference after the existing ones.
  fn append_project(&mut self, profile_id: Uuid, project: &ProjectRef) -> Result<()>;

  /// Remove every project reference of a profile; returns how many.
  fn delete_projects(&mut self, profile_id: Uuid) -> Result<usize>;

  /// Remove the profile row itself. Its project references must already be
  /// gone. Returns `false` if no row was deleted.
  fn delete_profile(&mut self, profile_id: Uuid) -> Result<bool>;
}

pub trait ReportRepository {
  fn find_report(&self, report_id: Uuid) -> Result<Option<Report>>;

  /// Reports matching `filter`, newest first.
  fn list_reports(&self, filter: ReportFilter) -> Result<Vec<Report>>;

  fn insert_report(&mut self, report: &Report) -> Result<()>;

  /// Compare-and-set the status of a report.
  ///
  /// Writes `next` and `at` only if the stored status is still `expected`;
  /// returns whether the row was changed.
  fn set_report_status(
    &mut self,
    report_id: Uuid,
    expected: ReportStatus,
    next: ReportStatus,
    at: DateTime<Utc>,
  ) -> Result<bool>;
}

/// Everything a unit of work can touch.
pub trait UnitOfWork: AccountRepository + ProfileRepository + ReportRepository {}

impl<T> UnitOfWork for T where T: AccountRepository + ProfileRepository + ReportRepository {}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A transactional backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait Store: Send + Sync {
  /// Run `work` in a read-only transaction.
  fn read<T, F>(&self, work: F) -> impl Future<Output = Result<T>> + Send + '_
  where
    F: FnOnce(&dyn UnitOfWork) -> Result<T> + Send + 'static,
    T: Send + 'static;

  /// Run `work` in a write transaction.
  ///
  /// Write transactions against one store are serialised: two units never
  /// interleave their individual steps.
  fn write<T, F>(&self, work: F) -> impl Future<Output = Result<T>> + Send + '_
  where
    F: FnOnce(&mut dyn UnitOfWork) -> Result<T> + Send + 'static,
    T: Send + 'static;
}
