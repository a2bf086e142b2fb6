//! The repository implementations on [`SqliteUnit`], which run inside one
//! open SQLite transaction.
//!
//! Every query lives in an inherent method returning this crate's
//! [`Result`]; the trait impls only convert the error into the core error
//! type.

use chrono::{DateTime, Utc};
use rusqlite::{ErrorCode, OptionalExtension as _, params};
use tecendo_core::{
  Error as CoreError, Result as CoreResult,
  account::{Account, AccountType, normalize_email},
  profile::{Profile, ProjectRef},
  report::{Report, ReportFilter, ReportStatus},
  store::{AccountRepository, ProfileRepository, ReportRepository},
};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    ACCOUNT_COLUMNS, REPORT_COLUMNS, RawAccount, RawProfile, RawProject, RawReport,
    encode_account_type, encode_categories, encode_category, encode_dt, encode_profile_kind,
    encode_report_kind, encode_report_status, encode_uuid,
  },
};

/// A view of the connection for the duration of one transaction.
pub struct SqliteUnit<'c> {
  pub conn: &'c rusqlite::Connection,
}

/// `true` for a violated `UNIQUE` constraint (as opposed to, say, a primary
/// key or foreign key violation).
fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.code == ErrorCode::ConstraintViolation
        && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── Accounts ────────────────────────────────────────────────────────────────

impl SqliteUnit<'_> {
  fn query_account(&self, clause: &str, key: String) -> Result<Option<Account>> {
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts {clause}");
    let raw = self
      .conn
      .query_row(&sql, params![key], RawAccount::from_row)
      .optional()?;
    raw.map(RawAccount::into_account).transpose()
  }

  fn query_accounts(&self, account_type: Option<AccountType>) -> Result<Vec<Account>> {
    let raws = if let Some(t) = account_type {
      let mut stmt = self.conn.prepare(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_type = ?1
         ORDER BY created_at, rowid"
      ))?;
      stmt
        .query_map(params![encode_account_type(t)], RawAccount::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?
    } else {
      let mut stmt = self.conn.prepare(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at, rowid"
      ))?;
      stmt
        .query_map([], RawAccount::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?
    };

    raws.into_iter().map(RawAccount::into_account).collect()
  }

  /// `Ok(false)` signals a unique-key collision on the email.
  fn write_account(&self, account: &Account, insert: bool) -> Result<bool> {
    let sql = if insert {
      "INSERT INTO accounts (
         account_id, email, email_key, password_hash, display_name,
         account_type, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
    } else {
      "UPDATE accounts
         SET email = ?2, email_key = ?3, password_hash = ?4, display_name = ?5,
             account_type = ?6, created_at = ?7, updated_at = ?8
       WHERE account_id = ?1"
    };

    let result = self.conn.execute(
      sql,
      params![
        encode_uuid(account.account_id),
        account.email,
        account.email_key(),
        account.password_hash,
        account.display_name,
        encode_account_type(account.account_type),
        encode_dt(account.created_at),
        encode_dt(account.updated_at),
      ],
    );

    match result {
      Ok(_) => Ok(true),
      Err(e) if is_unique_violation(&e) => Ok(false),
      Err(e) => Err(e.into()),
    }
  }
}

impl AccountRepository for SqliteUnit<'_> {
  fn find_account(&self, account_id: Uuid) -> CoreResult<Option<Account>> {
    Ok(self.query_account("WHERE account_id = ?1", encode_uuid(account_id))?)
  }

  fn find_account_by_email(&self, email: &str) -> CoreResult<Option<Account>> {
    Ok(self.query_account("WHERE email_key = ?1", normalize_email(email))?)
  }

  fn list_accounts(&self, account_type: Option<AccountType>) -> CoreResult<Vec<Account>> {
    Ok(self.query_accounts(account_type)?)
  }

  fn insert_account(&mut self, account: &Account) -> CoreResult<()> {
    if !self.write_account(account, true)? {
      return Err(CoreError::DuplicateEmail(account.email.clone()));
    }
    Ok(())
  }

  fn update_account(&mut self, account: &Account) -> CoreResult<()> {
    if !self.write_account(account, false)? {
      return Err(CoreError::DuplicateEmail(account.email.clone()));
    }
    Ok(())
  }

  fn delete_account(&mut self, account_id: Uuid) -> CoreResult<bool> {
    let n = self
      .conn
      .execute("DELETE FROM accounts WHERE account_id = ?1", params![encode_uuid(account_id)])
      .map_err(crate::Error::from)?;
    Ok(n > 0)
  }
}

// ─── Profiles ────────────────────────────────────────────────────────────────

impl SqliteUnit<'_> {
  fn query_profile(&self, account_id: Uuid) -> Result<Option<Profile>> {
    let raw = self
      .conn
      .query_row(
        "SELECT profile_id, account_id, kind, bio, categories
         FROM profiles WHERE account_id = ?1",
        params![encode_uuid(account_id)],
        RawProfile::from_row,
      )
      .optional()?;

    let Some(raw) = raw else {
      return Ok(None);
    };
    let projects = self.query_projects(&raw.profile_id)?;
    raw.into_profile(projects).map(Some)
  }

  fn query_projects(&self, profile_id: &str) -> Result<Vec<ProjectRef>> {
    let mut stmt = self.conn.prepare(
      "SELECT project_id, title, description, category FROM profile_projects
       WHERE profile_id = ?1 ORDER BY position",
    )?;
    let raws = stmt
      .query_map(params![profile_id], RawProject::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    raws.into_iter().map(RawProject::into_project).collect()
  }

  fn insert_project_at(&self, profile_id: Uuid, position: i64, project: &ProjectRef) -> Result<()> {
    self.conn.execute(
      "INSERT INTO profile_projects
         (profile_id, position, project_id, title, description, category)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![
        encode_uuid(profile_id),
        position,
        encode_uuid(project.project_id),
        project.title,
        project.description,
        encode_category(project.category),
      ],
    )?;
    Ok(())
  }

  fn write_profile(&self, profile: &Profile, insert: bool) -> Result<usize> {
    let (bio, categories) = match profile {
      Profile::Donor(p) => (None, encode_categories(&p.interests)?),
      Profile::Creator(p) => (Some(p.bio.as_str()), encode_categories(&p.categories)?),
    };

    let n = if insert {
      self.conn.execute(
        "INSERT INTO profiles (profile_id, account_id, kind, bio, categories)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
          encode_uuid(profile.profile_id()),
          encode_uuid(profile.account_id()),
          encode_profile_kind(profile.kind()),
          bio,
          categories,
        ],
      )?
    } else {
      self.conn.execute(
        "UPDATE profiles SET bio = ?2, categories = ?3
         WHERE profile_id = ?1 AND kind = ?4",
        params![
          encode_uuid(profile.profile_id()),
          bio,
          categories,
          encode_profile_kind(profile.kind()),
        ],
      )?
    };

    if let (true, Profile::Creator(p)) = (insert, profile) {
      for (position, project) in (0_i64..).zip(&p.projects) {
        self.insert_project_at(p.profile_id, position, project)?;
      }
    }
    Ok(n)
  }
}

impl ProfileRepository for SqliteUnit<'_> {
  fn find_profile(&self, account_id: Uuid) -> CoreResult<Option<Profile>> {
    Ok(self.query_profile(account_id)?)
  }

  fn count_profiles(&self, account_id: Uuid) -> CoreResult<usize> {
    let n: i64 = self
      .conn
      .query_row(
        "SELECT COUNT(*) FROM profiles WHERE account_id = ?1",
        params![encode_uuid(account_id)],
        |r| r.get(0),
      )
      .map_err(crate::Error::from)?;
    Ok(n as usize)
  }

  fn insert_profile(&mut self, profile: &Profile) -> CoreResult<()> {
    self.write_profile(profile, true)?;
    Ok(())
  }

  fn update_profile(&mut self, profile: &Profile) -> CoreResult<()> {
    if self.write_profile(profile, false)? == 0 {
      return Err(CoreError::AccountNotFound(profile.account_id()));
    }
    Ok(())
  }

  fn append_project(&mut self, profile_id: Uuid, project: &ProjectRef) -> CoreResult<()> {
    let next: i64 = self
      .conn
      .query_row(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM profile_projects WHERE profile_id = ?1",
        params![encode_uuid(profile_id)],
        |r| r.get(0),
      )
      .map_err(crate::Error::from)?;
    self.insert_project_at(profile_id, next, project)?;
    Ok(())
  }

  fn delete_projects(&mut self, profile_id: Uuid) -> CoreResult<usize> {
    let n = self
      .conn
      .execute(
        "DELETE FROM profile_projects WHERE profile_id = ?1",
        params![encode_uuid(profile_id)],
      )
      .map_err(crate::Error::from)?;
    Ok(n)
  }

  fn delete_profile(&mut self, profile_id: Uuid) -> CoreResult<bool> {
    let n = self
      .conn
      .execute("DELETE FROM profiles WHERE profile_id = ?1", params![encode_uuid(profile_id)])
      .map_err(crate::Error::from)?;
    Ok(n > 0)
  }
}

// ─── Reports ─────────────────────────────────────────────────────────────────

impl SqliteUnit<'_> {
  fn query_reports(&self, filter: ReportFilter) -> Result<Vec<Report>> {
    let raws = if let Some(status) = filter.status {
      let mut stmt = self.conn.prepare(&format!(
        "SELECT {REPORT_COLUMNS} FROM reports WHERE status = ?1
         ORDER BY created_at DESC, rowid DESC"
      ))?;
      stmt
        .query_map(params![encode_report_status(status)], RawReport::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?
    } else {
      let mut stmt = self.conn.prepare(&format!(
        "SELECT {REPORT_COLUMNS} FROM reports ORDER BY created_at DESC, rowid DESC"
      ))?;
      stmt
        .query_map([], RawReport::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?
    };

    raws.into_iter().map(RawReport::into_report).collect()
  }
}

impl ReportRepository for SqliteUnit<'_> {
  fn find_report(&self, report_id: Uuid) -> CoreResult<Option<Report>> {
    let raw = self
      .conn
      .query_row(
        &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE report_id = ?1"),
        params![encode_uuid(report_id)],
        RawReport::from_row,
      )
      .optional()
      .map_err(crate::Error::from)?;
    Ok(raw.map(RawReport::into_report).transpose()?)
  }

  fn list_reports(&self, filter: ReportFilter) -> CoreResult<Vec<Report>> {
    Ok(self.query_reports(filter)?)
  }

  fn insert_report(&mut self, report: &Report) -> CoreResult<()> {
    self
      .conn
      .execute(
        &format!("INSERT INTO reports ({REPORT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
        params![
          encode_uuid(report.report_id),
          encode_report_kind(report.reported_kind),
          report.target_id,
          report.description,
          encode_uuid(report.author_account_id),
          encode_report_status(report.status),
          encode_dt(report.created_at),
          encode_dt(report.updated_at),
        ],
      )
      .map_err(crate::Error::from)?;
    Ok(())
  }

  fn set_report_status(
    &mut self,
    report_id: Uuid,
    expected: ReportStatus,
    next: ReportStatus,
    at: DateTime<Utc>,
  ) -> CoreResult<bool> {
    let n = self
      .conn
      .execute(
        "UPDATE reports SET status = ?3, updated_at = ?4
         WHERE report_id = ?1 AND status = ?2",
        params![
          encode_uuid(report_id),
          encode_report_status(expected),
          encode_report_status(next),
          encode_dt(at),
        ],
      )
      .map_err(crate::Error::from)?;
    Ok(n == 1)
  }
}
