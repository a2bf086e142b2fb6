//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond
//! precision, `Z` suffix) so that text comparison orders them
//! chronologically. Category sets are compact JSON arrays. UUIDs are
//! hyphenated lowercase strings.

use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};
use tecendo_core::{
  account::{Account, AccountType},
  profile::{Category, CreatorProfile, DonorProfile, Profile, ProfileKind, ProjectRef},
  report::{Report, ReportKind, ReportStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ────────────────────────────────────────────────────────────────────

fn unknown(column: &'static str, value: &str) -> Error {
  Error::UnknownValue { column, value: value.to_owned() }
}

pub fn encode_account_type(t: AccountType) -> &'static str {
  match t {
    AccountType::Donor => "donor",
    AccountType::Creator => "creator",
    AccountType::Admin => "admin",
  }
}

pub fn decode_account_type(s: &str) -> Result<AccountType> {
  match s {
    "donor" => Ok(AccountType::Donor),
    "creator" => Ok(AccountType::Creator),
    "admin" => Ok(AccountType::Admin),
    other => Err(unknown("account_type", other)),
  }
}

pub fn encode_profile_kind(k: ProfileKind) -> &'static str {
  match k {
    ProfileKind::Donor => "donor",
    ProfileKind::Creator => "creator",
  }
}

pub fn decode_profile_kind(s: &str) -> Result<ProfileKind> {
  match s {
    "donor" => Ok(ProfileKind::Donor),
    "creator" => Ok(ProfileKind::Creator),
    other => Err(unknown("kind", other)),
  }
}

pub fn encode_report_kind(k: ReportKind) -> &'static str {
  match k {
    ReportKind::Project => "project",
    ReportKind::User => "user",
    ReportKind::Artist => "artist",
  }
}

pub fn decode_report_kind(s: &str) -> Result<ReportKind> {
  match s {
    "project" => Ok(ReportKind::Project),
    "user" => Ok(ReportKind::User),
    "artist" => Ok(ReportKind::Artist),
    other => Err(unknown("reported_kind", other)),
  }
}

pub fn encode_report_status(s: ReportStatus) -> &'static str {
  match s {
    ReportStatus::Pending => "pending",
    ReportStatus::Upheld => "upheld",
    ReportStatus::Dismissed => "dismissed",
  }
}

pub fn decode_report_status(s: &str) -> Result<ReportStatus> {
  match s {
    "pending" => Ok(ReportStatus::Pending),
    "upheld" => Ok(ReportStatus::Upheld),
    "dismissed" => Ok(ReportStatus::Dismissed),
    other => Err(unknown("status", other)),
  }
}

// ─── Categories ──────────────────────────────────────────────────────────────

pub fn encode_categories(c: &BTreeSet<Category>) -> Result<String> {
  Ok(serde_json::to_string(c)?)
}

pub fn decode_categories(s: &str) -> Result<BTreeSet<Category>> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_category(c: Category) -> &'static str {
  match c {
    Category::Painting => "painting",
    Category::Sculpture => "sculpture",
    Category::Photography => "photography",
    Category::Drawing => "drawing",
  }
}

pub fn decode_category(s: &str) -> Result<Category> {
  match s {
    "painting" => Ok(Category::Painting),
    "sculpture" => Ok(Category::Sculpture),
    "photography" => Ok(Category::Photography),
    "drawing" => Ok(Category::Drawing),
    other => Err(unknown("category", other)),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawAccount`]'s field order.
pub const ACCOUNT_COLUMNS: &str =
  "account_id, email, password_hash, display_name, account_type, created_at, updated_at";

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:    String,
  pub email:         String,
  pub password_hash: String,
  pub display_name:  String,
  pub account_type:  String,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawAccount {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id:    row.get(0)?,
      email:         row.get(1)?,
      password_hash: row.get(2)?,
      display_name:  row.get(3)?,
      account_type:  row.get(4)?,
      created_at:    row.get(5)?,
      updated_at:    row.get(6)?,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      account_id:    decode_uuid(&self.account_id)?,
      email:         self.email,
      password_hash: self.password_hash,
      display_name:  self.display_name,
      account_type:  decode_account_type(&self.account_type)?,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `profiles` row.
pub struct RawProfile {
  pub profile_id: String,
  pub account_id: String,
  pub kind:       String,
  pub bio:        Option<String>,
  pub categories: String,
}

impl RawProfile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      profile_id: row.get(0)?,
      account_id: row.get(1)?,
      kind:       row.get(2)?,
      bio:        row.get(3)?,
      categories: row.get(4)?,
    })
  }

  /// `projects` is only consulted for creator profiles.
  pub fn into_profile(self, projects: Vec<ProjectRef>) -> Result<Profile> {
    let profile_id = decode_uuid(&self.profile_id)?;
    let account_id = decode_uuid(&self.account_id)?;
    let categories = decode_categories(&self.categories)?;

    Ok(match decode_profile_kind(&self.kind)? {
      ProfileKind::Donor => Profile::Donor(DonorProfile {
        profile_id,
        account_id,
        interests: categories,
      }),
      ProfileKind::Creator => Profile::Creator(CreatorProfile {
        profile_id,
        account_id,
        bio: self.bio.unwrap_or_default(),
        categories,
        projects,
      }),
    })
  }
}

/// Raw strings read directly from a `profile_projects` row.
pub struct RawProject {
  pub project_id:  String,
  pub title:       String,
  pub description: String,
  pub category:    String,
}

impl RawProject {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      project_id:  row.get(0)?,
      title:       row.get(1)?,
      description: row.get(2)?,
      category:    row.get(3)?,
    })
  }

  pub fn into_project(self) -> Result<ProjectRef> {
    Ok(ProjectRef {
      project_id:  decode_uuid(&self.project_id)?,
      title:       self.title,
      description: self.description,
      category:    decode_category(&self.category)?,
    })
  }
}

/// Column list matching [`RawReport`]'s field order.
pub const REPORT_COLUMNS: &str = "report_id, reported_kind, target_id, description, \
                                  author_account_id, status, created_at, updated_at";

/// Raw strings read directly from a `reports` row.
pub struct RawReport {
  pub report_id:         String,
  pub reported_kind:     String,
  pub target_id:         String,
  pub description:       String,
  pub author_account_id: String,
  pub status:            String,
  pub created_at:        String,
  pub updated_at:        String,
}

impl RawReport {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      report_id:         row.get(0)?,
      reported_kind:     row.get(1)?,
      target_id:         row.get(2)?,
      description:       row.get(3)?,
      author_account_id: row.get(4)?,
      status:            row.get(5)?,
      created_at:        row.get(6)?,
      updated_at:        row.get(7)?,
    })
  }

  pub fn into_report(self) -> Result<Report> {
    Ok(Report {
      report_id:         decode_uuid(&self.report_id)?,
      reported_kind:     decode_report_kind(&self.reported_kind)?,
      target_id:         self.target_id,
      description:       self.description,
      author_account_id: decode_uuid(&self.author_account_id)?,
      status:            decode_report_status(&self.status)?,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}
