//! Profiles: the role-specific extension of an account.
//!
//! A profile is never changed from one variant into another. When an
//! account's type changes, its profile row is deleted and a fresh row of the
//! new variant is inserted (see
//! [`AccountIdentityManager::change_account_type`](crate::identity::AccountIdentityManager::change_account_type)).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Art forms a creator works in, or a donor is interested in.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  Painting,
  Sculpture,
  Photography,
  Drawing,
}

/// Discriminant of [`Profile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
  Donor,
  Creator,
}

/// A reference to a project published by a creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
  pub project_id:  Uuid,
  pub title:       String,
  pub description: String,
  pub category:    Category,
}

/// A project as submitted by its creator, before it has an id.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
  pub title:       String,
  pub description: String,
  pub category:    Category,
}

impl NewProject {
  pub fn new(title: &str, description: &str, category: Category) -> Self {
    Self {
      title: title.to_owned(),
      description: description.to_owned(),
      category,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorProfile {
  pub profile_id: Uuid,
  pub account_id: Uuid,
  pub interests:  BTreeSet<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorProfile {
  pub profile_id: Uuid,
  pub account_id: Uuid,
  pub bio:        String,
  pub categories: BTreeSet<Category>,
  /// In publication order.
  pub projects:   Vec<ProjectRef>,
}

/// The single profile row attached to a donor or creator account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Profile {
  Donor(DonorProfile),
  Creator(CreatorProfile),
}

impl Profile {
  /// A new, empty profile of the given variant for `account_id`.
  pub fn fresh(kind: ProfileKind, account_id: Uuid) -> Self {
    let profile_id = Uuid::new_v4();
    match kind {
      ProfileKind::Donor => Self::Donor(DonorProfile {
        profile_id,
        account_id,
        interests: BTreeSet::new(),
      }),
      ProfileKind::Creator => Self::Creator(CreatorProfile {
        profile_id,
        account_id,
        bio: String::new(),
        categories: BTreeSet::new(),
        projects: Vec::new(),
      }),
    }
  }

  pub fn kind(&self) -> ProfileKind {
    match self {
      Self::Donor(_) => ProfileKind::Donor,
      Self::Creator(_) => ProfileKind::Creator,
    }
  }

  pub fn profile_id(&self) -> Uuid {
    match self {
      Self::Donor(p) => p.profile_id,
      Self::Creator(p) => p.profile_id,
    }
  }

  pub fn account_id(&self) -> Uuid {
    match self {
      Self::Donor(p) => p.account_id,
      Self::Creator(p) => p.account_id,
    }
  }
}

/// Replacement of the role-specific fields of an existing profile.
///
/// The variant has to match the profile it is applied to; switching variants
/// is a role transition, not an update.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfileUpdate {
  Donor {
    interests: BTreeSet<Category>,
  },
  Creator {
    bio:        String,
    categories: BTreeSet<Category>,
  },
}

impl ProfileUpdate {
  pub fn kind(&self) -> ProfileKind {
    match self {
      Self::Donor { .. } => ProfileKind::Donor,
      Self::Creator { .. } => ProfileKind::Creator,
    }
  }
}
