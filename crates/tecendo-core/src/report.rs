//! Reports and the moderation state machine.
//!
//! A report is filed `Pending` and is resolved exactly once, to one of the
//! two terminal states. The legal moves are listed in [`TRANSITIONS`];
//! anything not in that table is rejected.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Kinds ───────────────────────────────────────────────────────────────────

/// What a report is raised against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
  Project,
  User,
  Artist,
}

/// Moderation status of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
  Pending,
  Upheld,
  Dismissed,
}

impl ReportStatus {
  pub fn is_terminal(self) -> bool { !matches!(self, Self::Pending) }

  /// Look up the state reached from `self` under `verdict`.
  pub fn next(self, verdict: Verdict) -> Option<ReportStatus> {
    TRANSITIONS
      .iter()
      .find(|(from, v, _)| *from == self && *v == verdict)
      .map(|(_, _, to)| *to)
  }
}

/// A moderator's decision on a pending report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
  Uphold,
  Dismiss,
}

impl Verdict {
  /// Interpret a requested outcome status as a verdict.
  ///
  /// `Pending` is a starting state, never an outcome.
  pub fn from_outcome(outcome: ReportStatus) -> Result<Self> {
    match outcome {
      ReportStatus::Upheld => Ok(Self::Uphold),
      ReportStatus::Dismissed => Ok(Self::Dismiss),
      ReportStatus::Pending => Err(Error::InvalidTransition(
        "pending is not a valid resolution outcome".into(),
      )),
    }
  }
}

/// The complete transition table of the moderation state machine.
pub const TRANSITIONS: &[(ReportStatus, Verdict, ReportStatus)] = &[
  (ReportStatus::Pending, Verdict::Uphold, ReportStatus::Upheld),
  (ReportStatus::Pending, Verdict::Dismiss, ReportStatus::Dismissed),
];

/// Apply `outcome` to a report currently in `current`.
pub fn transition(current: ReportStatus, outcome: ReportStatus) -> Result<ReportStatus> {
  let verdict = Verdict::from_outcome(outcome)?;
  current.next(verdict).ok_or_else(|| {
    Error::InvalidTransition(format!(
      "report is already {current:?}, cannot move to {outcome:?}"
    ))
  })
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// A moderation case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
  pub report_id:         Uuid,
  pub reported_kind:     ReportKind,
  /// Loose reference to the reported entity; its meaning depends on
  /// `reported_kind` and it is not checked against any table.
  pub target_id:         String,
  pub description:       String,
  /// Non-owning reference. Reports outlive their author's account; once the
  /// account is deleted this id no longer resolves (ids are never reused).
  pub author_account_id: Uuid,
  pub status:            ReportStatus,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

/// Input for [`ReportModerationEngine::file`](crate::moderation::ReportModerationEngine::file).
#[derive(Debug, Clone, Deserialize)]
pub struct NewReport {
  pub reported_kind: ReportKind,
  pub target_id:     String,
  pub description:   String,
}

/// Filter for report listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportFilter {
  pub status: Option<ReportStatus>,
}

/// Timestamp for a mutation of a record last touched at `previous`.
///
/// Never earlier than `previous` plus one microsecond, so every mutation is
/// observable as a strictly later `updated_at`, even on a coarse clock.
pub fn touched_at(previous: DateTime<Utc>) -> DateTime<Utc> {
  Utc::now().max(previous + Duration::microseconds(1))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pending_moves_to_either_terminal_state() {
    assert_eq!(
      transition(ReportStatus::Pending, ReportStatus::Upheld).unwrap(),
      ReportStatus::Upheld
    );
    assert_eq!(
      transition(ReportStatus::Pending, ReportStatus::Dismissed).unwrap(),
      ReportStatus::Dismissed
    );
  }

  #[test]
  fn terminal_states_have_no_exits() {
    for from in [ReportStatus::Upheld, ReportStatus::Dismissed] {
      for outcome in [ReportStatus::Upheld, ReportStatus::Dismissed] {
        assert!(matches!(
          transition(from, outcome),
          Err(Error::InvalidTransition(_))
        ));
      }
    }
  }

  #[test]
  fn pending_is_never_an_outcome() {
    for from in [ReportStatus::Pending, ReportStatus::Upheld, ReportStatus::Dismissed] {
      assert!(matches!(
        transition(from, ReportStatus::Pending),
        Err(Error::InvalidTransition(_))
      ));
    }
  }

  #[test]
  fn every_transition_leaves_pending_for_a_terminal_state() {
    for (from, _, to) in TRANSITIONS {
      assert_eq!(*from, ReportStatus::Pending);
      assert!(to.is_terminal());
    }
  }

  #[test]
  fn touched_at_is_strictly_later() {
    let far_future = Utc::now() + Duration::hours(1);
    assert!(touched_at(far_future) > far_future);

    let past = Utc::now() - Duration::hours(1);
    assert!(touched_at(past) > past);
  }
}
