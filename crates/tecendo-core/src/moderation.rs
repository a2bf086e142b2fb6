//! Filing and resolving reports through [`ReportModerationEngine`].
//!
//! Resolution is a guarded transition: the status check and the status write
//! happen in one unit of work, and the write itself only succeeds against the
//! status that was checked. Of any number of concurrent resolvers of one
//! pending report, exactly one wins.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result,
  account::require_text,
  report::{Report, ReportFilter, ReportKind, ReportStatus, touched_at, transition},
  store::Store,
};

pub struct ReportModerationEngine<S> {
  store: Arc<S>,
}

impl<S: Store> ReportModerationEngine<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// File a new pending report on behalf of `author_account_id`.
  pub async fn file(
    &self,
    reported_kind: ReportKind,
    target_id: &str,
    description: &str,
    author_account_id: Uuid,
  ) -> Result<Uuid> {
    require_text("description", description)?;
    require_text("target id", target_id)?;

    let now = Utc::now();
    let report = Report {
      report_id: Uuid::new_v4(),
      reported_kind,
      target_id: target_id.trim().to_owned(),
      description: description.trim().to_owned(),
      author_account_id,
      status: ReportStatus::Pending,
      created_at: now,
      updated_at: now,
    };
    let report_id = report.report_id;

    self
      .store
      .write(move |uow| {
        uow
          .find_account(author_account_id)?
          .ok_or(Error::AccountNotFound(author_account_id))?;
        uow.insert_report(&report)
      })
      .await?;

    info!(%report_id, ?reported_kind, %author_account_id, "filed report");
    Ok(report_id)
  }

  pub async fn get(&self, report_id: Uuid) -> Result<Report> {
    self
      .store
      .read(move |uow| {
        uow
          .find_report(report_id)?
          .ok_or(Error::ReportNotFound(report_id))
      })
      .await
  }

  /// Pending reports, newest first.
  pub async fn list_pending(&self) -> Result<Vec<Report>> {
    self.list(ReportFilter { status: Some(ReportStatus::Pending) }).await
  }

  /// Every report regardless of status, newest first.
  pub async fn list_all(&self) -> Result<Vec<Report>> {
    self.list(ReportFilter::default()).await
  }

  pub async fn list(&self, filter: ReportFilter) -> Result<Vec<Report>> {
    self.store.read(move |uow| uow.list_reports(filter)).await
  }

  /// Resolve a pending report to `outcome` (`Upheld` or `Dismissed`).
  ///
  /// A report is resolved at most once; any later call fails with
  /// [`Error::InvalidTransition`] whatever the outcome.
  pub async fn resolve(&self, report_id: Uuid, outcome: ReportStatus) -> Result<Report> {
    let report = self
      .store
      .write(move |uow| {
        let mut report = uow
          .find_report(report_id)?
          .ok_or(Error::ReportNotFound(report_id))?;

        let next = transition(report.status, outcome)?;
        let at = touched_at(report.updated_at);

        if !uow.set_report_status(report_id, report.status, next, at)? {
          return Err(Error::InvalidTransition(format!(
            "report {report_id} was resolved concurrently"
          )));
        }

        report.status = next;
        report.updated_at = at;
        Ok(report)
      })
      .await?;

    info!(%report_id, status = ?report.status, "resolved report");
    Ok(report)
  }
}
