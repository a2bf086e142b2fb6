//! Handlers for `/reports` and `/admin/reports` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/reports` | Any signed-in account; author comes from the token |
//! | `GET`  | `/admin/reports` | Admin; optional `?status=pending\|upheld\|dismissed` |
//! | `GET`  | `/admin/reports/:id` | Admin |
//! | `POST` | `/admin/reports/:id/analysis` | Admin; body: `{"outcome":"upheld"}` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tecendo_core::{
  Error,
  report::{NewReport, Report, ReportFilter, ReportStatus},
  store::Store,
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError, session::Caller};

// ─── View ─────────────────────────────────────────────────────────────────────

/// A report as shown to moderators.
///
/// `author_name` is `None` once the author's account has been deleted; the
/// report itself still carries the original author id.
#[derive(Debug, Serialize)]
pub struct ReportView {
  #[serde(flatten)]
  pub report:      Report,
  pub author_name: Option<String>,
}

async fn view<S>(state: &ApiState<S>, report: Report) -> Result<ReportView, ApiError>
where
  S: Store + 'static,
{
  let author_name = match state.identity.get_account(report.author_account_id).await {
    Ok(account) => Some(account.display_name),
    Err(Error::AccountNotFound(_)) => None,
    Err(e) => return Err(e.into()),
  };
  Ok(ReportView { report, author_name })
}

// ─── File ─────────────────────────────────────────────────────────────────────

/// `POST /reports`, body: `{"reported_kind":"project","target_id":"42","description":"…"}`
pub async fn file<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Json(body): Json<NewReport>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
{
  let id = state
    .moderation
    .file(
      body.reported_kind,
      &body.target_id,
      &body.description,
      caller.account_id,
    )
    .await?;
  let report = state.moderation.get(id).await?;
  Ok((StatusCode::CREATED, Json(report)))
}

// ─── Moderation ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<ReportStatus>,
}

/// `GET /admin/reports[?status=<status>]`, newest first.
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ReportView>>, ApiError>
where
  S: Store + 'static,
{
  caller.require_admin()?;

  let reports = match params.status {
    Some(ReportStatus::Pending) => state.moderation.list_pending().await?,
    None => state.moderation.list_all().await?,
    status => state.moderation.list(ReportFilter { status }).await?,
  };

  let mut views = Vec::with_capacity(reports.len());
  for report in reports {
    views.push(view(&state, report).await?);
  }
  Ok(Json(views))
}

/// `GET /admin/reports/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<ReportView>, ApiError>
where
  S: Store + 'static,
{
  caller.require_admin()?;
  let report = state.moderation.get(id).await?;
  Ok(Json(view(&state, report).await?))
}

#[derive(Debug, Deserialize)]
pub struct AnalysisBody {
  pub outcome: ReportStatus,
}

/// `POST /admin/reports/:id/analysis`
pub async fn analyse<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<AnalysisBody>,
) -> Result<Json<ReportView>, ApiError>
where
  S: Store + 'static,
{
  caller.require_admin()?;
  let report = state.moderation.resolve(id, body.outcome).await?;
  Ok(Json(view(&state, report).await?))
}
