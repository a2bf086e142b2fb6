//! Handlers for `/accounts` and `/artists` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/accounts` | Body: `{"email","display_name","password","account_type"}` |
//! | `GET`    | `/accounts/:id` | 404 if not found |
//! | `PATCH`  | `/accounts/:id` | Self or admin |
//! | `PUT`    | `/accounts/:id/type` | Self or admin; only admins grant `admin` |
//! | `DELETE` | `/accounts/:id` | Self or admin |
//! | `GET`    | `/accounts/:id/profile` | 404 for admin accounts |
//! | `PUT`    | `/accounts/:id/profile` | Self only |
//! | `POST`   | `/accounts/:id/projects` | Self only; creators |
//! | `GET`    | `/artists` | Creators with bio and categories; `?name=`, `?category=` |

use std::collections::BTreeSet;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tecendo_core::{
  account::{Account, AccountType, AccountUpdate},
  identity::{Artist, ArtistFilter},
  profile::{Category, NewProject, Profile, ProfileUpdate, ProjectRef},
  store::Store,
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError, session::Caller};

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:        String,
  pub display_name: String,
  pub password:     String,
  pub account_type: AccountType,
}

/// `POST /accounts`
///
/// Open to anyone for donor and creator accounts. Admin accounts are only
/// ever seeded or promoted by another admin.
pub async fn register<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
{
  if body.account_type == AccountType::Admin {
    return Err(ApiError::Forbidden("admin accounts cannot self-register".into()));
  }

  let id = state
    .identity
    .register(&body.email, &body.display_name, &body.password, body.account_type)
    .await?;
  let account = state.identity.get_account(id).await?;
  Ok((StatusCode::CREATED, Json(account)))
}

// ─── Get / list ───────────────────────────────────────────────────────────────

/// `GET /accounts/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Account>, ApiError>
where
  S: Store + 'static,
{
  Ok(Json(state.identity.get_account(id).await?))
}

/// A creator account as listed publicly.
#[derive(Debug, Serialize)]
pub struct ArtistView {
  #[serde(flatten)]
  pub account:    Account,
  pub bio:        String,
  pub categories: BTreeSet<Category>,
}

impl From<Artist> for ArtistView {
  fn from(artist: Artist) -> Self {
    Self {
      account:    artist.account,
      bio:        artist.profile.bio,
      categories: artist.profile.categories,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ArtistParams {
  pub name:     Option<String>,
  pub category: Option<Category>,
}

/// `GET /artists[?name=<substring>][&category=<category>]`
pub async fn artists<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ArtistParams>,
) -> Result<Json<Vec<ArtistView>>, ApiError>
where
  S: Store + 'static,
{
  let filter = ArtistFilter {
    name:     params.name.filter(|n| !n.trim().is_empty()),
    category: params.category,
  };
  let artists = state.identity.list_artists(filter).await?;
  Ok(Json(artists.into_iter().map(ArtistView::from).collect()))
}

// ─── Update / type change / delete ────────────────────────────────────────────

/// `PATCH /accounts/:id`
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<AccountUpdate>,
) -> Result<Json<Account>, ApiError>
where
  S: Store + 'static,
{
  caller.require_self_or_admin(id)?;
  Ok(Json(state.identity.update_account(id, body).await?))
}

#[derive(Debug, Deserialize)]
pub struct ChangeTypeBody {
  pub account_type: AccountType,
}

/// `PUT /accounts/:id/type`
pub async fn change_type<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<ChangeTypeBody>,
) -> Result<Json<Account>, ApiError>
where
  S: Store + 'static,
{
  caller.require_self_or_admin(id)?;
  if body.account_type == AccountType::Admin {
    caller.require_admin()?;
  }

  state
    .identity
    .change_account_type(id, body.account_type)
    .await?;
  Ok(Json(state.identity.get_account(id).await?))
}

/// `DELETE /accounts/:id`
pub async fn delete<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: Store + 'static,
{
  caller.require_self_or_admin(id)?;
  state.identity.delete_account(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Profile ──────────────────────────────────────────────────────────────────

/// `GET /accounts/:id/profile`
pub async fn get_profile<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError>
where
  S: Store + 'static,
{
  state
    .identity
    .get_profile(id)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("account {id} has no profile")))
}

/// `PUT /accounts/:id/profile`, body: `{"kind":"creator","bio":…,"categories":[…]}`
pub async fn update_profile<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<ProfileUpdate>,
) -> Result<Json<Profile>, ApiError>
where
  S: Store + 'static,
{
  caller.require_self(id)?;
  Ok(Json(state.identity.update_profile(id, body).await?))
}

/// `POST /accounts/:id/projects`, body: `{"title":…,"description":…,"category":"painting"}`
pub async fn add_project<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<NewProject>,
) -> Result<(StatusCode, Json<ProjectRef>), ApiError>
where
  S: Store + 'static,
{
  caller.require_self(id)?;
  let project = state.identity.add_project(id, body).await?;
  Ok((StatusCode::CREATED, Json(project)))
}
