//! Login and the bearer-token [`Caller`] extractor.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/login` | Body: `{"email":"…","password":"…"}` |

use axum::{
  Json,
  extract::{FromRequestParts, State},
  http::{header, request::Parts},
};
use serde::Deserialize;
use tecendo_core::{Error, account::AccountType, auth::AuthResult, store::Store};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// Message for every failed login, whichever half of the pair was wrong.
const LOGIN_FAILED: &str = "invalid email or password";

// ─── Caller ──────────────────────────────────────────────────────────────────

/// The account a request acts on behalf of, resolved from its bearer token.
///
/// The role is re-read from the store rather than trusted from the token, so
/// a type change or deletion takes effect before the token expires.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
  pub account_id:   Uuid,
  pub account_type: AccountType,
}

impl Caller {
  pub fn is_admin(&self) -> bool { self.account_type == AccountType::Admin }

  pub fn require_admin(&self) -> Result<(), ApiError> {
    if !self.is_admin() {
      return Err(ApiError::Forbidden("admin role required".into()));
    }
    Ok(())
  }

  /// Allow only the account itself.
  pub fn require_self(&self, account_id: Uuid) -> Result<(), ApiError> {
    if self.account_id != account_id {
      return Err(ApiError::Forbidden(format!(
        "not permitted to act on account {account_id}"
      )));
    }
    Ok(())
  }

  /// Allow the account itself or any admin.
  pub fn require_self_or_admin(&self, account_id: Uuid) -> Result<(), ApiError> {
    if self.is_admin() {
      return Ok(());
    }
    self.require_self(account_id)
  }
}

/// The credentials of an `Authorization: Bearer <token>` header. The scheme
/// name is matched case-insensitively.
fn bearer_token(parts: &Parts) -> Option<&str> {
  let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let (scheme, token) = value.trim_start().split_once(' ')?;
  if !scheme.eq_ignore_ascii_case("bearer") {
    return None;
  }
  Some(token.trim()).filter(|t| !t.is_empty())
}

impl<S> FromRequestParts<ApiState<S>> for Caller
where
  S: Store + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(parts)
      .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))?;
    let claims = state
      .tokens
      .verify(token)
      .ok_or_else(|| ApiError::Unauthorized("invalid or expired token".into()))?;

    let account = match state.identity.get_account(claims.sub).await {
      Ok(account) => account,
      Err(Error::AccountNotFound(_)) => {
        return Err(ApiError::Unauthorized("account no longer exists".into()));
      }
      Err(e) => return Err(e.into()),
    };

    Ok(Caller {
      account_id:   account.account_id,
      account_type: account.account_type,
    })
  }
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<AuthResult>, ApiError>
where
  S: Store + 'static,
{
  match state.identity.authenticate(&body.email, &body.password).await {
    Ok(auth) => Ok(Json(auth)),
    Err(Error::EmailNotFound(_) | Error::InvalidCredentials) => {
      Err(ApiError::Unauthorized(LOGIN_FAILED.into()))
    }
    Err(e) => Err(e.into()),
  }
}
