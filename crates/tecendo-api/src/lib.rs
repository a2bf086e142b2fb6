//! JSON REST API for Tecendo Arte.
//!
//! Exposes an axum [`Router`] over the identity manager and the moderation
//! engine, backed by any [`tecendo_core::store::Store`]. Callers are
//! identified by bearer tokens; TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tecendo_api::api_router(state))
//! ```

pub mod accounts;
pub mod error;
pub mod reports;
pub mod session;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use tecendo_core::{
  auth::TokenIssuer, identity::AccountIdentityManager, moderation::ReportModerationEngine,
  store::Store,
};

pub use error::ApiError;
pub use session::Caller;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub identity:   Arc<AccountIdentityManager<S>>,
  pub moderation: Arc<ReportModerationEngine<S>>,
  pub tokens:     Arc<dyn TokenIssuer>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      identity:   self.identity.clone(),
      moderation: self.moderation.clone(),
      tokens:     self.tokens.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: Store + 'static,
{
  Router::new()
    // Accounts
    .route("/accounts", post(accounts::register::<S>))
    .route(
      "/accounts/{id}",
      get(accounts::get_one::<S>)
        .patch(accounts::update::<S>)
        .delete(accounts::delete::<S>),
    )
    .route("/accounts/{id}/type", put(accounts::change_type::<S>))
    .route(
      "/accounts/{id}/profile",
      get(accounts::get_profile::<S>).put(accounts::update_profile::<S>),
    )
    .route("/accounts/{id}/projects", post(accounts::add_project::<S>))
    .route("/artists", get(accounts::artists::<S>))
    // Session
    .route("/auth/login", post(session::login::<S>))
    // Reports
    .route("/reports", post(reports::file::<S>))
    .route("/admin/reports", get(reports::list::<S>))
    .route("/admin/reports/{id}", get(reports::get_one::<S>))
    .route("/admin/reports/{id}/analysis", post(reports::analyse::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use chrono::{Duration, Utc};
  use serde_json::{Value, json};
  use tecendo_core::{
    account::AccountType,
    auth::{Claims, PasswordHasher},
    profile::{Category, ProfileUpdate},
  };
  use tecendo_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;
  use uuid::Uuid;

  struct PlainHasher;

  impl PasswordHasher for PlainHasher {
    fn hash(&self, plain: &str) -> tecendo_core::Result<String> { Ok(format!("plain${plain}")) }

    fn verify(&self, plain: &str, hash: &str) -> bool {
      hash.strip_prefix("plain$") == Some(plain)
    }
  }

  /// Tokens are `tok-<account id>`; the role is always re-read from the store.
  struct PlainTokens;

  impl TokenIssuer for PlainTokens {
    fn issue(&self, subject_id: Uuid, _: AccountType, _: &str) -> tecendo_core::Result<String> {
      Ok(format!("tok-{subject_id}"))
    }

    fn verify(&self, token: &str) -> Option<Claims> {
      let sub = token.strip_prefix("tok-")?.parse().ok()?;
      let now = Utc::now();
      Some(Claims {
        sub,
        role: AccountType::Donor,
        email: String::new(),
        iat: now,
        exp: now + Duration::hours(1),
      })
    }
  }

  async fn make_state() -> ApiState<SqliteStore> {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let tokens: Arc<dyn TokenIssuer> = Arc::new(PlainTokens);
    let identity =
      AccountIdentityManager::new(store.clone(), Arc::new(PlainHasher), tokens.clone()).unwrap();

    ApiState {
      identity: Arc::new(identity),
      moderation: Arc::new(ReportModerationEngine::new(store)),
      tokens,
    }
  }

  async fn send(
    state: &ApiState<SqliteStore>,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    api_router(state.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  /// Register through the API and log in; returns `(account id, token)`.
  async fn sign_up(state: &ApiState<SqliteStore>, email: &str, kind: &str) -> (Uuid, String) {
    let resp = send(
      state,
      "POST",
      "/accounts",
      None,
      Some(json!({
        "email": email,
        "display_name": "Test User",
        "password": "hunter2",
        "account_type": kind,
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let login = send(
      state,
      "POST",
      "/auth/login",
      None,
      Some(json!({ "email": email, "password": "hunter2" })),
    )
    .await;
    assert_eq!(login.status(), StatusCode::OK);
    let auth = json_body(login).await;
    let id = auth["account_id"].as_str().unwrap().parse().unwrap();
    (id, auth["token"].as_str().unwrap().to_owned())
  }

  async fn admin(state: &ApiState<SqliteStore>) -> (Uuid, String) {
    let id = state
      .identity
      .register_prehashed(
        "root@example.com",
        "Root",
        PlainHasher.hash("hunter2").unwrap(),
        AccountType::Admin,
      )
      .await
      .unwrap();
    (id, format!("tok-{id}"))
  }

  // ── Accounts ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn register_hides_password_hash() {
    let state = make_state().await;
    let (id, _) = sign_up(&state, "ana@example.com", "creator").await;

    let resp = send(&state, "GET", &format!("/accounts/{id}"), None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let account = json_body(resp).await;
    assert_eq!(account["account_type"], "creator");
    assert!(account.get("password_hash").is_none());
  }

  #[tokio::test]
  async fn register_duplicate_email_is_409() {
    let state = make_state().await;
    sign_up(&state, "ana@example.com", "donor").await;

    let resp = send(
      &state,
      "POST",
      "/accounts",
      None,
      Some(json!({
        "email": "ANA@example.com",
        "display_name": "Other",
        "password": "pw",
        "account_type": "donor",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(json_body(resp).await["error"].is_string());
  }

  #[tokio::test]
  async fn self_registration_as_admin_is_forbidden() {
    let state = make_state().await;
    let resp = send(
      &state,
      "POST",
      "/accounts",
      None,
      Some(json!({
        "email": "sneaky@example.com",
        "display_name": "Sneaky",
        "password": "pw",
        "account_type": "admin",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn login_failures_share_one_message() {
    let state = make_state().await;
    sign_up(&state, "ana@example.com", "donor").await;

    let wrong = send(
      &state,
      "POST",
      "/auth/login",
      None,
      Some(json!({ "email": "ana@example.com", "password": "nope" })),
    )
    .await;
    let unknown = send(
      &state,
      "POST",
      "/auth/login",
      None,
      Some(json!({ "email": "ghost@example.com", "password": "nope" })),
    )
    .await;

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(wrong).await, json_body(unknown).await);
  }

  #[tokio::test]
  async fn change_type_swaps_profile_variant() {
    let state = make_state().await;
    let (id, token) = sign_up(&state, "ana@example.com", "donor").await;

    let resp = send(
      &state,
      "PUT",
      &format!("/accounts/{id}/type"),
      Some(&token),
      Some(json!({ "account_type": "creator" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["account_type"], "creator");

    let profile = send(&state, "GET", &format!("/accounts/{id}/profile"), None, None).await;
    assert_eq!(json_body(profile).await["kind"], "creator");
  }

  #[tokio::test]
  async fn self_promotion_to_admin_is_forbidden() {
    let state = make_state().await;
    let (id, token) = sign_up(&state, "ana@example.com", "donor").await;

    let resp = send(
      &state,
      "PUT",
      &format!("/accounts/{id}/type"),
      Some(&token),
      Some(json!({ "account_type": "admin" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn acting_on_another_account_is_forbidden() {
    let state = make_state().await;
    let (ana, _) = sign_up(&state, "ana@example.com", "donor").await;
    let (_, bia_token) = sign_up(&state, "bia@example.com", "donor").await;

    let resp = send(&state, "DELETE", &format!("/accounts/{ana}"), Some(&bia_token), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let (_, admin_token) = admin(&state).await;
    let resp = send(&state, "DELETE", &format!("/accounts/{ana}"), Some(&admin_token), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&state, "GET", &format!("/accounts/{ana}"), None, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn token_of_deleted_account_is_rejected() {
    let state = make_state().await;
    let (id, token) = sign_up(&state, "ana@example.com", "donor").await;

    let resp = send(&state, "DELETE", &format!("/accounts/{id}"), Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(
      &state,
      "POST",
      "/reports",
      Some(&token),
      Some(json!({ "reported_kind": "project", "target_id": "1", "description": "spam" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn creator_profile_and_projects() {
    let state = make_state().await;
    let (id, token) = sign_up(&state, "ana@example.com", "creator").await;

    let resp = send(
      &state,
      "PUT",
      &format!("/accounts/{id}/profile"),
      Some(&token),
      Some(json!({ "kind": "creator", "bio": "Weaver", "categories": ["drawing"] })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(
      &state,
      "POST",
      &format!("/accounts/{id}/projects"),
      Some(&token),
      Some(json!({
        "title": "Tapestry",
        "description": "Wool on a backstrap loom",
        "category": "drawing",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = send(
      &state,
      "POST",
      &format!("/accounts/{id}/projects"),
      Some(&token),
      Some(json!({ "title": "Tapestry" })),
    )
    .await;
    assert!(resp.status().is_client_error());

    let profile = json_body(send(&state, "GET", &format!("/accounts/{id}/profile"), None, None).await).await;
    assert_eq!(profile["bio"], "Weaver");
    assert_eq!(profile["categories"], json!(["drawing"]));
    assert_eq!(profile["projects"].as_array().unwrap().len(), 1);
    assert_eq!(profile["projects"][0]["title"], "Tapestry");
    assert_eq!(profile["projects"][0]["category"], "drawing");

    let artists = json_body(send(&state, "GET", "/artists", None, None).await).await;
    assert_eq!(artists.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn artists_carry_bio_and_categories_and_filter() {
    let state = make_state().await;
    for (email, name, bio, categories) in [
      ("ana@example.com", "Ana Weaver", "Looms", vec![Category::Drawing]),
      ("bia@example.com", "Bia Lens", "Street photos", vec![Category::Photography]),
    ] {
      let id = state
        .identity
        .register(email, name, "pw", AccountType::Creator)
        .await
        .unwrap();
      state
        .identity
        .update_profile(
          id,
          ProfileUpdate::Creator {
            bio:        bio.into(),
            categories: categories.into_iter().collect(),
          },
        )
        .await
        .unwrap();
    }
    sign_up(&state, "donor@example.com", "donor").await;

    let all = json_body(send(&state, "GET", "/artists", None, None).await).await;
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["display_name"], "Ana Weaver");
    assert_eq!(all[0]["bio"], "Looms");
    assert_eq!(all[0]["categories"], json!(["drawing"]));
    assert!(all[0].get("password_hash").is_none());

    let by_category =
      json_body(send(&state, "GET", "/artists?category=photography", None, None).await).await;
    assert_eq!(by_category.as_array().unwrap().len(), 1);
    assert_eq!(by_category[0]["display_name"], "Bia Lens");

    let by_name = json_body(send(&state, "GET", "/artists?name=weaver", None, None).await).await;
    assert_eq!(by_name.as_array().unwrap().len(), 1);
    assert_eq!(by_name[0]["display_name"], "Ana Weaver");

    let resp = send(&state, "GET", "/artists?category=opera", None, None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn bearer_scheme_is_case_insensitive() {
    let state = make_state().await;
    let (_, token) = admin(&state).await;

    for scheme in ["bearer", "BEARER", "Bearer"] {
      let req = Request::builder()
        .uri("/admin/reports")
        .header(header::AUTHORIZATION, format!("{scheme} {token}"))
        .body(Body::empty())
        .unwrap();
      let resp = api_router(state.clone()).oneshot(req).await.unwrap();
      assert_eq!(resp.status(), StatusCode::OK, "scheme {scheme}");
    }

    let req = Request::builder()
      .uri("/admin/reports")
      .header(header::AUTHORIZATION, format!("Basic {token}"))
      .body(Body::empty())
      .unwrap();
    let resp = api_router(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn admin_profile_is_404() {
    let state = make_state().await;
    let (id, _) = admin(&state).await;
    let resp = send(&state, "GET", &format!("/accounts/{id}/profile"), None, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn report_lifecycle() {
    let state = make_state().await;
    let (author, token) = sign_up(&state, "ana@example.com", "donor").await;
    let (_, admin_token) = admin(&state).await;

    let resp = send(
      &state,
      "POST",
      "/reports",
      Some(&token),
      Some(json!({
        "reported_kind": "project",
        "target_id": "42",
        "description": "inappropriate content",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let report = json_body(resp).await;
    assert_eq!(report["status"], "pending");
    assert_eq!(report["author_account_id"], author.to_string());
    let report_id = report["report_id"].as_str().unwrap().to_owned();

    let pending = json_body(
      send(&state, "GET", "/admin/reports?status=pending", Some(&admin_token), None).await,
    )
    .await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["author_name"], "Test User");

    let uri = format!("/admin/reports/{report_id}/analysis");
    let resp = send(
      &state,
      "POST",
      &uri,
      Some(&admin_token),
      Some(json!({ "outcome": "upheld" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["status"], "upheld");

    let resp = send(
      &state,
      "POST",
      &uri,
      Some(&admin_token),
      Some(json!({ "outcome": "dismissed" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let stored = json_body(
      send(&state, "GET", &format!("/admin/reports/{report_id}"), Some(&admin_token), None).await,
    )
    .await;
    assert_eq!(stored["status"], "upheld");
  }

  #[tokio::test]
  async fn report_of_deleted_author_is_anonymous() {
    let state = make_state().await;
    let (author, token) = sign_up(&state, "ana@example.com", "donor").await;
    let (_, admin_token) = admin(&state).await;

    send(
      &state,
      "POST",
      "/reports",
      Some(&token),
      Some(json!({ "reported_kind": "user", "target_id": "x", "description": "rude" })),
    )
    .await;
    state.identity.delete_account(author).await.unwrap();

    let all = json_body(send(&state, "GET", "/admin/reports", Some(&admin_token), None).await).await;
    assert_eq!(all[0]["author_name"], Value::Null);
    assert_eq!(all[0]["author_account_id"], author.to_string());
  }

  #[tokio::test]
  async fn moderation_requires_admin() {
    let state = make_state().await;
    let (_, token) = sign_up(&state, "ana@example.com", "donor").await;

    let resp = send(&state, "GET", "/admin/reports", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(&state, "GET", "/admin/reports", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = send(&state, "GET", "/admin/reports", Some("garbage"), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn resolve_unknown_report_is_404() {
    let state = make_state().await;
    let (_, admin_token) = admin(&state).await;
    let resp = send(
      &state,
      "POST",
      &format!("/admin/reports/{}/analysis", Uuid::new_v4()),
      Some(&admin_token),
      Some(json!({ "outcome": "dismissed" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
