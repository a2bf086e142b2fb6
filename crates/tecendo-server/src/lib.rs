//! Tecendo Arte HTTP server.
//!
//! Wires the SQLite store, the Argon2 hasher and the HMAC token issuer into
//! the managers from `tecendo-core`, and serves the `tecendo-api` router
//! under `/api`.

pub mod auth;
pub mod seed;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use chrono::Duration;
use serde::Deserialize;
use tecendo_api::{ApiState, api_router};
use tecendo_core::{
  auth::TokenIssuer, identity::AccountIdentityManager, moderation::ReportModerationEngine,
  store::Store,
};
use tower_http::trace::TraceLayer;

use auth::{Argon2Hasher, HmacTokenIssuer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `TECENDO_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:           String,
  pub port:           u16,
  pub store_path:     PathBuf,
  /// HMAC signing secret for bearer tokens.
  pub token_secret:   String,
  #[serde(default = "default_token_ttl_secs")]
  pub token_ttl_secs: u64,
  #[serde(default)]
  pub seed_admin:     Option<SeedAdmin>,
}

fn default_token_ttl_secs() -> u64 { 3600 }

/// The admin account created on first start.
#[derive(Deserialize, Clone)]
pub struct SeedAdmin {
  pub name:          String,
  pub email:         String,
  /// Argon2 PHC string, as printed by `--hash-password`.
  #[serde(default)]
  pub password_hash: Option<String>,
}

impl ServerConfig {
  pub fn token_ttl(&self) -> anyhow::Result<Duration> {
    let secs = i64::try_from(self.token_ttl_secs).context("token_ttl_secs is too large")?;
    Duration::try_seconds(secs).context("token_ttl_secs is too large")
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Build the managers over `store` as configured.
pub fn app_state<S: Store>(store: Arc<S>, config: &ServerConfig) -> anyhow::Result<ApiState<S>> {
  let tokens: Arc<dyn TokenIssuer> = Arc::new(
    HmacTokenIssuer::new(config.token_secret.as_bytes(), config.token_ttl()?)
      .context("invalid token_secret")?,
  );
  let identity = AccountIdentityManager::new(
    store.clone(),
    Arc::new(Argon2Hasher::default()),
    tokens.clone(),
  )
  .context("failed to initialise identity manager")?;

  Ok(ApiState {
    identity: Arc::new(identity),
    moderation: Arc::new(ReportModerationEngine::new(store)),
    tokens,
  })
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the JSON API under `/api`, with request tracing.
pub fn router<S>(state: ApiState<S>) -> Router
where
  S: Store + 'static,
{
  Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use tecendo_core::auth::PasswordHasher as _;
  use tecendo_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  fn config(seed_hash: Option<String>) -> ServerConfig {
    ServerConfig {
      host:           "127.0.0.1".to_string(),
      port:           8080,
      store_path:     PathBuf::from(":memory:"),
      token_secret:   "0123456789abcdef0123456789abcdef".to_string(),
      token_ttl_secs: 3600,
      seed_admin:     Some(SeedAdmin {
        name:          "Root".to_string(),
        email:         "root@example.com".to_string(),
        password_hash: seed_hash,
      }),
    }
  }

  async fn post(app: &Router, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut builder = Request::builder()
      .method("POST")
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let resp = app
      .clone()
      .oneshot(builder.body(Body::from(body.to_string())).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
  }

  #[test]
  fn config_defaults_ttl_and_seed() {
    let cfg: ServerConfig = serde_json::from_value(json!({
      "host": "0.0.0.0",
      "port": 8080,
      "store_path": "~/tecendo.db",
      "token_secret": "x",
    }))
    .unwrap();
    assert_eq!(cfg.token_ttl_secs, 3600);
    assert!(cfg.seed_admin.is_none());
    assert_eq!(cfg.token_ttl().unwrap(), Duration::hours(1));
  }

  #[tokio::test]
  async fn short_secret_fails_startup() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let mut cfg = config(None);
    cfg.token_secret = "short".into();
    assert!(app_state(store, &cfg).is_err());
  }

  #[tokio::test]
  async fn seeded_admin_resolves_a_report_end_to_end() {
    let password_hash = Argon2Hasher::default().hash("root-pw").unwrap();
    let cfg = config(Some(password_hash));
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let state = app_state(store, &cfg).unwrap();
    let seed_cfg = cfg.seed_admin.as_ref().unwrap();
    seed::seed_admin(&state.identity, seed_cfg).await.unwrap().unwrap();
    let app = router(state);

    let (status, _) = post(
      &app,
      "/api/accounts",
      None,
      json!({
        "email": "ana@example.com",
        "display_name": "Ana",
        "password": "ana-pw",
        "account_type": "donor",
      }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, login) = post(
      &app,
      "/api/auth/login",
      None,
      json!({ "email": "ana@example.com", "password": "ana-pw" }),
    )
    .await;
    let ana_token = login["token"].as_str().unwrap().to_owned();

    let (status, report) = post(
      &app,
      "/api/reports",
      Some(&ana_token),
      json!({ "reported_kind": "artist", "target_id": "7", "description": "plagiarism" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let report_id = report["report_id"].as_str().unwrap().to_owned();

    let (_, login) = post(
      &app,
      "/api/auth/login",
      None,
      json!({ "email": "root@example.com", "password": "root-pw" }),
    )
    .await;
    assert_eq!(login["account_type"], "admin");
    let admin_token = login["token"].as_str().unwrap().to_owned();

    let uri = format!("/api/admin/reports/{report_id}/analysis");
    let (status, _) = post(&app, &uri, Some(&ana_token), json!({ "outcome": "dismissed" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, resolved) =
      post(&app, &uri, Some(&admin_token), json!({ "outcome": "dismissed" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["status"], "dismissed");
    assert_eq!(resolved["author_name"], "Ana");
  }
}
