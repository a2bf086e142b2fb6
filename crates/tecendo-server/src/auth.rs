//! Concrete credential collaborators: Argon2id password hashing and
//! HMAC-SHA256 signed bearer tokens.

use argon2::{
  Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier, password_hash::SaltString,
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tecendo_core::{
  Error as CoreError,
  account::AccountType,
  auth::{Claims, PasswordHasher, TokenIssuer},
};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum AuthError {
  #[error("password hashing failed: {0}")]
  Hash(String),

  #[error("token secret must be at least {MIN_SECRET_LEN} bytes")]
  WeakSecret,

  #[error("token encoding failed: {0}")]
  Encode(#[from] serde_json::Error),

  #[error("invalid signing key: {0}")]
  Key(String),
}

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Argon2id with the crate's default parameters; hashes are PHC strings
/// (`$argon2id$v=19$…`).
#[derive(Default)]
pub struct Argon2Hasher {
  argon2: Argon2<'static>,
}

impl PasswordHasher for Argon2Hasher {
  fn hash(&self, plain: &str) -> tecendo_core::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = self
      .argon2
      .hash_password(plain.as_bytes(), &salt)
      .map_err(|e| CoreError::storage(AuthError::Hash(e.to_string())))?;
    Ok(hash.to_string())
  }

  fn verify(&self, plain: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
      return false;
    };
    self
      .argon2
      .verify_password(plain.as_bytes(), &parsed)
      .is_ok()
  }
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct Header<'a> {
  alg: &'a str,
  typ: &'a str,
}

const HEADER: Header<'static> = Header { alg: "HS256", typ: "JWT" };

/// Issues compact `header.payload.signature` tokens, each segment base64url
/// without padding, signed with HMAC-SHA256.
pub struct HmacTokenIssuer {
  secret: Vec<u8>,
  ttl:    Duration,
}

impl HmacTokenIssuer {
  pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Result<Self, AuthError> {
    let secret = secret.into();
    if secret.len() < MIN_SECRET_LEN {
      return Err(AuthError::WeakSecret);
    }
    Ok(Self { secret, ttl })
  }

  fn mac(&self) -> Result<HmacSha256, AuthError> {
    HmacSha256::new_from_slice(&self.secret).map_err(|e| AuthError::Key(e.to_string()))
  }

  fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
    let header = B64.encode(serde_json::to_vec(&HEADER)?);
    let payload = B64.encode(serde_json::to_vec(claims)?);
    let signing_input = format!("{header}.{payload}");

    let mut mac = self.mac()?;
    mac.update(signing_input.as_bytes());
    let signature = B64.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature}"))
  }
}

impl TokenIssuer for HmacTokenIssuer {
  fn issue(&self, subject_id: Uuid, role: AccountType, email: &str) -> tecendo_core::Result<String> {
    let iat = Utc::now();
    let claims = Claims {
      sub: subject_id,
      role,
      email: email.to_owned(),
      iat,
      exp: iat + self.ttl,
    };
    self.sign(&claims).map_err(CoreError::storage)
  }

  fn verify(&self, token: &str) -> Option<Claims> {
    let (signing_input, signature) = token.rsplit_once('.')?;
    let (header, payload) = signing_input.split_once('.')?;

    let header_json = B64.decode(header).ok()?;
    let header: Header<'_> = serde_json::from_slice(&header_json).ok()?;
    if header.alg != HEADER.alg {
      return None;
    }

    let mut mac = self.mac().ok()?;
    mac.update(signing_input.as_bytes());
    mac.verify_slice(&B64.decode(signature).ok()?).ok()?;

    let claims: Claims = serde_json::from_slice(&B64.decode(payload).ok()?).ok()?;
    (claims.exp > Utc::now()).then_some(claims)
  }
}
