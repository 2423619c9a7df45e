//! Accounts, bearer sessions, and the role extractors.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/sign-up` | Body: `{"email","password","full_name"}`; 201 + session |
//! | `POST` | `/auth/sign-in` | Body: `{"email","password"}`; session |
//! | `POST` | `/auth/sign-out` | 204; the token stops working |
//! | `GET`  | `/auth/me` | The signed-in user |
//!
//! Tokens are 32 random bytes, hex-encoded. Only their SHA-256 is stored.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  Json,
  extract::{FromRequestParts, Query, State},
  http::{HeaderMap, StatusCode, header, request::Parts},
  response::IntoResponse,
};
use chrono::{DateTime, TimeDelta, Utc};
use kapsul_advisor::Advisor;
use kapsul_core::{
  clock::Clock,
  identity::{NewUser, Role, Session, User, UserStore},
  locale::Language,
};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::{ApiConfig, AppState, Backend, LangParams, error::ApiError};

pub const MIN_PASSWORD_LEN: usize = 6;

// ─── Tokens and passwords ─────────────────────────────────────────────────────

/// A fresh bearer token.
pub fn generate_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// The form a token is stored and looked up in.
pub fn hash_token(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

/// Argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Store(e.to_string().into()))
}

pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .is_ok_and(|hash| Argon2::default().verify_password(password.as_bytes(), &hash).is_ok())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

// ─── Extractors ───────────────────────────────────────────────────────────────

/// The user behind a valid, unexpired bearer token.
pub struct CurrentUser {
  pub user:   User,
  token_hash: String,
}

/// A signed-in user with the `admin` role.
pub struct RequireAdmin(pub User);

impl<S, C, A> FromRequestParts<AppState<S, C, A>> for CurrentUser
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, C, A>,
  ) -> Result<Self, Self::Rejection> {
    let lang = state.config.default_language;
    let token = bearer_token(&parts.headers).ok_or_else(|| ApiError::unauthorized(lang))?;
    let token_hash = hash_token(token);
    let users = state.users();

    let session = users
      .find_session(&token_hash)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::unauthorized(lang))?;

    if session.is_expired(Utc::now()) {
      users.delete_session(&token_hash).await.map_err(ApiError::store)?;
      return Err(ApiError::unauthorized(lang));
    }

    let user = users
      .get_user(session.user_id)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::unauthorized(lang))?;

    Ok(CurrentUser { user, token_hash })
  }
}

impl<S, C, A> FromRequestParts<AppState<S, C, A>> for RequireAdmin
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, C, A>,
  ) -> Result<Self, Self::Rejection> {
    let CurrentUser { user, .. } = CurrentUser::from_request_parts(parts, state).await?;
    if !user.role.can_write() {
      warn!(email = %user.email, "write refused for viewer");
      return Err(ApiError::forbidden(state.config.default_language));
    }
    Ok(RequireAdmin(user))
  }
}

// ─── Session reply ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReply {
  pub token:      String,
  pub expires_at: DateTime<Utc>,
  pub user:       User,
}

async fn open_session<S: UserStore>(
  users: &S,
  config: &ApiConfig,
  user: User,
) -> Result<SessionReply, ApiError> {
  let token = generate_token();
  let now = Utc::now();
  let expires_at = now + TimeDelta::hours(config.session_ttl_hours);
  users
    .create_session(Session {
      token_hash: hash_token(&token),
      user_id: user.user_id,
      created_at: now,
      expires_at,
    })
    .await
    .map_err(ApiError::store)?;
  Ok(SessionReply { token, expires_at, user })
}

fn normalise_email(email: &str) -> String { email.trim().to_lowercase() }

// ─── Sign up ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignUpBody {
  pub email:     String,
  pub password:  String,
  #[serde(alias = "fullName", alias = "name")]
  pub full_name: String,
}

impl SignUpBody {
  fn check(&self, lang: Language) -> Result<(), ApiError> {
    let problem = if !self.email.contains('@') {
      Some(lang.pick("ایمیل نامعتبر است", "Invalid email address"))
    } else if self.password.chars().count() < MIN_PASSWORD_LEN {
      Some(lang.pick(
        "رمز عبور باید حداقل ۶ کاراکتر باشد",
        "Password must be at least 6 characters",
      ))
    } else if self.full_name.trim().is_empty() {
      Some(lang.pick("نام ضروری است", "Name is required"))
    } else {
      None
    };
    problem.map_or(Ok(()), |m| Err(ApiError::BadRequest(m.to_owned())))
  }
}

/// `POST /auth/sign-up`
pub async fn sign_up<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  Query(params): Query<LangParams>,
  Json(body): Json<SignUpBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  let lang = params.resolve(&state.config);
  body.check(lang)?;

  let email = normalise_email(&body.email);
  let role = if state.config.is_admin_email(&email) { Role::Admin } else { Role::Viewer };
  let input = NewUser {
    full_name: body.full_name.trim().to_owned(),
    password_hash: hash_password(&body.password)?,
    role,
    email,
  };

  let user = state
    .users()
    .create_user(input)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::Conflict(
        lang.pick("این ایمیل قبلاً ثبت شده است", "This email is already registered").to_owned(),
      )
    })?;
  info!(email = %user.email, role = user.role.as_str(), "account created");

  let reply = open_session(state.users(), &state.config, user).await?;
  Ok((StatusCode::CREATED, Json(reply)))
}

// ─── Sign in ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignInBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/sign-in`
pub async fn sign_in<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  Query(params): Query<LangParams>,
  Json(body): Json<SignInBody>,
) -> Result<Json<SessionReply>, ApiError>
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  let lang = params.resolve(&state.config);
  let rejected = || {
    ApiError::Unauthorized(
      lang.pick("ایمیل یا رمز عبور اشتباه است", "Invalid email or password").to_owned(),
    )
  };

  let email = normalise_email(&body.email);
  let record = state
    .users()
    .find_credentials(&email)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(rejected)?;

  if !verify_password(&body.password, &record.password_hash) {
    warn!(%email, "sign-in rejected");
    return Err(rejected());
  }

  let reply = open_session(state.users(), &state.config, record.user).await?;
  Ok(Json(reply))
}

// ─── Sign out / me ────────────────────────────────────────────────────────────

/// `POST /auth/sign-out`
pub async fn sign_out<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  current: CurrentUser,
) -> Result<StatusCode, ApiError>
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  state.users().delete_session(&current.token_hash).await.map_err(ApiError::store)?;
  info!(email = %current.user.email, "signed out");
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /auth/me`
pub async fn me(current: CurrentUser) -> Json<User> { Json(current.user) }
