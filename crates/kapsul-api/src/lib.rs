//! JSON REST API for Kapsul.
//!
//! Exposes an axum [`Router`] over a [`Repository`], a [`UserStore`] and an
//! [`Advisor`]. Every route except sign-up and sign-in needs a bearer token;
//! writes additionally need the `admin` role. TLS and request tracing are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", kapsul_api::api_router(state))
//! ```

pub mod advisor;
pub mod auth;
pub mod error;
pub mod extinguishers;
pub mod transfer;


use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use kapsul_advisor::Advisor;
use kapsul_core::{
  clock::Clock, identity::UserStore, locale::Language, repository::Repository,
  store::ExtinguisherStore,
};
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Account and localisation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// Addresses granted the `admin` role when they sign up.
  pub admin_emails:      Vec<String>,
  pub session_ttl_hours: i64,
  /// Used for messages when a request names no language.
  pub default_language:  Language,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      admin_emails:      Vec::new(),
      session_ttl_hours: 168,
      default_language:  Language::Fa,
    }
  }
}

impl ApiConfig {
  pub fn is_admin_email(&self, email: &str) -> bool {
    self.admin_emails.iter().any(|e| e.trim().eq_ignore_ascii_case(email))
  }
}

/// `?lang=fa|en`, falling back to [`ApiConfig::default_language`].
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LangParams {
  pub lang: Option<Language>,
}

impl LangParams {
  pub fn resolve(self, config: &ApiConfig) -> Language {
    self.lang.unwrap_or(config.default_language)
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// A storage backend holding both records and accounts.
pub trait Backend: ExtinguisherStore + UserStore + 'static {}

impl<T> Backend for T where T: ExtinguisherStore + UserStore + 'static {}

/// Shared state threaded through all handlers.
pub struct AppState<S, C, A> {
  pub repo:    Arc<Repository<S, C>>,
  pub advisor: Arc<A>,
  pub config:  Arc<ApiConfig>,
}

impl<S, C, A> Clone for AppState<S, C, A> {
  fn clone(&self) -> Self {
    Self {
      repo:    Arc::clone(&self.repo),
      advisor: Arc::clone(&self.advisor),
      config:  Arc::clone(&self.config),
    }
  }
}

impl<S, C, A> AppState<S, C, A>
where
  S: Backend,
  C: Clock,
{
  pub fn users(&self) -> &S { self.repo.store() }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C, A>(state: AppState<S, C, A>) -> Router<()>
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  Router::new()
    // Accounts
    .route("/auth/sign-up", post(auth::sign_up::<S, C, A>))
    .route("/auth/sign-in", post(auth::sign_in::<S, C, A>))
    .route("/auth/sign-out", post(auth::sign_out::<S, C, A>))
    .route("/auth/me", get(auth::me))
    // Records
    .route(
      "/extinguishers",
      get(extinguishers::list::<S, C, A>).post(extinguishers::create::<S, C, A>),
    )
    .route("/extinguishers/next-code", get(extinguishers::next_code::<S, C, A>))
    .route("/extinguishers/main-areas", get(extinguishers::main_areas))
    .route(
      "/extinguishers/{id}",
      get(extinguishers::get_one::<S, C, A>)
        .put(extinguishers::replace::<S, C, A>)
        .patch(extinguishers::patch::<S, C, A>)
        .delete(extinguishers::delete::<S, C, A>),
    )
    .route("/dashboard", get(extinguishers::dashboard::<S, C, A>))
    // Import / export
    .route("/export", get(transfer::export::<S, C, A>))
    .route("/import/template", get(transfer::template::<S, C, A>))
    .route("/import/preview", post(transfer::preview::<S, C, A>))
    .route("/import", post(transfer::import::<S, C, A>))
    // Advisory
    .route("/advisor/risk", post(advisor::risk::<S, C, A>))
    .route("/advisor/chat", post(advisor::chat::<S, C, A>))
    .with_state(state)
}
