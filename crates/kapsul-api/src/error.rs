//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use kapsul_core::{date::DateError, form::ValidationError, locale::Language};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler. Messages are already localized.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("rate limited: {0}")]
  RateLimited(String),

  #[error("payment required: {0}")]
  PaymentRequired(String),

  /// The advisory service has no credentials.
  #[error("service unavailable: {0}")]
  Unavailable(String),

  /// The advisory service failed.
  #[error("bad gateway: {0}")]
  BadGateway(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  pub fn unauthorized(lang: Language) -> Self {
    Self::Unauthorized(lang.pick("ابتدا وارد شوید", "Sign in required").to_owned())
  }

  pub fn forbidden(lang: Language) -> Self {
    Self::Forbidden(
      lang.pick("فقط مدیر سیستم مجاز به این کار است", "Only administrators can do this").to_owned(),
    )
  }

  pub fn core(err: kapsul_core::Error, lang: Language) -> Self {
    use kapsul_core::Error;
    match err {
      Error::Validation(e) => Self::BadRequest(e.message(lang).to_owned()),
      Error::Date(DateError::Malformed(date)) => {
        Self::BadRequest(ValidationError::InvalidDate(date).message(lang).to_owned())
      }
      Error::Date(DateError::OutOfRange(_)) => {
        Self::BadRequest(lang.pick("تاریخ خارج از محدوده است", "Date is out of range").to_owned())
      }
      Error::NotFound(_) => {
        Self::NotFound(lang.pick("کپسول یافت نشد", "Extinguisher not found").to_owned())
      }
      Error::Persistence(e) => Self::Store(e),
    }
  }

  pub fn csv(err: kapsul_csv::Error, lang: Language) -> Self {
    match err {
      kapsul_csv::Error::Parse { .. } | kapsul_csv::Error::NoValidRows => {
        Self::BadRequest(err.message(lang))
      }
      other => Self::store(other),
    }
  }

  pub fn advisor(err: kapsul_advisor::Error, lang: Language) -> Self {
    use kapsul_advisor::Error;
    let message = err.message(lang);
    match err {
      Error::InvalidRequest(_) => Self::BadRequest(message),
      Error::RateLimited => Self::RateLimited(message),
      Error::PaymentRequired => Self::PaymentRequired(message),
      Error::NotConfigured => Self::Unavailable(message),
      Error::Upstream { .. } | Error::Request(_) | Error::Decode(_) => {
        error!(error = %err, "advisory call failed");
        Self::BadGateway(message)
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::RateLimited(m) => (StatusCode::TOO_MANY_REQUESTS, m.clone()),
      ApiError::PaymentRequired(m) => (StatusCode::PAYMENT_REQUIRED, m.clone()),
      ApiError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m.clone()),
      ApiError::BadGateway(m) => (StatusCode::BAD_GATEWAY, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer realm=\"kapsul\""));
    }
    res
  }
}
