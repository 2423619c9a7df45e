//! Error type for the advisory client.

use kapsul_core::locale::Language;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// No API key was configured; no request was made.
  #[error("advisory service is not configured")]
  NotConfigured,

  #[error("invalid advisory request: {0}")]
  InvalidRequest(String),

  /// Upstream answered 429.
  #[error("advisory service rate limit exceeded")]
  RateLimited,

  /// Upstream answered 402.
  #[error("advisory service requires payment")]
  PaymentRequired,

  #[error("advisory service error ({status}): {body}")]
  Upstream { status: u16, body: String },

  /// The HTTP request itself failed (network, DNS, TLS, timeout).
  #[error("advisory request failed: {0}")]
  Request(#[from] reqwest::Error),

  /// The response did not have the expected shape.
  #[error("could not decode advisory response: {0}")]
  Decode(String),
}

impl Error {
  /// Text shown to the user.
  pub fn message(&self, lang: Language) -> String {
    let text = match self {
      Self::RateLimited => lang.pick(
        "محدودیت تعداد درخواست. لطفاً کمی صبر کنید.",
        "Rate limit exceeded. Please try again later.",
      ),
      Self::PaymentRequired => lang.pick(
        "نیاز به شارژ اعتبار. لطفاً به تنظیمات مراجعه کنید.",
        "Payment required. Please add credits to your workspace.",
      ),
      Self::NotConfigured => lang.pick(
        "سرویس هوش مصنوعی پیکربندی نشده است",
        "AI service is not configured",
      ),
      Self::InvalidRequest(detail) => return detail.clone(),
      Self::Upstream { .. } | Self::Request(_) | Self::Decode(_) => {
        lang.pick("خطا در سرویس هوش مصنوعی", "AI service error")
      }
    };
    text.to_owned()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
