//! Async HTTP client wrapping the Kapsul JSON API.

use anyhow::{Context, Result, anyhow};
use kapsul_core::{extinguisher::Extinguisher, locale::Language, views::DashboardSummary};
use reqwest::{Client, Response, header};
use serde::Deserialize;
use std::time::Duration;

/// Connection settings for the Kapsul API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub email:    String,
  pub password: String,
}

/// `GET /api/dashboard` reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dashboard {
  #[serde(flatten)]
  pub summary:   DashboardSummary,
  pub attention: usize,
  pub today:     String,
}

/// A downloaded export.
#[derive(Debug, Clone)]
pub struct Download {
  pub filename: String,
  pub bytes:    Vec<u8>,
}

#[derive(Deserialize)]
struct SessionReply {
  token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

/// Async HTTP client for the Kapsul REST API. Holds the session token after
/// [`sign_in`](Self::sign_in).
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
  token:  Option<String>,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config, token: None })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  /// Turn a non-2xx response into an error carrying the server's message.
  async fn check(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let message = resp
      .json::<ErrorBody>()
      .await
      .map(|b| b.error)
      .unwrap_or_else(|_| status.to_string());
    Err(anyhow!("{what} → {status}: {message}"))
  }

  // ── Session ───────────────────────────────────────────────────────────────

  /// `POST /api/auth/sign-in`
  pub async fn sign_in(&mut self) -> Result<()> {
    let resp = self
      .client
      .post(self.url("/auth/sign-in"))
      .json(&serde_json::json!({
        "email": self.config.email,
        "password": self.config.password,
      }))
      .send()
      .await
      .context("POST /auth/sign-in failed")?;
    let reply: SessionReply =
      Self::check(resp, "sign in").await?.json().await.context("deserialising session")?;
    self.token = Some(reply.token);
    Ok(())
  }

  // ── Records ───────────────────────────────────────────────────────────────

  /// `GET /api/extinguishers`
  pub async fn list_extinguishers(&self) -> Result<Vec<Extinguisher>> {
    let resp = self
      .auth(self.client.get(self.url("/extinguishers")))
      .send()
      .await
      .context("GET /extinguishers failed")?;
    Self::check(resp, "GET /extinguishers")
      .await?
      .json()
      .await
      .context("deserialising extinguishers")
  }

  /// `GET /api/dashboard`
  pub async fn dashboard(&self) -> Result<Dashboard> {
    let resp = self
      .auth(self.client.get(self.url("/dashboard")))
      .send()
      .await
      .context("GET /dashboard failed")?;
    Self::check(resp, "GET /dashboard").await?.json().await.context("deserialising dashboard")
  }

  /// `GET /api/export?lang=<lang>`
  pub async fn export(&self, lang: Language) -> Result<Download> {
    let resp = self
      .auth(self.client.get(self.url("/export")))
      .query(&[("lang", lang.tag())])
      .send()
      .await
      .context("GET /export failed")?;
    let resp = Self::check(resp, "GET /export").await?;

    let filename = resp
      .headers()
      .get(header::CONTENT_DISPOSITION)
      .and_then(|v| v.to_str().ok())
      .and_then(filename_from_disposition)
      .unwrap_or_else(|| "extinguishers.csv".to_owned());
    let bytes = resp.bytes().await.context("reading export body")?.to_vec();
    Ok(Download { filename, bytes })
  }
}

/// `attachment; filename="x.csv"` → `x.csv`. Path separators are refused.
fn filename_from_disposition(value: &str) -> Option<String> {
  let name = value
    .split(';')
    .map(str::trim)
    .find_map(|part| part.strip_prefix("filename="))?
    .trim_matches('"');
  (!name.is_empty() && !name.contains(['/', '\\'])).then(|| name.to_owned())
}
