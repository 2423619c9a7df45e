//! CSV import and export handlers.
//!
//! | Method | Path | Role | Notes |
//! |--------|------|------|-------|
//! | `GET`  | `/export` | any | `?lang=`; CSV attachment |
//! | `GET`  | `/import/template` | admin | `?lang=`; CSV attachment |
//! | `POST` | `/import/preview` | admin | Body: raw CSV; per-row validation |
//! | `POST` | `/import` | admin | Body: raw CSV; inserts the valid rows |

use axum::{
  Json,
  extract::{Query, State},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use bytes::Bytes;
use kapsul_advisor::Advisor;
use kapsul_core::{clock::Clock, extinguisher::ExtinguisherType, locale::Language};
use kapsul_csv::{ExportFile, ImportPreview, ImportRow};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
  AppState, Backend, LangParams,
  auth::{CurrentUser, RequireAdmin},
  error::ApiError,
};

fn attachment(file: ExportFile) -> Response {
  (
    [
      (header::CONTENT_TYPE, ExportFile::CONTENT_TYPE.to_owned()),
      (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file.filename)),
    ],
    file.bytes,
  )
    .into_response()
}

// ─── Export ───────────────────────────────────────────────────────────────────

/// `GET /export[?lang=fa|en]`
pub async fn export<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  _user: CurrentUser,
  Query(lang): Query<LangParams>,
) -> Result<Response, ApiError>
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  let lang = lang.resolve(&state.config);
  let file = kapsul_csv::export_all(&state.repo, lang)
    .await
    .map_err(|e| ApiError::csv(e, lang))?;
  Ok(attachment(file))
}

/// `GET /import/template[?lang=fa|en]`
pub async fn template<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  _admin: RequireAdmin,
  Query(lang): Query<LangParams>,
) -> Result<Response, ApiError>
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  let lang = lang.resolve(&state.config);
  let file = kapsul_csv::import_template(lang).map_err(|e| ApiError::csv(e, lang))?;
  Ok(attachment(file))
}

// ─── Import ───────────────────────────────────────────────────────────────────

/// One row of the preview table, with localized error messages.
#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewRow {
  pub line:               u64,
  pub location:           String,
  pub last_recharge_date: String,
  #[serde(rename = "type")]
  pub kind:               ExtinguisherType,
  pub valid:              bool,
  pub errors:             Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewView {
  pub rows:          Vec<PreviewRow>,
  pub valid_count:   usize,
  pub invalid_count: usize,
}

impl PreviewView {
  fn new(preview: ImportPreview, lang: Language) -> Self {
    let valid_count = preview.valid_count();
    let invalid_count = preview.invalid_count();
    let rows = preview
      .rows
      .into_iter()
      .map(|row: ImportRow| PreviewRow {
        valid: row.is_valid(),
        errors: row.errors.iter().map(|e| e.message(lang).to_owned()).collect(),
        line: row.line,
        location: row.location,
        last_recharge_date: row.last_recharge_date,
        kind: row.kind,
      })
      .collect();
    Self { rows, valid_count, invalid_count }
  }
}

/// `POST /import/preview`
pub async fn preview<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  _admin: RequireAdmin,
  Query(lang): Query<LangParams>,
  body: Bytes,
) -> Result<Json<PreviewView>, ApiError>
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  let lang = lang.resolve(&state.config);
  let preview = kapsul_csv::parse_import(&body).map_err(|e| ApiError::csv(e, lang))?;
  Ok(Json(PreviewView::new(preview, lang)))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportSummary {
  pub imported: usize,
  /// Invalid rows left out.
  pub skipped:  usize,
}

/// `POST /import`. Refused when no row is valid.
pub async fn import<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  RequireAdmin(admin): RequireAdmin,
  Query(lang): Query<LangParams>,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  let lang = lang.resolve(&state.config);
  let preview = kapsul_csv::parse_import(&body).map_err(|e| ApiError::csv(e, lang))?;
  let skipped = preview.invalid_count();
  let candidates = preview.into_candidates().map_err(|e| ApiError::csv(e, lang))?;

  let imported = state
    .repo
    .import_batch(candidates)
    .await
    .map_err(|e| ApiError::core(e, lang))?;
  info!(imported, skipped, by = %admin.email, "import completed");

  Ok((StatusCode::CREATED, Json(ImportSummary { imported, skipped })))
}
