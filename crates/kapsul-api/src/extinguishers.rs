//! Handlers for `/extinguishers` and `/dashboard`.
//!
//! | Method | Path | Role | Notes |
//! |--------|------|------|-------|
//! | `GET`    | `/extinguishers` | any | Optional `?search=&status=` |
//! | `GET`    | `/extinguishers/next-code` | any | `{"code":"FE-004"}` |
//! | `GET`    | `/extinguishers/main-areas` | any | `{"areas":[...]}` preset main areas |
//! | `GET`    | `/extinguishers/:id` | any | 404 if not found |
//! | `POST`   | `/extinguishers` | admin | Body: [`RecordForm`]; 201 + record |
//! | `PUT`    | `/extinguishers/:id` | admin | Body: [`RecordForm`], validated as an edit |
//! | `PATCH`  | `/extinguishers/:id` | admin | Body: [`ExtinguisherPatch`] |
//! | `DELETE` | `/extinguishers/:id` | admin | 204 |
//! | `GET`    | `/dashboard` | any | Status counts and today's date |
//!
//! Every route accepts `?lang=fa|en` for error messages.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use kapsul_advisor::Advisor;
use kapsul_core::{
  clock::Clock,
  extinguisher::{Extinguisher, ExtinguisherPatch},
  form::{MAIN_AREAS, RecordForm},
  status::Status,
  views::{DashboardSummary, RecordFilter},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState, Backend, LangParams,
  auth::{CurrentUser, RequireAdmin},
  error::ApiError,
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub search: Option<String>,
  pub status: Option<Status>,
}

/// `GET /extinguishers[?search=<text>][&status=<status>]`
pub async fn list<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  _user: CurrentUser,
  Query(params): Query<ListParams>,
) -> Json<Vec<Extinguisher>>
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  let filter = RecordFilter { search: params.search, status: params.status };
  let records = state.repo.snapshot().await;
  Json(filter.apply(&records).into_iter().cloned().collect())
}

// ─── Next code ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct NextCode {
  pub code: String,
}

/// `GET /extinguishers/next-code`
pub async fn next_code<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  _user: CurrentUser,
) -> Json<NextCode>
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  Json(NextCode { code: state.repo.generate_code().await })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MainAreas {
  pub areas: Vec<String>,
}

/// `GET /extinguishers/main-areas`
pub async fn main_areas(_user: CurrentUser) -> Json<MainAreas> {
  Json(MainAreas { areas: MAIN_AREAS.iter().map(|a| (*a).to_owned()).collect() })
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /extinguishers/:id`
pub async fn get_one<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
  Query(lang): Query<LangParams>,
) -> Result<Json<Extinguisher>, ApiError>
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  let lang = lang.resolve(&state.config);
  let record = state.repo.get(id).await.map_err(|e| ApiError::core(e, lang))?;
  Ok(Json(record))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /extinguishers`. A blank code is generated.
pub async fn create<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  _admin: RequireAdmin,
  Query(lang): Query<LangParams>,
  Json(form): Json<RecordForm>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  let lang = lang.resolve(&state.config);
  let existing = state.repo.existing_codes().await;
  let record = form
    .validate(&existing, false)
    .map_err(|e| ApiError::core(e.into(), lang))?;
  let created = state.repo.add(record).await.map_err(|e| ApiError::core(e, lang))?;
  Ok((StatusCode::CREATED, Json(created)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /extinguishers/:id`: the full edit form.
pub async fn replace<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  _admin: RequireAdmin,
  Path(id): Path<Uuid>,
  Query(lang): Query<LangParams>,
  Json(form): Json<RecordForm>,
) -> Result<Json<Extinguisher>, ApiError>
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  let lang = lang.resolve(&state.config);
  let record = form.validate(&[], true).map_err(|e| ApiError::core(e.into(), lang))?;
  let updated = state
    .repo
    .update(id, record.into_patch())
    .await
    .map_err(|e| ApiError::core(e, lang))?;
  Ok(Json(updated))
}

/// `PATCH /extinguishers/:id`: only the given fields change.
pub async fn patch<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  _admin: RequireAdmin,
  Path(id): Path<Uuid>,
  Query(lang): Query<LangParams>,
  Json(patch): Json<ExtinguisherPatch>,
) -> Result<Json<Extinguisher>, ApiError>
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  let lang = lang.resolve(&state.config);
  let patch = patch.validated().map_err(|e| ApiError::core(e.into(), lang))?;
  let updated = state.repo.update(id, patch).await.map_err(|e| ApiError::core(e, lang))?;
  Ok(Json(updated))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /extinguishers/:id`
pub async fn delete<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  _admin: RequireAdmin,
  Path(id): Path<Uuid>,
  Query(lang): Query<LangParams>,
) -> Result<StatusCode, ApiError>
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  let lang = lang.resolve(&state.config);
  state.repo.remove(id).await.map_err(|e| ApiError::core(e, lang))?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Dashboard ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardView {
  #[serde(flatten)]
  pub summary:   DashboardSummary,
  pub attention: usize,
  /// Today on the Persian calendar, `YYYY/MM/DD`.
  pub today:     String,
}

/// `GET /dashboard`
pub async fn dashboard<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  _user: CurrentUser,
) -> Json<DashboardView>
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  let summary = DashboardSummary::from_records(&state.repo.snapshot().await);
  let today = state.repo.clock().now().date_string();
  Json(DashboardView { attention: summary.attention(), summary, today })
}
