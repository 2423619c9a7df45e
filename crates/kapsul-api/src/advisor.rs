//! Advisory handlers.
//!
//! | Method | Path | Role | Notes |
//! |--------|------|------|-------|
//! | `POST` | `/advisor/risk` | admin | Body: [`RiskQuestionnaire`] |
//! | `POST` | `/advisor/chat` | any | Body: [`ChatRequest`] |
//!
//! Messages follow the `language` field of the body.

use axum::{Json, extract::State};
use kapsul_advisor::{Advisor, ChatReply, ChatRequest, RiskAssessment, RiskQuestionnaire};
use kapsul_core::clock::Clock;
use tracing::info;

use crate::{
  AppState, Backend,
  auth::{CurrentUser, RequireAdmin},
  error::ApiError,
};

/// `POST /advisor/risk`
pub async fn risk<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  RequireAdmin(admin): RequireAdmin,
  Json(questionnaire): Json<RiskQuestionnaire>,
) -> Result<Json<RiskAssessment>, ApiError>
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  let lang = questionnaire.language;
  info!(by = %admin.email, industry = %questionnaire.industry_type, "risk assessment requested");
  let assessment = state
    .advisor
    .assess_risk(questionnaire)
    .await
    .map_err(|e| ApiError::advisor(e, lang))?;
  Ok(Json(assessment))
}

/// `POST /advisor/chat`
pub async fn chat<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  _user: CurrentUser,
  Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError>
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  let lang = request.language;
  let reply = state.advisor.chat(request).await.map_err(|e| ApiError::advisor(e, lang))?;
  Ok(Json(reply))
}
