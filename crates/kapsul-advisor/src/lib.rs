//! Fire-safety advisory for Kapsul.
//!
//! Two operations sit behind the [`Advisor`] trait: a structured risk
//! assessment from a site questionnaire, and a free-form expert chat. The
//! production implementation, [`GatewayAdvisor`], forwards both to an
//! OpenAI-compatible chat-completions endpoint with localized system prompts.

#![allow(async_fn_in_trait)]

pub mod error;
pub mod gateway;
mod prompt;
pub mod types;

use std::future::Future;

pub use error::{Error, Result};
pub use gateway::{AdvisorConfig, GatewayAdvisor};
pub use types::{
  ChatMessage, ChatReply, ChatRequest, ChatRole, Recommendation, RiskAssessment, RiskLevel,
  RiskQuestionnaire,
};

/// Source of fire-safety advice.
pub trait Advisor: Send + Sync {
  /// Rate a site and recommend equipment.
  fn assess_risk(
    &self,
    questionnaire: RiskQuestionnaire,
  ) -> impl Future<Output = Result<RiskAssessment>> + Send + '_;

  /// Answer the latest user turn of a conversation.
  fn chat(&self, request: ChatRequest) -> impl Future<Output = Result<ChatReply>> + Send + '_;
}
