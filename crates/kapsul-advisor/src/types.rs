//! Request and response payloads for the two advisory endpoints.

use kapsul_core::locale::Language;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

// ─── Risk assessment ─────────────────────────────────────────────────────────

/// Site description submitted for a fire-risk assessment.
///
/// Sizes and counts are kept as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskQuestionnaire {
  pub industry_type:       String,
  /// Square metres.
  #[serde(deserialize_with = "lenient_string")]
  pub building_size:       String,
  #[serde(deserialize_with = "lenient_string")]
  pub floor_count:         String,
  #[serde(deserialize_with = "lenient_string")]
  pub employee_count:      String,
  pub equipment:           String,
  pub hazardous_materials: String,
  pub existing_equipment:  String,
  pub additional_info:     String,
  pub language:            Language,
}

impl RiskQuestionnaire {
  /// The required fields must be non-blank.
  pub fn validate(&self) -> Result<()> {
    let required = [
      ("industryType", &self.industry_type),
      ("buildingSize", &self.building_size),
      ("floorCount", &self.floor_count),
      ("employeeCount", &self.employee_count),
      ("equipment", &self.equipment),
    ];
    let missing: Vec<_> = required
      .iter()
      .filter(|(_, value)| value.trim().is_empty())
      .map(|(name, _)| *name)
      .collect();

    if missing.is_empty() {
      Ok(())
    } else {
      Err(Error::InvalidRequest(format!("missing fields: {}", missing.join(", "))))
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
  Low,
  Medium,
  High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
  pub equipment: String,
  #[serde(deserialize_with = "lenient_string")]
  pub quantity:  String,
  #[serde(default)]
  pub reason:    String,
  #[serde(default)]
  pub location:  String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
  pub risk_level:       RiskLevel,
  pub summary:          String,
  #[serde(default)]
  pub recommendations:  Vec<Recommendation>,
  #[serde(default)]
  pub additional_notes: String,
}

// ─── Chat ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
  User,
  Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
  pub role:    ChatRole,
  pub content: String,
}

/// The running transcript, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
  pub messages: Vec<ChatMessage>,
  #[serde(default)]
  pub language: Language,
}

impl ChatRequest {
  pub fn validate(&self) -> Result<()> {
    match self.messages.last() {
      None => Err(Error::InvalidRequest("messages must not be empty".into())),
      Some(last) if last.role != ChatRole::User => {
        Err(Error::InvalidRequest("the last message must come from the user".into()))
      }
      Some(_) => Ok(()),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
  pub response: String,
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Accept a JSON string or number (models and forms send either).
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
  }

  Ok(match StringOrNumber::deserialize(deserializer)? {
    StringOrNumber::String(s) => s,
    StringOrNumber::Number(n) => n.to_string(),
  })
}
