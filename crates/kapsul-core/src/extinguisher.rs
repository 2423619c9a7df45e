//! The extinguisher record and its write payloads.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{locale::Language, status::Status};

// ─── Type ────────────────────────────────────────────────────────────────────

/// Extinguishing agent. Determines the recharge interval.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ExtinguisherType {
  #[default]
  Powder,
  Co2,
  Foam,
  Water,
}

impl ExtinguisherType {
  pub const ALL: [Self; 4] = [Self::Powder, Self::Co2, Self::Foam, Self::Water];

  /// Months between recharges: five years for CO2, one year otherwise.
  pub fn recharge_interval_months(self) -> u32 {
    match self {
      Self::Co2 => 60,
      Self::Powder | Self::Foam | Self::Water => 12,
    }
  }

  /// The code stored in the database and accepted in import files.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Powder => "powder",
      Self::Co2 => "co2",
      Self::Foam => "foam",
      Self::Water => "water",
    }
  }

  pub fn label(self, lang: Language) -> &'static str {
    match self {
      Self::Powder => lang.pick("پودری", "Powder"),
      Self::Co2 => lang.pick("دی اکسید کربن", "CO2"),
      Self::Foam => lang.pick("فوم", "Foam"),
      Self::Water => lang.pick("آبی", "Water"),
    }
  }

  /// Accept a type code (any case) or a label in either language.
  pub fn parse_lenient(value: &str) -> Option<Self> {
    let value = value.trim();
    Self::ALL.into_iter().find(|kind| {
      kind.as_str().eq_ignore_ascii_case(value)
        || kind.label(Language::Fa) == value
        || kind.label(Language::En).eq_ignore_ascii_case(value)
    })
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A single extinguisher unit as held by the storage layer.
///
/// `next_recharge_date` and `status` are derived; see
/// [`crate::date::add_interval`] and [`crate::status::resolve_status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extinguisher {
  pub id:                 Uuid,
  pub code:               String,
  pub location:           String,
  #[serde(rename = "type")]
  pub kind:               ExtinguisherType,
  /// Kilograms, kept as entered.
  pub capacity:           String,
  pub last_recharge_date: String,
  pub next_recharge_date: String,
  pub status:             Status,
  pub notes:              String,
  pub created_at:         DateTime<Utc>,
  pub updated_at:         DateTime<Utc>,
}

/// Input to [`crate::store::ExtinguisherStore::insert_one`].
///
/// Fully resolved: the code is final and the derived fields are computed.
/// `id` and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExtinguisher {
  pub code:               String,
  pub location:           String,
  pub kind:               ExtinguisherType,
  pub capacity:           String,
  pub last_recharge_date: String,
  pub next_recharge_date: String,
  pub status:             Status,
  pub notes:              String,
}

/// A partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtinguisherPatch {
  pub code:               Option<String>,
  pub location:           Option<String>,
  #[serde(rename = "type")]
  pub kind:               Option<ExtinguisherType>,
  pub capacity:           Option<String>,
  pub last_recharge_date: Option<String>,
  /// Setting a derived status clears a manual override.
  pub status:             Option<Status>,
  pub notes:              Option<String>,
  /// Filled in by the repository whenever the date or type changes; never
  /// accepted from callers.
  #[serde(skip)]
  pub next_recharge_date: Option<String>,
}

impl ExtinguisherPatch {
  /// Whether the patch touches a field `next_recharge_date` depends on.
  pub fn affects_schedule(&self) -> bool {
    self.last_recharge_date.is_some() || self.kind.is_some()
  }

  pub fn is_empty(&self) -> bool { *self == Self::default() }
}

/// A row that survived import validation, ready for a bulk insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportCandidate {
  pub location:           String,
  pub last_recharge_date: String,
  #[serde(rename = "type")]
  pub kind:               ExtinguisherType,
}

// ─── Codes ───────────────────────────────────────────────────────────────────

static CODE_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"FE-([0-9]+)").expect("valid regex"));

/// Default capacity in kilograms for new records.
pub const DEFAULT_CAPACITY: &str = "6";

/// Highest numeric suffix among codes of the form `FE-NNN`; zero when none.
pub fn max_code_number<'a>(codes: impl IntoIterator<Item = &'a str>) -> u64 {
  codes
    .into_iter()
    .filter_map(|code| CODE_PATTERN.captures(code))
    .filter_map(|caps| caps.get(1)?.as_str().parse::<u64>().ok())
    .max()
    .unwrap_or(0)
}

/// Format the `n`th generated code, zero-padded to three digits.
pub fn format_code(n: u64) -> String { format!("FE-{n:03}") }

/// The next unused generated code. Gaps are never filled.
pub fn next_code<'a>(codes: impl IntoIterator<Item = &'a str>) -> String {
  format_code(max_code_number(codes) + 1)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn next_code_on_empty_collection() {
    assert_eq!(next_code(std::iter::empty()), "FE-001");
  }

  #[test]
  fn next_code_does_not_fill_gaps() {
    assert_eq!(next_code(["FE-001", "FE-003"]), "FE-004");
  }

  #[test]
  fn next_code_ignores_foreign_codes() {
    assert_eq!(next_code(["A-17", "manual", "FE-009"]), "FE-010");
    assert_eq!(next_code(["FE-999"]), "FE-1000");
  }

  #[test]
  fn type_parsing_accepts_codes_and_labels() {
    assert_eq!(ExtinguisherType::parse_lenient("CO2"), Some(ExtinguisherType::Co2));
    assert_eq!(ExtinguisherType::parse_lenient("پودری"), Some(ExtinguisherType::Powder));
    assert_eq!(ExtinguisherType::parse_lenient(" water "), Some(ExtinguisherType::Water));
    assert_eq!(ExtinguisherType::parse_lenient("halon"), None);
  }

  #[test]
  fn record_serialises_kind_as_type() {
    let patch: ExtinguisherPatch =
      serde_json::from_str(r#"{"type":"co2","next_recharge_date":"1500/01/01"}"#).unwrap();
    assert_eq!(patch.kind, Some(ExtinguisherType::Co2));
    assert_eq!(patch.next_recharge_date, None);
    assert!(patch.affects_schedule());
  }
}
