//! Add/edit form validation.
//!
//! A [`RecordForm`] is what a client submits. [`RecordForm::validate`] either
//! rejects it with a [`ValidationError`] or yields a normalised
//! [`ValidatedRecord`]; nothing reaches the repository otherwise.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  date::is_valid_date,
  extinguisher::{DEFAULT_CAPACITY, Extinguisher, ExtinguisherPatch, ExtinguisherType},
  locale::Language,
  numerals::to_latin_numerals,
  status::Status,
};

/// Separator between the main area and the specific address.
pub const LOCATION_SEPARATOR: &str = " - ";

/// Main areas offered when building a structured location. Any other text is
/// still accepted.
pub const MAIN_AREAS: [&str; 10] = [
  "سالن اسید شویی",
  "سالن گالوانیزه",
  "نورد سرد",
  "زیر زمین نورد سرد",
  "سالن انبار محصول",
  "خط قدیم",
  "اداری",
  "ماشین سازی",
  "تاسیسات",
  "سایر مکان‌ها",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("location is required")]
  MissingLocation,

  #[error("last recharge date is required")]
  MissingDate,

  #[error("invalid date {0:?}; expected YYYY/M/D")]
  InvalidDate(String),

  #[error("code {0:?} is already in use")]
  DuplicateCode(String),
}

impl ValidationError {
  /// Text shown to the user.
  pub fn message(&self, lang: Language) -> &'static str {
    match self {
      Self::MissingLocation => {
        lang.pick("محل نصب ضروری است", "Location is required")
      }
      Self::MissingDate => {
        lang.pick("تاریخ شارژ ضروری است", "Recharge date is required")
      }
      Self::InvalidDate(_) => lang.pick(
        "فرمت تاریخ نادرست است (1403/01/01)",
        "Invalid date format (1403/01/01)",
      ),
      Self::DuplicateCode(_) => lang.pick(
        "این کد قبلاً استفاده شده است",
        "This code is already in use",
      ),
    }
  }
}

// ─── Form ────────────────────────────────────────────────────────────────────

/// Raw form input. Every field may be missing or blank.
///
/// The location is either given directly in `location` or as the structured
/// `main_area` / `specific_location` pair, which takes precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordForm {
  /// Blank means "generate one".
  pub code:               String,
  pub location:           String,
  pub main_area:          Option<String>,
  pub specific_location:  Option<String>,
  #[serde(rename = "type")]
  pub kind:               ExtinguisherType,
  pub capacity:           String,
  pub last_recharge_date: String,
  pub notes:              String,
  /// Only the administrative overrides are meaningful here; a derived
  /// status clears an existing override on edit.
  pub status:             Option<Status>,
}

/// A form that passed validation, with every field normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecord {
  /// `None` when the code should be generated.
  pub code:               Option<String>,
  pub location:           String,
  pub kind:               ExtinguisherType,
  pub capacity:           String,
  pub last_recharge_date: String,
  pub notes:              String,
  pub status:             Option<Status>,
}

fn normalise_digits(value: &str) -> String { to_latin_numerals(value.trim()) }

impl RecordForm {
  /// Pre-fill an edit form from a stored record.
  ///
  /// A location without the separator fills both halves of the pair.
  pub fn from_existing(record: &Extinguisher) -> Self {
    let mut parts = record.location.splitn(2, LOCATION_SEPARATOR);
    let main = parts.next().unwrap_or_default().to_owned();
    let specific = parts.next().map(str::to_owned).unwrap_or_else(|| main.clone());

    Self {
      code:               record.code.clone(),
      location:           record.location.clone(),
      main_area:          Some(main),
      specific_location:  Some(specific),
      kind:               record.kind,
      capacity:           record.capacity.clone(),
      last_recharge_date: record.last_recharge_date.clone(),
      notes:              record.notes.clone(),
      status:             Some(record.status),
    }
  }

  /// The location this form describes, or `None` if it is incomplete.
  fn composed_location(&self) -> Option<String> {
    let main = self.main_area.as_deref().map(str::trim).unwrap_or_default();
    let specific = self
      .specific_location
      .as_deref()
      .map(str::trim)
      .unwrap_or_default();

    if self.main_area.is_some() || self.specific_location.is_some() {
      if main.is_empty() || specific.is_empty() {
        return None;
      }
      return Some(format!("{main}{LOCATION_SEPARATOR}{specific}"));
    }

    let location = self.location.trim();
    (!location.is_empty()).then(|| location.to_owned())
  }

  /// Check required fields and date syntax, then normalise.
  ///
  /// Checks run in a fixed order and the first failure is returned. The
  /// duplicate-code check applies only to new records with an explicit code.
  pub fn validate(
    &self,
    existing_codes: &[String],
    editing: bool,
  ) -> Result<ValidatedRecord, ValidationError> {
    let location = self.composed_location().ok_or(ValidationError::MissingLocation)?;

    let date = normalise_digits(&self.last_recharge_date);
    if date.is_empty() {
      return Err(ValidationError::MissingDate);
    }
    if !is_valid_date(&date) {
      return Err(ValidationError::InvalidDate(date));
    }

    let code = normalise_digits(&self.code);
    if !editing && !code.is_empty() && existing_codes.iter().any(|c| *c == code) {
      return Err(ValidationError::DuplicateCode(code));
    }

    let capacity = match normalise_digits(&self.capacity) {
      c if c.is_empty() => DEFAULT_CAPACITY.to_owned(),
      c => c,
    };

    Ok(ValidatedRecord {
      code: (!code.is_empty()).then_some(code),
      location,
      kind: self.kind,
      capacity,
      last_recharge_date: date,
      notes: self.notes.trim().to_owned(),
      status: self.status,
    })
  }
}

impl ValidatedRecord {
  /// A patch replacing every editable field. A blank code keeps the stored
  /// one.
  pub fn into_patch(self) -> ExtinguisherPatch {
    ExtinguisherPatch {
      code:               self.code,
      location:           Some(self.location),
      kind:               Some(self.kind),
      capacity:           Some(self.capacity),
      last_recharge_date: Some(self.last_recharge_date),
      status:             self.status,
      notes:              Some(self.notes),
      next_recharge_date: None,
    }
  }
}

impl ExtinguisherPatch {
  /// Apply the form rules to the fields this patch sets.
  ///
  /// Blank text fields other than notes are rejected the same way the full
  /// form rejects them. Code uniqueness is not checked on edits.
  pub fn validated(mut self) -> Result<Self, ValidationError> {
    if let Some(location) = &self.location {
      let location = location.trim();
      if location.is_empty() {
        return Err(ValidationError::MissingLocation);
      }
      self.location = Some(location.to_owned());
    }

    if let Some(date) = &self.last_recharge_date {
      let date = normalise_digits(date);
      if date.is_empty() {
        return Err(ValidationError::MissingDate);
      }
      if !is_valid_date(&date) {
        return Err(ValidationError::InvalidDate(date));
      }
      self.last_recharge_date = Some(date);
    }

    self.code = self.code.map(|c| normalise_digits(&c)).filter(|c| !c.is_empty());
    self.capacity = self
      .capacity
      .map(|c| normalise_digits(&c))
      .map(|c| if c.is_empty() { DEFAULT_CAPACITY.to_owned() } else { c });
    self.notes = self.notes.map(|n| n.trim().to_owned());
    self.next_recharge_date = None;
    Ok(self)
  }
}
