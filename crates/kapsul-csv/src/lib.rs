//! CSV import and export for Kapsul.
//!
//! Converts between comma-separated files and [`kapsul_core`] records. The
//! import side is a two-step pipeline: [`parse_import`] produces a preview
//! with per-row validation, and [`ImportPreview::into_candidates`] yields the
//! rows that may be handed to
//! [`Repository::import_batch`](kapsul_core::repository::Repository::import_batch).
//!
//! # Quick start
//!
//! ```no_run
//! let preview = kapsul_csv::parse_import("header\nLobby,1403/06/20,co2\n".as_bytes()).unwrap();
//! assert_eq!(preview.valid_count(), 1);
//! ```

pub mod error;
mod parse;
mod serialize;

pub use error::{Error, Result};
use kapsul_core::{
  clock::Clock,
  extinguisher::{Extinguisher, ExtinguisherType, ImportCandidate},
  locale::Language,
  repository::Repository,
  store::ExtinguisherStore,
};
use serde::Serialize;

/// UTF-8 byte-order mark written ahead of every generated file so
/// spreadsheet programs pick the right encoding.
pub const BOM: &str = "\u{feff}";

// ─── Public types ────────────────────────────────────────────────────────────

/// A generated file ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
  pub filename: String,
  pub bytes:    Vec<u8>,
}

impl ExportFile {
  pub const CONTENT_TYPE: &'static str = "text/csv; charset=utf-8";
}

/// Why a single import row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowError {
  MissingLocation,
  MissingDate,
  MalformedDate,
  /// Syntactically fine but the month or day is impossible.
  DateOutOfRange,
  UnknownType(String),
}

impl RowError {
  pub fn message(&self, lang: Language) -> &'static str {
    match self {
      Self::MissingLocation => lang.pick("محل نصب ضروری است", "Location is required"),
      Self::MissingDate => lang.pick("تاریخ شارژ ضروری است", "Recharge date is required"),
      Self::MalformedDate => lang.pick("فرمت تاریخ نادرست است", "Invalid date format"),
      Self::DateOutOfRange => lang.pick("تاریخ خارج از محدوده است", "Date is out of range"),
      Self::UnknownType(_) => lang.pick("نوع کپسول نامعتبر است", "Unknown extinguisher type"),
    }
  }
}

/// One parsed data row and its validation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRow {
  /// 1-based line in the source file.
  pub line:               u64,
  pub location:           String,
  pub last_recharge_date: String,
  /// Resolved type; `powder` when the column is blank or unrecognised.
  #[serde(rename = "type")]
  pub kind:               ExtinguisherType,
  pub errors:             Vec<RowError>,
}

impl ImportRow {
  pub fn is_valid(&self) -> bool { self.errors.is_empty() }
}

/// The per-row result of reading an import file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportPreview {
  pub rows: Vec<ImportRow>,
}

impl ImportPreview {
  pub fn valid_count(&self) -> usize { self.rows.iter().filter(|r| r.is_valid()).count() }

  pub fn invalid_count(&self) -> usize { self.rows.len() - self.valid_count() }

  /// The valid rows, or [`Error::NoValidRows`] if there are none.
  pub fn into_candidates(self) -> Result<Vec<ImportCandidate>> {
    let candidates: Vec<_> = self
      .rows
      .into_iter()
      .filter(ImportRow::is_valid)
      .map(|row| ImportCandidate {
        location:           row.location,
        last_recharge_date: row.last_recharge_date,
        kind:               row.kind,
      })
      .collect();

    if candidates.is_empty() {
      return Err(Error::NoValidRows);
    }
    Ok(candidates)
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Read an uploaded file.
///
/// The first record is a header and is ignored. Columns are positional:
/// location, last recharge date, type. Fully blank rows are skipped.
pub fn parse_import(input: &[u8]) -> Result<ImportPreview> { parse::parse_import(input) }

/// Render records as a spreadsheet-friendly CSV, dated `today` in the
/// filename.
pub fn export_csv(
  records: &[Extinguisher],
  lang: Language,
  today: chrono::NaiveDate,
) -> Result<ExportFile> {
  serialize::export_csv(records, lang, today)
}

/// The blank import template with one sample row.
pub fn import_template(lang: Language) -> Result<ExportFile> { serialize::import_template(lang) }

/// Export the repository's current collection, dated by the repository
/// clock's civil date.
pub async fn export_all<S, C>(repo: &Repository<S, C>, lang: Language) -> Result<ExportFile>
where
  S: ExtinguisherStore,
  C: Clock,
{
  let records = repo.snapshot().await;
  let file = export_csv(&records, lang, repo.clock().civil_today())?;
  tracing::info!(count = records.len(), filename = %file.filename, "export generated");
  Ok(file)
}
