//! Error types for the kapsul-csv codec.

use kapsul_core::locale::Language;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The file could not be split into records at all.
  #[error("unreadable import file at line {line}: {message}")]
  Parse { line: u64, message: String },

  /// Every row failed validation; nothing would be imported.
  #[error("no valid rows to import")]
  NoValidRows,

  #[error("CSV write error: {0}")]
  Csv(#[from] csv::Error),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

impl Error {
  /// Text shown to the user.
  pub fn message(&self, lang: Language) -> String {
    match self {
      Self::Parse { .. } => lang.pick("خطا در خواندن فایل", "Error reading file").to_owned(),
      Self::NoValidRows => {
        lang.pick("هیچ ردیف معتبری وجود ندارد", "No valid rows to import").to_owned()
      }
      other => other.to_string(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
