//! Import file reader and per-row validation.

use kapsul_core::{
  date::{add_interval, is_valid_date},
  extinguisher::ExtinguisherType,
  numerals::to_latin_numerals,
};

use crate::{BOM, Error, ImportPreview, ImportRow, Result, RowError};

pub(crate) fn parse_import(input: &[u8]) -> Result<ImportPreview> {
  let input = input.strip_prefix(BOM.as_bytes()).unwrap_or(input);

  let mut reader = csv::ReaderBuilder::new()
    .has_headers(true)
    .flexible(true)
    .trim(csv::Trim::All)
    .from_reader(input);

  let mut rows = Vec::new();
  for result in reader.records() {
    let record = result.map_err(|e| Error::Parse {
      line:    e.position().map_or(0, csv::Position::line),
      message: e.to_string(),
    })?;
    if record.iter().all(str::is_empty) {
      continue;
    }
    let line = record.position().map_or(0, csv::Position::line);
    rows.push(validate_row(
      line,
      record.get(0).unwrap_or_default(),
      record.get(1).unwrap_or_default(),
      record.get(2).unwrap_or_default(),
    ));
  }

  Ok(ImportPreview { rows })
}

fn validate_row(line: u64, location: &str, date: &str, kind: &str) -> ImportRow {
  let mut errors = Vec::new();
  let date = to_latin_numerals(date);

  if location.is_empty() {
    errors.push(RowError::MissingLocation);
  }

  let kind = if kind.is_empty() {
    ExtinguisherType::Powder
  } else if let Some(parsed) = ExtinguisherType::parse_lenient(kind) {
    parsed
  } else {
    errors.push(RowError::UnknownType(kind.to_owned()));
    ExtinguisherType::Powder
  };

  if date.is_empty() {
    errors.push(RowError::MissingDate);
  } else if !is_valid_date(&date) {
    errors.push(RowError::MalformedDate);
  } else if add_interval(&date, kind).is_err() {
    errors.push(RowError::DateOutOfRange);
  }

  ImportRow {
    line,
    location: location.to_owned(),
    last_recharge_date: date,
    kind,
    errors,
  }
}
