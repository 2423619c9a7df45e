//! Export and template writers.
//!
//! Output is UTF-8 with a leading byte-order mark, comma-delimited, with `\n`
//! line endings. Fields are quoted only when they need it.

use chrono::NaiveDate;
use kapsul_core::{extinguisher::Extinguisher, locale::Language};

use crate::{BOM, Error, ExportFile, Result};

const EXPORT_HEADER_FA: [&str; 7] =
  ["کد", "محل نصب", "نوع", "ظرفیت", "آخرین شارژ", "شارژ بعدی", "وضعیت"];
const EXPORT_HEADER_EN: [&str; 7] =
  ["Code", "Location", "Type", "Capacity", "Last Recharge", "Next Recharge", "Status"];

const TEMPLATE_HEADER: [&str; 3] = ["محل نصب", "تاریخ شارژ مجدد", "نوع کپسول"];
const TEMPLATE_SAMPLE_FA: [&str; 3] = ["ورودی اصلی", "1403/06/20", "powder"];
const TEMPLATE_SAMPLE_EN: [&str; 3] = ["Main Entrance", "1403/06/20", "powder"];

fn writer() -> csv::Writer<Vec<u8>> {
  let mut buf = Vec::new();
  buf.extend_from_slice(BOM.as_bytes());
  csv::WriterBuilder::new()
    .terminator(csv::Terminator::Any(b'\n'))
    .from_writer(buf)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
  writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}

pub(crate) fn export_csv(
  records: &[Extinguisher],
  lang: Language,
  today: NaiveDate,
) -> Result<ExportFile> {
  let mut w = writer();
  w.write_record(match lang {
    Language::Fa => EXPORT_HEADER_FA,
    Language::En => EXPORT_HEADER_EN,
  })?;

  let unit = lang.pick("کیلوگرم", "kg");
  for record in records {
    let capacity = format!("{} {unit}", record.capacity);
    w.write_record([
      record.code.as_str(),
      record.location.as_str(),
      record.kind.label(lang),
      capacity.as_str(),
      record.last_recharge_date.as_str(),
      record.next_recharge_date.as_str(),
      record.status.label(lang),
    ])?;
  }

  Ok(ExportFile {
    filename: format!("extinguishers_{}.csv", today.format("%Y-%m-%d")),
    bytes:    finish(w)?,
  })
}

pub(crate) fn import_template(lang: Language) -> Result<ExportFile> {
  let mut w = writer();
  // The header stays Persian in both languages; import ignores it anyway.
  w.write_record(TEMPLATE_HEADER)?;
  w.write_record(match lang {
    Language::Fa => TEMPLATE_SAMPLE_FA,
    Language::En => TEMPLATE_SAMPLE_EN,
  })?;

  Ok(ExportFile { filename: "template.csv".to_owned(), bytes: finish(w)? })
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use kapsul_core::{extinguisher::ExtinguisherType, status::Status};
  use uuid::Uuid;

  use super::*;
  use crate::parse_import;

  fn record(code: &str, location: &str, kind: ExtinguisherType, status: Status) -> Extinguisher {
    Extinguisher {
      id: Uuid::new_v4(),
      code: code.into(),
      location: location.into(),
      kind,
      capacity: "6".into(),
      last_recharge_date: "1403/06/20".into(),
      next_recharge_date: "1404/06/20".into(),
      status,
      notes: String::new(),
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  fn text(file: &ExportFile) -> &str { std::str::from_utf8(&file.bytes).unwrap() }

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2026, 10, 18).unwrap() }

  #[test]
  fn persian_export_layout() {
    let records = [record("FE-001", "ورودی اصلی", ExtinguisherType::Co2, Status::Warning)];
    let file = export_csv(&records, Language::Fa, today()).unwrap();

    assert_eq!(file.filename, "extinguishers_2026-10-18.csv");
    assert!(file.bytes.starts_with("\u{feff}".as_bytes()));
    assert_eq!(
      text(&file),
      "\u{feff}کد,محل نصب,نوع,ظرفیت,آخرین شارژ,شارژ بعدی,وضعیت\n\
       FE-001,ورودی اصلی,دی اکسید کربن,6 کیلوگرم,1403/06/20,1404/06/20,هشدار - یک ماه مانده\n"
    );
  }

  #[test]
  fn english_export_uses_english_labels() {
    let records = [record("FE-002", "Lobby", ExtinguisherType::Water, Status::OutOfOrder)];
    let file = export_csv(&records, Language::En, today()).unwrap();
    let body = text(&file);
    assert!(body.contains("Code,Location,Type,Capacity,Last Recharge,Next Recharge,Status\n"));
    assert!(body.contains("FE-002,Lobby,Water,6 kg,1403/06/20,1404/06/20,Out of Order\n"));
  }

  #[test]
  fn commas_in_locations_are_quoted() {
    let records = [record("FE-003", "Hall, east", ExtinguisherType::Foam, Status::Active)];
    let file = export_csv(&records, Language::En, today()).unwrap();
    assert!(text(&file).contains("FE-003,\"Hall, east\",Foam"));
  }

  #[test]
  fn export_columns_reimport_to_the_same_records() {
    let records = [
      record("FE-001", "ورودی اصلی", ExtinguisherType::Co2, Status::Active),
      record("FE-002", "Hall, east", ExtinguisherType::Foam, Status::Expired),
      record("FE-003", "انبار", ExtinguisherType::Powder, Status::Warning),
    ];
    let file = export_csv(&records, Language::Fa, today()).unwrap();

    // Keep location, last recharge and type, in import column order.
    let mut reader = csv::Reader::from_reader(&file.bytes[BOM.len()..]);
    let mut reimport = csv::Writer::from_writer(Vec::new());
    reimport.write_record(["location", "date", "type"]).unwrap();
    for row in reader.records() {
      let row = row.unwrap();
      reimport.write_record([&row[1], &row[4], &row[2]]).unwrap();
    }
    let reimport = reimport.into_inner().unwrap();

    let candidates = parse_import(&reimport).unwrap().into_candidates().unwrap();
    assert_eq!(candidates.len(), records.len());
    for (candidate, record) in candidates.iter().zip(&records) {
      assert_eq!(candidate.location, record.location);
      assert_eq!(candidate.last_recharge_date, record.last_recharge_date);
      assert_eq!(candidate.kind, record.kind);
    }
  }

  #[test]
  fn template_has_header_and_sample() {
    let file = import_template(Language::Fa).unwrap();
    assert_eq!(file.filename, "template.csv");
    assert_eq!(
      text(&file),
      "\u{feff}محل نصب,تاریخ شارژ مجدد,نوع کپسول\nورودی اصلی,1403/06/20,powder\n"
    );

    let preview = parse_import(&file.bytes).unwrap();
    assert_eq!(preview.valid_count(), 1);
  }
}
