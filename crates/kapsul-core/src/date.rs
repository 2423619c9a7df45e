//! Persian date strings and recharge-interval arithmetic.
//!
//! Record dates are `YYYY/M/D` strings on the Persian calendar. They are never
//! converted to Gregorian; arithmetic treats the three numeric fields as an
//! ordinary proleptic-Gregorian triple and lets month-end rollover happen the
//! way a `Date(year, month, day)` constructor would. True Persian leap rules
//! are not modelled.

use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use thiserror::Error;

use crate::{
  clock::{Clock, SystemClock},
  extinguisher::ExtinguisherType,
};

// ASCII classes on purpose: `\d` in the regex crate also matches Persian digits.
static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[0-9]{4}/[0-9]{1,2}/[0-9]{1,2}$").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
  #[error("malformed date {0:?}; expected YYYY/M/D")]
  Malformed(String),

  #[error("date {0:?} is out of range")]
  OutOfRange(String),
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Syntactic check: four-digit year, one or two digit month and day.
///
/// Month and day ranges are not checked, so `1403/13/99` passes.
pub fn is_valid_date(value: &str) -> bool { DATE_PATTERN.is_match(value) }

// ─── Formatting ──────────────────────────────────────────────────────────────

/// Zero-padded `YYYY/MM/DD`.
pub fn format_date(year: i32, month: u32, day: u32) -> String {
  format!("{year:04}/{month:02}/{day:02}")
}

/// Format a date triple that has already been through [`rolled_date`].
pub fn format_naive(date: NaiveDate) -> String {
  format_date(date.year(), date.month(), date.day())
}

// ─── Arithmetic ──────────────────────────────────────────────────────────────

/// Split `YYYY/M/D` into its numeric fields without range checks.
pub(crate) fn split_date(value: &str) -> Option<(i64, i64, i64)> {
  let mut parts = value.split('/');
  let year = parts.next()?.trim().parse().ok()?;
  let month = parts.next()?.trim().parse().ok()?;
  let day = parts.next()?.trim().parse().ok()?;
  if parts.next().is_some() {
    return None;
  }
  Some((year, month, day))
}

/// Build a date from possibly out-of-range fields.
///
/// Months past 12 carry into following years and days past the end of the
/// month carry into following months; zero or negative values borrow
/// backwards. `None` only when the result leaves chrono's supported range.
pub(crate) fn rolled_date(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
  let month0 = month.checked_sub(1)?;
  let year = year.checked_add(month0.div_euclid(12))?;
  let month = u32::try_from(month0.rem_euclid(12) + 1).ok()?;
  let first = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, 1)?;

  if day >= 1 {
    first.checked_add_days(Days::new(u64::try_from(day - 1).ok()?))
  } else {
    first.checked_sub_days(Days::new(u64::try_from(1 - day).ok()?))
  }
}

/// Advance `date` by `months`, keeping the day of month and rolling any
/// overflow forward (the 31st plus one month may land early in the month
/// after next).
pub(crate) fn add_months_rolling(date: NaiveDate, months: u32) -> Option<NaiveDate> {
  rolled_date(
    i64::from(date.year()),
    i64::from(date.month()) + i64::from(months),
    i64::from(date.day()),
  )
}

/// Compute the next recharge date for an extinguisher last recharged on
/// `last_date`.
///
/// An empty `last_date` yields an empty string. The month and day must lie in
/// 1..=12 and 1..=31; within that range a day past the end of its month rolls
/// forward before the interval is added.
pub fn add_interval(
  last_date: &str,
  kind: ExtinguisherType,
) -> Result<String, DateError> {
  if last_date.is_empty() {
    return Ok(String::new());
  }
  if !is_valid_date(last_date) {
    return Err(DateError::Malformed(last_date.to_owned()));
  }

  let out_of_range = || DateError::OutOfRange(last_date.to_owned());
  let (year, month, day) =
    split_date(last_date).ok_or_else(|| DateError::Malformed(last_date.to_owned()))?;
  if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
    return Err(out_of_range());
  }

  let start = rolled_date(year, month, day).ok_or_else(out_of_range)?;
  let next = add_months_rolling(start, kind.recharge_interval_months())
    .ok_or_else(out_of_range)?;
  if next.year() > 9999 {
    return Err(out_of_range());
  }

  Ok(format_naive(next))
}

// ─── Persian calendar ────────────────────────────────────────────────────────

/// Convert a Gregorian date to Persian `(year, month, day)`.
///
/// Used for the wall clock only; record dates are already Persian.
pub fn persian_from_gregorian(date: NaiveDate) -> (i32, u32, u32) {
  const MONTH_OFFSETS: [i64; 12] =
    [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

  let gy = i64::from(date.year());
  let gm = date.month() as usize;
  let gd = i64::from(date.day());

  let gy2 = if gm > 2 { gy + 1 } else { gy };
  let mut days = 355_666 + 365 * gy + (gy2 + 3) / 4 - (gy2 + 99) / 100
    + (gy2 + 399) / 400
    + gd
    + MONTH_OFFSETS[gm - 1];

  let mut jy = -1595 + 33 * (days / 12_053);
  days %= 12_053;
  jy += 4 * (days / 1461);
  days %= 1461;
  if days > 365 {
    jy += (days - 1) / 365;
    days = (days - 1) % 365;
  }

  let (jm, jd) = if days < 186 {
    (1 + days / 31, 1 + days % 31)
  } else {
    (7 + (days - 186) / 30, 1 + (days - 186) % 30)
  };

  (jy as i32, jm as u32, jd as u32)
}

/// Today's date on the Persian calendar as `YYYY/MM/DD`.
pub fn persian_today() -> String { SystemClock.now().date_string() }

#[cfg(test)]
mod tests {
  use super::*;

  const ALL_TYPES: [ExtinguisherType; 4] = [
    ExtinguisherType::Powder,
    ExtinguisherType::Co2,
    ExtinguisherType::Foam,
    ExtinguisherType::Water,
  ];

  #[test]
  fn validity_is_syntactic() {
    assert!(is_valid_date("1403/7/1"));
    assert!(is_valid_date("1403/07/01"));
    assert!(!is_valid_date("1403-07-01"));
    assert!(!is_valid_date("03/07/01"));
    assert!(!is_valid_date("1403/007/01"));
    assert!(!is_valid_date(""));
    assert!(!is_valid_date(" 1403/07/01"));
    // Out-of-range fields are still syntactically valid.
    assert!(is_valid_date("1403/13/99"));
  }

  #[test]
  fn persian_digits_are_not_valid_dates() {
    assert!(!is_valid_date("۱۴۰۳/۰۷/۰۱"));
  }

  #[test]
  fn yearly_and_five_yearly_intervals() {
    assert_eq!(add_interval("1403/06/20", ExtinguisherType::Powder).unwrap(), "1404/06/20");
    assert_eq!(add_interval("1403/06/20", ExtinguisherType::Foam).unwrap(), "1404/06/20");
    assert_eq!(add_interval("1403/06/20", ExtinguisherType::Water).unwrap(), "1404/06/20");
    assert_eq!(add_interval("1403/06/20", ExtinguisherType::Co2).unwrap(), "1408/06/20");
  }

  #[test]
  fn output_is_zero_padded() {
    assert_eq!(add_interval("1403/7/1", ExtinguisherType::Powder).unwrap(), "1404/07/01");
  }

  #[test]
  fn empty_input_yields_empty_output() {
    assert_eq!(add_interval("", ExtinguisherType::Co2).unwrap(), "");
  }

  #[test]
  fn day_overflow_rolls_into_next_month() {
    // The start date itself rolls first: 1403/02/31 behaves as 1403/03/03.
    assert_eq!(add_interval("1403/02/31", ExtinguisherType::Powder).unwrap(), "1404/03/03");
    // A leap day landing in a common year moves to the first of the month.
    assert_eq!(add_interval("1404/02/29", ExtinguisherType::Powder).unwrap(), "1405/03/01");
    // Rolling happens before the interval is added, not after: 1404 is a
    // leap year, so adding first would have produced 1404/03/01.
    assert_eq!(add_interval("1403/02/30", ExtinguisherType::Powder).unwrap(), "1404/03/02");
  }

  #[test]
  fn malformed_and_out_of_range_inputs_are_errors() {
    assert!(matches!(
      add_interval("bad-date", ExtinguisherType::Powder),
      Err(DateError::Malformed(_))
    ));
    assert!(matches!(
      add_interval("1403/13/01", ExtinguisherType::Powder),
      Err(DateError::OutOfRange(_))
    ));
    assert!(matches!(
      add_interval("1403/06/00", ExtinguisherType::Powder),
      Err(DateError::OutOfRange(_))
    ));
    assert!(matches!(
      add_interval("9999/06/01", ExtinguisherType::Co2),
      Err(DateError::OutOfRange(_))
    ));
  }

  #[test]
  fn results_are_always_valid_dates() {
    for year in [1000, 1399, 1403, 1404, 2024, 9990] {
      for month in 1..=12 {
        for day in [1, 15, 28, 29, 30, 31] {
          let input = format!("{year}/{month}/{day}");
          for kind in ALL_TYPES {
            let next = add_interval(&input, kind).unwrap();
            assert!(is_valid_date(&next), "{input} + {kind:?} gave {next}");
          }
        }
      }
    }
  }

  #[test]
  fn rolled_date_borrows_and_carries() {
    assert_eq!(rolled_date(1403, 13, 1), NaiveDate::from_ymd_opt(1404, 1, 1));
    assert_eq!(rolled_date(1403, 1, 0), NaiveDate::from_ymd_opt(1402, 12, 31));
    assert_eq!(rolled_date(1403, 0, 1), NaiveDate::from_ymd_opt(1402, 12, 1));
  }

  #[test]
  fn gregorian_to_persian() {
    let nowruz = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
    assert_eq!(persian_from_gregorian(nowruz), (1403, 1, 1));

    let autumn = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
    assert_eq!(persian_from_gregorian(autumn), (1405, 7, 26));

    let new_years_eve = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
    assert_eq!(persian_from_gregorian(new_years_eve), (1403, 12, 30));
  }
}
