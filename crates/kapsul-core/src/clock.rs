//! Injected wall clock.
//!
//! Status derivation compares Persian record dates against "now", so the
//! clock reports the current moment as Persian calendar fields. Tests supply a
//! [`FixedClock`].

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::date::{format_date, persian_from_gregorian};

/// A wall-clock reading with the date on the Persian calendar.
///
/// The fields are kept as the calendar gives them (1405/02/31 exists), so
/// ordering is plain field order and readings never step backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PersianNow {
  pub year:  i32,
  pub month: u32,
  pub day:   u32,
  pub time:  NaiveTime,
}

impl PersianNow {
  /// Convert a local Gregorian date and time.
  pub fn from_gregorian(local: NaiveDateTime) -> Self {
    let (year, month, day) = persian_from_gregorian(local.date());
    Self { year, month, day, time: local.time() }
  }

  /// Midnight at the start of a date.
  pub fn start_of(year: i32, month: u32, day: u32) -> Self {
    Self { year, month, day, time: NaiveTime::MIN }
  }

  /// The same day and time one month on. Only the month carries; the day is
  /// kept even where the next month is shorter.
  pub fn one_month_later(self) -> Self {
    let (year, month) = if self.month >= 12 {
      (self.year + 1, 1)
    } else {
      (self.year, self.month + 1)
    };
    Self { year, month, ..self }
  }

  /// `YYYY/MM/DD`.
  pub fn date_string(&self) -> String { format_date(self.year, self.month, self.day) }
}

pub trait Clock: Send + Sync {
  /// The current moment in Persian calendar fields.
  fn now(&self) -> PersianNow;

  /// Today's civil (Gregorian) date, used for file names.
  fn civil_today(&self) -> NaiveDate;
}

/// Local system time converted to the Persian calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> PersianNow { PersianNow::from_gregorian(Local::now().naive_local()) }

  fn civil_today(&self) -> NaiveDate { Local::now().date_naive() }
}

/// A clock stopped at a given instant. The fields of the stored value are
/// read as Persian fields directly.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
  fn now(&self) -> PersianNow {
    PersianNow {
      year:  self.0.year(),
      month: self.0.month(),
      day:   self.0.day(),
      time:  self.0.time(),
    }
  }

  fn civil_today(&self) -> NaiveDate { self.0.date() }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
  fn now(&self) -> PersianNow { (**self).now() }

  fn civil_today(&self) -> NaiveDate { (**self).civil_today() }
}

#[cfg(test)]
mod tests {
  use chrono::Days;

  use super::*;
  use crate::status::{Status, derive_status};

  fn at(y: i32, m: u32, d: u32) -> PersianNow {
    PersianNow::from_gregorian(
      NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(9, 0, 0).unwrap(),
    )
  }

  #[test]
  fn long_persian_month_ends_are_kept() {
    assert_eq!(at(2026, 5, 19).date_string(), "1405/02/29");
    assert_eq!(at(2026, 5, 20).date_string(), "1405/02/30");
    assert_eq!(at(2026, 5, 21).date_string(), "1405/02/31");
    assert_eq!(at(2026, 5, 22).date_string(), "1405/03/01");
    assert_eq!(at(2026, 7, 22).date_string(), "1405/04/31");
  }

  #[test]
  fn due_tomorrow_at_a_month_end_is_a_warning() {
    let now = at(2026, 5, 20);
    assert_eq!(derive_status("1405/03/01", &FixedAt(now)), Status::Warning);
    assert_eq!(derive_status("1405/02/31", &FixedAt(now)), Status::Warning);
    assert_eq!(derive_status("1405/02/30", &FixedAt(now)), Status::Expired);

    let now = at(2026, 7, 22);
    assert_eq!(derive_status("1405/05/01", &FixedAt(now)), Status::Warning);
  }

  #[test]
  fn readings_never_step_backwards() {
    let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    let mut previous = at(2026, 2, 28);
    for offset in 0..800 {
      let day = start.checked_add_days(Days::new(offset)).unwrap();
      let reading = PersianNow::from_gregorian(day.and_hms_opt(9, 0, 0).unwrap());
      assert!(reading > previous, "clock stepped back on {day}");
      previous = reading;
    }
  }

  #[test]
  fn one_month_later_carries_the_year() {
    let end = PersianNow::start_of(1405, 12, 29).one_month_later();
    assert_eq!((end.year, end.month, end.day), (1406, 1, 29));
    let mid = PersianNow::start_of(1405, 6, 31).one_month_later();
    assert_eq!((mid.year, mid.month, mid.day), (1405, 7, 31));
  }

  struct FixedAt(PersianNow);

  impl Clock for FixedAt {
    fn now(&self) -> PersianNow { self.0 }

    fn civil_today(&self) -> NaiveDate { NaiveDate::MIN }
  }
}
