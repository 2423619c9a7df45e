//! Recharge status and its derivation from the next recharge date.

use serde::{Deserialize, Serialize};

use crate::{
  clock::{Clock, PersianNow},
  date::split_date,
  locale::Language,
};

/// Urgency of a record.
///
/// `Active`, `Warning` and `Expired` are derived from the next recharge date
/// and move only forward as time passes. `NeedsRecharge` and `OutOfOrder` are
/// set by an administrator and never produced by [`derive_status`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Status {
  #[default]
  Active,
  Warning,
  NeedsRecharge,
  Expired,
  OutOfOrder,
}

impl Status {
  pub const ALL: [Self; 5] = [
    Self::Active,
    Self::Warning,
    Self::NeedsRecharge,
    Self::Expired,
    Self::OutOfOrder,
  ];

  /// Overrides set by hand survive reloads.
  pub fn is_manual(self) -> bool {
    matches!(self, Self::NeedsRecharge | Self::OutOfOrder)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Warning => "warning",
      Self::NeedsRecharge => "needs_recharge",
      Self::Expired => "expired",
      Self::OutOfOrder => "out_of_order",
    }
  }

  pub fn parse(value: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|s| s.as_str() == value)
  }

  pub fn label(self, lang: Language) -> &'static str {
    match self {
      Self::Active => lang.pick("فعال", "Active"),
      Self::Warning => lang.pick("هشدار - یک ماه مانده", "Warning - 1 month left"),
      Self::NeedsRecharge => lang.pick("نیاز به شارژ", "Needs Recharge"),
      Self::Expired => lang.pick("منقضی", "Expired"),
      Self::OutOfOrder => lang.pick("خارج از سرویس", "Out of Order"),
    }
  }
}

/// The start of the due day, compared field by field against the clock.
fn due_moment(next_recharge_date: &str) -> Option<PersianNow> {
  let (year, month, day) = split_date(next_recharge_date)?;
  Some(PersianNow::start_of(
    i32::try_from(year).ok()?,
    u32::try_from(month).ok()?,
    u32::try_from(day).ok()?,
  ))
}

/// Classify a record by its next recharge date.
///
/// Empty or unparseable dates are `Active` so incomplete records are never
/// flagged. The due moment is midnight at the start of the due day: a unit
/// due today is already `Expired`. Dates are compared as Persian fields, so
/// the 31st of a month sorts before the 1st of the next.
pub fn derive_status<C: Clock + ?Sized>(next_recharge_date: &str, clock: &C) -> Status {
  let Some(due) = due_moment(next_recharge_date) else {
    return Status::Active;
  };
  let now = clock.now();

  if due < now {
    Status::Expired
  } else if due < now.one_month_later() {
    Status::Warning
  } else {
    Status::Active
  }
}

/// The status to present for a record: a manual override if one is stored,
/// otherwise the derived value.
pub fn resolve_status<C: Clock + ?Sized>(
  stored: Status,
  next_recharge_date: &str,
  clock: &C,
) -> Status {
  if stored.is_manual() {
    stored
  } else {
    derive_status(next_recharge_date, clock)
  }
}
