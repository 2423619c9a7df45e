//! Read-only projections over the record collection.

use serde::{Deserialize, Serialize};

use crate::{extinguisher::Extinguisher, status::Status};

/// Counts shown on the dashboard cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
  pub total:          usize,
  pub active:         usize,
  pub warning:        usize,
  pub expired:        usize,
  pub needs_recharge: usize,
  pub out_of_order:   usize,
}

impl DashboardSummary {
  pub fn from_records(records: &[Extinguisher]) -> Self {
    records.iter().fold(
      Self { total: records.len(), ..Self::default() },
      |mut acc, record| {
        match record.status {
          Status::Active => acc.active += 1,
          Status::Warning => acc.warning += 1,
          Status::Expired => acc.expired += 1,
          Status::NeedsRecharge => acc.needs_recharge += 1,
          Status::OutOfOrder => acc.out_of_order += 1,
        }
        acc
      },
    )
  }

  /// Records that need attention soon or now.
  pub fn attention(&self) -> usize { self.warning + self.expired + self.needs_recharge }
}

/// Table search and status filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
  /// Case-insensitive substring of the code or location.
  pub search: Option<String>,
  pub status: Option<Status>,
}

impl RecordFilter {
  pub fn matches(&self, record: &Extinguisher) -> bool {
    if self.status.is_some_and(|s| s != record.status) {
      return false;
    }
    match self.search.as_deref().map(str::trim) {
      None | Some("") => true,
      Some(needle) => {
        let needle = needle.to_lowercase();
        record.code.to_lowercase().contains(&needle)
          || record.location.to_lowercase().contains(&needle)
      }
    }
  }

  pub fn apply<'a>(&self, records: &'a [Extinguisher]) -> Vec<&'a Extinguisher> {
    records.iter().filter(|r| self.matches(r)).collect()
  }
}
