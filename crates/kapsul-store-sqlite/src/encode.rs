//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings with a fixed microsecond precision so they
//! sort lexically. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use kapsul_core::{
  extinguisher::{Extinguisher, ExtinguisherType},
  identity::{Role, Session, User},
  status::Status,
};
use uuid::Uuid;

use crate::{Error, Result};

/// Column list shared by every `extinguishers` SELECT, in [`RawExtinguisher`]
/// field order.
pub const EXTINGUISHER_COLUMNS: &str = "id, code, location, type, capacity, \
   last_recharge_date, next_recharge_date, status, notes, created_at, updated_at";

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_kind(s: &str) -> Result<ExtinguisherType> {
  ExtinguisherType::ALL
    .into_iter()
    .find(|k| k.as_str() == s)
    .ok_or_else(|| Error::UnknownValue { column: "type", value: s.to_owned() })
}

pub fn decode_status(s: &str) -> Result<Status> {
  Status::parse(s).ok_or_else(|| Error::UnknownValue {
    column: "status",
    value:  s.to_owned(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `extinguishers` row.
pub struct RawExtinguisher {
  pub id:                 String,
  pub code:               String,
  pub location:           String,
  pub kind:               String,
  pub capacity:           String,
  pub last_recharge_date: String,
  pub next_recharge_date: String,
  pub status:             String,
  pub notes:              String,
  pub created_at:         String,
  pub updated_at:         String,
}

impl RawExtinguisher {
  /// Row mapper for queries selecting [`EXTINGUISHER_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                 row.get(0)?,
      code:               row.get(1)?,
      location:           row.get(2)?,
      kind:               row.get(3)?,
      capacity:           row.get(4)?,
      last_recharge_date: row.get(5)?,
      next_recharge_date: row.get(6)?,
      status:             row.get(7)?,
      notes:              row.get(8)?,
      created_at:         row.get(9)?,
      updated_at:         row.get(10)?,
    })
  }

  pub fn into_extinguisher(self) -> Result<Extinguisher> {
    Ok(Extinguisher {
      id:                 decode_uuid(&self.id)?,
      code:               self.code,
      location:           self.location,
      kind:               decode_kind(&self.kind)?,
      capacity:           self.capacity,
      last_recharge_date: self.last_recharge_date,
      next_recharge_date: self.next_recharge_date,
      status:             decode_status(&self.status)?,
      notes:              self.notes,
      created_at:         decode_dt(&self.created_at)?,
      updated_at:         decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read from a `users` row, password hash included.
pub struct RawUser {
  pub user_id:       String,
  pub email:         String,
  pub full_name:     String,
  pub password_hash: String,
  pub role:          String,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      email:         row.get(1)?,
      full_name:     row.get(2)?,
      password_hash: row.get(3)?,
      role:          row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  /// Split into the public user and the stored hash.
  pub fn into_parts(self) -> Result<(User, String)> {
    let user = User {
      user_id:    decode_uuid(&self.user_id)?,
      email:      self.email,
      full_name:  self.full_name,
      role:       Role::from_role_str(&self.role),
      created_at: decode_dt(&self.created_at)?,
    };
    Ok((user, self.password_hash))
  }
}

pub struct RawSession {
  pub token_hash: String,
  pub user_id:    String,
  pub created_at: String,
  pub expires_at: String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      token_hash: self.token_hash,
      user_id:    decode_uuid(&self.user_id)?,
      created_at: decode_dt(&self.created_at)?,
      expires_at: decode_dt(&self.expires_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = "2026-01-01T00:00:00.000009Z".parse::<DateTime<Utc>>().unwrap();
    let b = "2026-01-01T00:00:00.5Z".parse::<DateTime<Utc>>().unwrap();
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn unknown_enum_values_are_errors() {
    assert!(matches!(decode_kind("halon"), Err(Error::UnknownValue { .. })));
    assert_eq!(decode_status("out_of_order").unwrap(), Status::OutOfOrder);
  }
}
