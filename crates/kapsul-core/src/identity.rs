//! Users, roles and sessions.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Two-level access: administrators write, viewers read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  #[default]
  Viewer,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Admin => "admin",
      Self::Viewer => "viewer",
    }
  }

  /// Any role string other than `admin` is a viewer.
  pub fn from_role_str(value: &str) -> Self {
    if value == "admin" { Self::Admin } else { Self::Viewer }
  }

  pub fn can_write(self) -> bool { self == Self::Admin }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub email:      String,
  pub full_name:  String,
  pub role:       Role,
  pub created_at: DateTime<Utc>,
}

/// Input to [`UserStore::create_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  /// Already lower-cased and trimmed.
  pub email:         String,
  pub full_name:     String,
  /// PHC string.
  pub password_hash: String,
  pub role:          Role,
}

/// A user together with the stored password hash, for sign-in.
#[derive(Debug, Clone)]
pub struct UserRecord {
  pub user:          User,
  pub password_hash: String,
}

/// A signed-in session. Only the SHA-256 of the bearer token is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub token_hash: String,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl Session {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { self.expires_at <= now }
}

/// Persistence for accounts and sessions.
pub trait UserStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Returns `None` if the email is already registered.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn find_credentials<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + 'a;

  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn create_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn find_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + 'a;

  /// Idempotent.
  fn delete_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn anything_but_admin_is_a_viewer() {
    assert_eq!(Role::from_role_str("admin"), Role::Admin);
    assert_eq!(Role::from_role_str("Admin"), Role::Viewer);
    assert_eq!(Role::from_role_str(""), Role::Viewer);
    assert!(Role::Admin.can_write());
    assert!(!Role::Viewer.can_write());
  }
}
