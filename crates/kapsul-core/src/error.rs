//! Error types for `kapsul-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{date::DateError, form::ValidationError};

#[derive(Debug, Error)]
pub enum Error {
  /// Input rejected before any storage call was made.
  #[error("validation failed: {0}")]
  Validation(#[from] ValidationError),

  #[error("date error: {0}")]
  Date(#[from] DateError),

  #[error("extinguisher not found: {0}")]
  NotFound(Uuid),

  /// The storage backend failed. The in-memory collection is unchanged.
  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn persistence<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Persistence(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
