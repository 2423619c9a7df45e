//! The `ExtinguisherStore` trait and the change feed.
//!
//! Implemented by storage backends (e.g. `kapsul-store-sqlite`). The
//! [`Repository`](crate::repository::Repository) depends on these traits, not
//! on a concrete backend.

use std::future::Future;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::extinguisher::{Extinguisher, ExtinguisherPatch, NewExtinguisher};

/// Storage for the extinguishers table.
///
/// All methods return `Send` futures so the trait can be used behind axum.
pub trait ExtinguisherStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every record, newest first by `created_at`.
  fn list_all(
    &self,
  ) -> impl Future<Output = Result<Vec<Extinguisher>, Self::Error>> + Send + '_;

  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Extinguisher>, Self::Error>> + Send + '_;

  /// Persist one record; the store assigns `id` and timestamps.
  fn insert_one(
    &self,
    input: NewExtinguisher,
  ) -> impl Future<Output = Result<Extinguisher, Self::Error>> + Send + '_;

  /// Persist all records in one transaction, or none of them.
  fn insert_many(
    &self,
    inputs: Vec<NewExtinguisher>,
  ) -> impl Future<Output = Result<Vec<Extinguisher>, Self::Error>> + Send + '_;

  /// Apply every set field of `patch` atomically. `None` if `id` is unknown.
  fn update(
    &self,
    id: Uuid,
    patch: ExtinguisherPatch,
  ) -> impl Future<Output = Result<Option<Extinguisher>, Self::Error>> + Send + '_;

  /// `false` if `id` is unknown.
  fn delete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Change feed ─────────────────────────────────────────────────────────────

/// A row of the extinguishers table changed. Carries no payload; receivers
/// reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableChange {
  Inserted,
  Updated,
  Deleted,
}

/// Push side of the subscribe-and-reload pattern.
pub trait ChangeFeed {
  fn subscribe(&self) -> broadcast::Receiver<TableChange>;
}
