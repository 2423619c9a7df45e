//! Core types and trait definitions for the Kapsul extinguisher tracker.
//!
//! This crate is free of HTTP and database dependencies. It owns the record
//! model, the Persian date arithmetic and status derivation, form validation,
//! the storage traits, and the [`repository::Repository`] facade that keeps
//! the in-memory collection in step with a storage backend.

// Native `async fn` in traits; the `Send` bounds are spelled out where needed.
#![allow(async_fn_in_trait)]

pub mod clock;
pub mod date;
pub mod error;
pub mod extinguisher;
pub mod form;
pub mod identity;
pub mod locale;
pub mod numerals;
pub mod repository;
pub mod status;
pub mod store;
pub mod views;

pub use error::{Error, Result};
