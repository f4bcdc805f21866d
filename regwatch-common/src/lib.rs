//! # regwatch common library
//!
//! Shared code for the regwatch service and its tools:
//! - Domain models (features, sources, source contents, audit reports)
//! - Change events and the in-process event bus
//! - Database pool and schema bootstrap
//! - Configuration loading
//! - SSE relay helpers

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
