//! Core shared library for the spanview workspace.
//!
//! This crate exposes the primitives every other crate depends on:
//! the canonical error type, configuration loading, logging setup and
//! JSON helpers used when spans are read from disk.

pub mod config;
pub mod errors;
pub mod logging;
pub mod serde_utils;

pub use config::{CountThresholds, Environment, ScreenConfig};
pub use errors::{ConfigError, Result as CoreResult, SpanViewError};
