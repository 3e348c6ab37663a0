//! # hf-core
//!
//! Core error, configuration, and pattern definitions for hfdp-rs.
//!
//! This crate provides the building blocks shared by the rest of the
//! workspace: the error type, the registry and holder configuration, and a
//! thread-safe Observer/Observable pair used for lifecycle notifications.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Public modules ───────────────────────────────────────────────────────────

/// Registry and holder configuration (`RegistryConfig`, `HolderConfig`).
pub mod config;

/// Error types and the `ensure!` macro.
pub mod errors;

/// Design patterns: observable.
pub mod patterns;

// ── Re-exports for convenience ────────────────────────────────────────────────

pub use config::{Config, HolderConfig, InitMode, RecreatePolicy, RegistryConfig};
pub use errors::{Error, Result};
pub use patterns::observable::{Observable, Observer, ObserverList};
