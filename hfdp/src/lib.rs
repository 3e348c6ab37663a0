//! # hfdp
//!
//! Reference-counted, thread-safe managed singletons, after the chocolate
//! boiler chapter of *Head First Design Patterns*.
//!
//! This crate is a **façade** that re-exports the workspace crates and hosts
//! the `boiler-demo` binary. Application code should depend on this crate
//! rather than the individual `hf-*` crates.
//!
//! ```rust
//! use hfdp::core::RegistryConfig;
//! use hfdp::singleton::{ChocolateBoiler, SingletonRegistry};
//!
//! let registry = SingletonRegistry::<ChocolateBoiler>::new(RegistryConfig::eager());
//! let boiler = registry.lease();
//! assert!(boiler.fill());
//! assert!(boiler.process());
//! assert!(boiler.drain());
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Errors, configuration, and the observer pattern.
pub use hf_core as core;

/// The managed singleton registry and the chocolate boiler.
pub use hf_singleton as singleton;

/// Command-line arguments of the `boiler-demo` binary.
pub mod cli;
