//! Error types for hfdp-rs.
//!
//! The managed-singleton core never fails: invalid business calls are
//! absorbed as no-ops and unbalanced releases are clamped. Errors only arise
//! at the edges, while loading and validating configuration. They are all
//! gathered in one `thiserror`-derived enum, with an `ensure!` shorthand for
//! early returns.

use thiserror::Error;

/// The top-level error type used throughout hfdp-rs.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration document is not valid TOML for the expected shape.
    #[error("configuration parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A configuration could not be rendered back to TOML.
    #[error("configuration serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Precondition violated (raised by [`ensure!`](crate::ensure)).
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Shorthand `Result` type used throughout hfdp-rs.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Return `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use hf_core::{ensure, errors::Error};
/// fn workers(n: usize) -> hf_core::errors::Result<usize> {
///     ensure!(n > 0, "at least one worker is required, got {n}");
///     Ok(n)
/// }
/// assert!(workers(4).is_ok());
/// assert!(matches!(workers(0), Err(Error::Precondition(_))));
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}
