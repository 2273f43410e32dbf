//! Error types for the search.
//!
//! Budget exhaustion, numeric instability and operator no-ops are not errors:
//! they surface as worst-case fitness or as an unchanged tree.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A tree cannot be created within the requested bounds.
    #[error("cannot create a tree with max_depth={max_depth}, max_length={max_length}: {reason}")]
    ConstraintViolation {
        max_depth: usize,
        max_length: usize,
        reason: &'static str,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The dataset, target or row ranges do not describe a usable problem.
    #[error("invalid problem: {0}")]
    InvalidProblem(String),

    /// The worker pool could not be built.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// `ensure!`-style early return with an [`Error::InvalidConfig`].
macro_rules! ensure_config {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::Error::InvalidConfig(format!($($arg)+)));
        }
    };
}

pub(crate) use ensure_config;
