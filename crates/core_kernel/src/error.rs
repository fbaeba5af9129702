//! Core error types used across the system

use thiserror::Error;
use crate::money::MoneyError;

/// Core error type for the kernel
#[derive(Debug, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A key part was empty after trimming
    #[error("{0} must not be blank")]
    BlankCode(&'static str),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),
}
