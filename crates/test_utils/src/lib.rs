//! Test Utilities Crate
//!
//! Shared test infrastructure, fixtures, and helpers for the service
//! billing test suites.
//!
//! # Modules
//!
//! - `fixtures`: Canonical keys, amounts, dates and strings
//! - `builders`: Builders for billing records and editable fields
//! - `database`: PostgreSQL testcontainer management
//! - `assertions`: Assertion helpers for audit entries and editor errors

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
