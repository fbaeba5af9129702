//! Repository implementations
//!
//! Repositories own the SQL and map rows to plain row structs. Conversion
//! into domain types happens in [`crate::adapters`].
//!
//! Queries are built at runtime with `sqlx::query_as` and `QueryBuilder`,
//! so the crate builds without a live database.

pub mod billing;
pub mod user;

pub use billing::BillingRepository;
pub use user::UserRepository;
