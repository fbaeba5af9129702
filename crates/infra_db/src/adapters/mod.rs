//! Domain Adapters
//!
//! PostgreSQL implementations of the billing domain ports. Each adapter
//! wraps a repository and translates between row types and domain models.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::{PostgresBillingStore, PostgresCredentialStore};
//!
//! let billing = PostgresBillingStore::new(pool.clone());
//! let users = PostgresCredentialStore::new(pool);
//! ```

pub mod billing;
pub mod user;

pub use billing::{PgBillingUnitOfWork, PostgresBillingStore};
pub use user::PostgresCredentialStore;
