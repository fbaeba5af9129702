//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for service billing records, their audit log and
//! the API's user accounts, built on SQLx.
//!
//! # Architecture
//!
//! - [`repositories`] hold the SQL and return plain row structs
//! - [`adapters`] implement the `domain_billing` ports on top of them
//! - [`pool`] creates the connection pool and applies migrations
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresBillingStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/service_billing")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresBillingStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, create_lazy_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::{PostgresBillingStore, PostgresCredentialStore};
