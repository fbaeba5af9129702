//! PostgreSQL Credential Adapter
//!
//! Implements [`CredentialStore`] over the `users` table.

use async_trait::async_trait;
use tracing::instrument;

use core_kernel::{DomainPort, PortError};
use domain_billing::{CredentialStore, UserCredentials};

use crate::error::DatabaseError;
use crate::repositories::user::{UserRepository, UserRow};

/// PostgreSQL-backed credential store
#[derive(Debug, Clone)]
pub struct PostgresCredentialStore {
    repository: UserRepository,
}

impl PostgresCredentialStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self {
            repository: UserRepository::new(pool),
        }
    }
}

impl DomainPort for PostgresCredentialStore {}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    #[instrument(skip(self))]
    async fn find_user(&self, username: &str) -> Result<Option<UserCredentials>, PortError> {
        let row = self.repository.find_by_username(username).await?;
        Ok(row.map(row_to_credentials))
    }

    #[instrument(skip(self, password_hash))]
    async fn set_password_hash(&self, username: &str, password_hash: &str) -> Result<(), PortError> {
        match self.repository.set_password_hash(username, password_hash).await {
            Err(DatabaseError::NotFound(_)) => Err(PortError::not_found("User", username)),
            other => Ok(other?),
        }
    }
}

fn row_to_credentials(row: UserRow) -> UserCredentials {
    UserCredentials {
        username: row.username,
        password_hash: row.password_hash,
        roles: row.roles,
        is_active: row.is_active,
    }
}
