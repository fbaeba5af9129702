//! User repository
//!
//! Login accounts for the API. Passwords are stored as bcrypt hashes;
//! hashing happens in the API layer.

use sqlx::{FromRow, PgPool};

use crate::error::DatabaseError;

/// Row of the `users` table
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserRow {
    pub username: String,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub is_active: bool,
}

/// Repository for login accounts
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Looks up a user by exact username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserRow>, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT username, password_hash, roles, is_active FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Replaces the stored password hash
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no such user exists
    pub async fn set_password_hash(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE username = $1")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("User", username));
        }
        Ok(())
    }

    /// Creates a user
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::DuplicateEntry` if the username is taken
    pub async fn insert(&self, user: &UserRow) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO users (username, password_hash, roles, is_active) VALUES ($1, $2, $3, $4)",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.roles)
        .bind(user.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
