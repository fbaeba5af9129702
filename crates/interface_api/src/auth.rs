//! Authentication and authorization
//!
//! Users log in with a username and password checked against a bcrypt hash
//! from the [`CredentialStore`]. A successful login yields an HS256 JWT whose
//! subject is the username; handlers use that subject as the audit actor.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use core_kernel::PortError;
use domain_billing::{CredentialStore, UserCredentials};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// User's roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing permission: {0}")]
    MissingPermission(String),
    /// Unknown user, wrong password and inactive account all look the same
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
    #[error("Credential store error: {0}")]
    Store(#[from] PortError),
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `username` - Subject of the token
/// * `roles` - User's roles
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    username: &str,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: username.to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Checks if user has required role
pub fn has_role(claims: &Claims, required_role: &str) -> bool {
    claims
        .roles
        .iter()
        .any(|r| r == required_role || r == permissions::ADMIN)
}

/// Fails with `MissingPermission` unless the claims grant `permission`
pub fn require_permission(claims: &Claims, permission: &str) -> Result<(), AuthError> {
    if has_role(claims, permission) {
        Ok(())
    } else {
        warn!(user = %claims.sub, permission, "Permission denied");
        Err(AuthError::MissingPermission(permission.to_string()))
    }
}

/// Hashes a password with bcrypt at the default cost
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
}

/// Checks a password against a stored bcrypt hash
///
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password, password_hash).unwrap_or(false)
}

/// Verified in place of a real hash when the user is missing or inactive
const DUMMY_HASH: &str = "$2a$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW";

/// Checks a username and password against the credential store
///
/// Every attempt runs exactly one bcrypt verification on the blocking pool.
pub async fn authenticate(
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
) -> Result<UserCredentials, AuthError> {
    authenticate_with(store, username, password, verify_password).await
}

async fn authenticate_with<V>(
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
    verify: V,
) -> Result<UserCredentials, AuthError>
where
    V: Fn(&str, &str) -> bool + Send + 'static,
{
    let user = store.find_user(username).await?;
    let stored_hash = user
        .as_ref()
        .filter(|u| u.is_active)
        .map_or(DUMMY_HASH, |u| u.password_hash.as_str())
        .to_string();
    let candidate = password.to_string();

    let matched = tokio::task::spawn_blocking(move || verify(&candidate, &stored_hash))
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "Password verification task failed");
            false
        });

    match user {
        Some(user) if user.is_active && matched => Ok(user),
        Some(_) => {
            warn!(user = %username, "Login rejected");
            Err(AuthError::InvalidCredentials)
        }
        None => {
            warn!(user = %username, "Login for unknown user");
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Permission definitions
pub mod permissions {
    /// Grants every permission
    pub const ADMIN: &str = "admin";
    pub const BILLING_WRITE: &str = "billing:write";
    pub const BILLING_IMPORT: &str = "billing:import";
}
