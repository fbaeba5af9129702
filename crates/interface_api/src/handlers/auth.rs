//! Login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::info;
use validator::Validate;

use crate::auth::{authenticate, create_token};
use crate::dto::auth::{LoginRequest, LoginResponse};
use crate::{error::ApiError, AppState};

/// Exchanges a username and password for a bearer token
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let user = authenticate(state.credentials.as_ref(), &request.username, &request.password).await?;
    let access_token = create_token(
        &user.username,
        user.roles.clone(),
        &state.config.jwt_secret,
        state.config.jwt_expiration_secs,
    )?;
    info!(user = %user.username, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.jwt_expiration_secs,
        roles: user.roles,
    }))
}
