use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{CredentialsRequest, TokenResponse},
        extractors::AuthUser,
        repo_types::User,
    },
    error::ApiError,
    extract::Json,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users", get(list_users).post(create_user))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .credentials
        .register(&payload.email, &payload.password)
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .credentials
        .verify_credentials(&payload.email, &payload.password)
        .await
        .map_err(|e| {
            warn!(error = %e, "login failed");
            ApiError::from(e)
        })?;

    let token = state.tokens.issue(user.id)?;

    info!(
        user_id = %user.id,
        ttl_minutes = state.tokens.ttl().whole_minutes(),
        "user logged in"
    );
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(users))
}

/// Open user creation: no auth and no existence pre-check, unlike `/register`.
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .credentials
        .create_user(&payload.email, &payload.password)
        .await?;

    info!(user_id = %user.id, "user created");
    Ok(Json(user))
}
