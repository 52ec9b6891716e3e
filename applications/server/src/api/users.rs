/// User account API routes
use crate::{
    api::serializers::{self, TokenRepresentation, UserRepresentation},
    error::{Result, ServerError},
    extract::JsonBody,
    middleware::AuthenticatedUser,
    state::AppState,
};
use accounts_core::User;
use axum::{extract::State, http::Method, http::StatusCode, Json};
use serde_json::Value;

/// POST /users/create/
pub async fn create_user(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<Value>,
) -> Result<(StatusCode, Json<UserRepresentation>)> {
    let validated = serializers::validate_create(&app_state.accounts, &payload).await?;
    let user = serializers::create(&app_state.accounts, validated).await?;

    Ok((StatusCode::CREATED, Json(UserRepresentation::from(&user))))
}

/// POST /users/token/
pub async fn create_token(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<Value>,
) -> Result<Json<TokenRepresentation>> {
    let credentials = serializers::validate_credentials(&payload)?;

    let user = app_state
        .accounts
        .authenticate(&credentials.email, &credentials.password)
        .await?
        .ok_or_else(serializers::authentication_failed)?;

    let token = app_state.accounts.obtain_token(&user).await?;

    Ok(Json(TokenRepresentation { token: token.key }))
}

/// GET /users/me/
pub async fn retrieve_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<UserRepresentation> {
    Json(UserRepresentation::from(&user))
}

/// PATCH /users/me/
pub async fn partial_update_me(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    JsonBody(payload): JsonBody<Value>,
) -> Result<Json<UserRepresentation>> {
    update_me_with(&app_state, &user, &payload, true).await
}

/// PUT /users/me/
pub async fn update_me(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    JsonBody(payload): JsonBody<Value>,
) -> Result<Json<UserRepresentation>> {
    update_me_with(&app_state, &user, &payload, false).await
}

/// Fallback for methods a user route does not serve
pub async fn method_not_allowed(method: Method) -> ServerError {
    ServerError::MethodNotAllowed(method.to_string())
}

async fn update_me_with(
    app_state: &AppState,
    user: &User,
    payload: &Value,
    partial: bool,
) -> Result<Json<UserRepresentation>> {
    let validated = serializers::validate_update(&app_state.accounts, user, payload, partial).await?;
    let updated = serializers::update(&app_state.accounts, user, validated).await?;

    Ok(Json(UserRepresentation::from(&updated)))
}
