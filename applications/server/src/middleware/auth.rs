/// Token authentication middleware
use crate::{error::ServerError, state::AppState};
use accounts_core::User;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

/// Authorization schemes accepted in front of a token key
const TOKEN_KEYWORDS: [&str; 2] = ["Token", "Bearer"];

const NOT_PROVIDED: &str = "Authentication credentials were not provided.";

/// Extension type holding the authenticated account
/// Can be used as an extractor in handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    pub fn user(&self) -> &User {
        &self.0
    }
}

/// Middleware that resolves the token in the Authorization header to a user
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let key = token_from_headers(request.headers())?
        .ok_or_else(|| ServerError::NotAuthenticated(NOT_PROVIDED.to_string()))?;

    let user = app_state
        .accounts
        .user_for_token(&key)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Rejected unknown token");
            ServerError::NotAuthenticated("Invalid token.".to_string())
        })?;

    if !user.is_active {
        return Err(ServerError::NotAuthenticated(
            "User inactive or deleted.".to_string(),
        ));
    }

    request.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(request).await)
}

/// Extract the token key from `Authorization: Token <key>` (or `Bearer <key>`)
///
/// A missing header or a foreign scheme yields `Ok(None)`; a recognised
/// scheme with a malformed credential is an error.
fn token_from_headers(headers: &HeaderMap) -> Result<Option<String>, ServerError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let raw = String::from_utf8_lossy(value.as_bytes());
    let mut parts = raw.split_whitespace();

    let Some(scheme) = parts.next() else {
        return Ok(None);
    };
    if !TOKEN_KEYWORDS
        .iter()
        .any(|keyword| keyword.eq_ignore_ascii_case(scheme))
    {
        return Ok(None);
    }

    let key = parts.next().ok_or_else(|| {
        ServerError::NotAuthenticated("Invalid token header. No credentials provided.".to_string())
    })?;

    if parts.next().is_some() {
        return Err(ServerError::NotAuthenticated(
            "Invalid token header. Token string should not contain spaces.".to_string(),
        ));
    }

    if value.to_str().is_err() {
        return Err(ServerError::NotAuthenticated(
            "Invalid token header. Token string should not contain invalid characters."
                .to_string(),
        ));
    }

    Ok(Some(key.to_string()))
}

/// Implement FromRequestParts so AuthenticatedUser can be used as an extractor
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ServerError::NotAuthenticated(NOT_PROVIDED.to_string()))
    }
}
