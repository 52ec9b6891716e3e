/// API route modules
pub mod health;
pub mod serializers;
pub mod users;

use crate::{error::ServerError, middleware, state::AppState};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Build the full application router
pub fn router(app_state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health))
        .route(
            "/users/create/",
            post(users::create_user).fallback(users::method_not_allowed),
        )
        .route(
            "/users/token/",
            post(users::create_token).fallback(users::method_not_allowed),
        );

    // Protected routes (token required)
    let protected_routes = Router::new()
        .route(
            "/users/me/",
            get(users::retrieve_me)
                .patch(users::partial_update_me)
                .put(users::update_me)
                .fallback(users::method_not_allowed),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            middleware::auth_middleware,
        ));

    public_routes
        .merge(protected_routes)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

async fn not_found() -> ServerError {
    ServerError::NotFound("Not found.".to_string())
}
