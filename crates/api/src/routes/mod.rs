//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};

pub mod auth;
pub mod health;
pub mod notifications;
pub mod organizations;
pub mod roles;
pub mod transactions;
pub mod users;

/// Creates the API router, wrapping protected routes in the auth middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(users::protected_routes())
        .merge(roles::routes())
        .merge(organizations::routes())
        .merge(transactions::routes())
        .merge(notifications::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(users::public_routes())
        .merge(protected_routes)
}
