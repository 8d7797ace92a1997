pub mod admin_routes;
pub mod auth_routes;
pub mod book_routes;
pub mod cart_routes;
pub mod comment_routes;
pub mod order_routes;
pub mod profile_routes;

use axum::{middleware, response::Response, routing::get, Extension, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::entities::account::Role;
use crate::middleware::{
    auth::{auth_middleware, AuthState, JwtSecret},
    logging::{logging_middleware, to_response},
};

pub fn api_router(db: Arc<DatabaseConnection>, secret: Arc<str>) -> Router {
    let guard = |role: Role| {
        middleware::from_fn_with_state(
            AuthState {
                db: db.clone(),
                role,
                secret: secret.clone(),
            },
            auth_middleware,
        )
    };

    let user_routes = Router::new()
        .merge(cart_routes::cart_routes())
        .merge(order_routes::order_routes())
        .merge(profile_routes::profile_routes())
        .merge(comment_routes::comment_routes())
        .layer(guard(Role::User));

    let admin_routes = admin_routes::admin_routes().layer(guard(Role::Admin));

    Router::new()
        .route("/", get(health_check))
        .merge(auth_routes::auth_routes())
        .nest("/api", book_routes::book_routes().merge(user_routes))
        .nest("/api/admin", admin_routes)
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(JwtSecret(secret.clone())))
        .layer(Extension(db))
}

async fn health_check() -> Response {
    to_response("OK", Ok(()))
}
