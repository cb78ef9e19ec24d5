//! Router construction for the Costwatch assistant server.

use std::sync::Arc;

use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use costwatch_agent::ChatPipeline;
use costwatch_core::executor::QueryExecutor;

use crate::handlers;
use crate::middleware::jwt::{jwt_auth, JwtConfig};

/// Build the full axum router with all routes and middleware.
pub fn build_router(
    executor: Arc<QueryExecutor>,
    pipeline: Arc<ChatPipeline>,
    jwt_config: JwtConfig,
) -> Router {
    // Routes that require JWT authentication
    let protected = Router::new()
        .route(
            "/assistant/templates",
            get(handlers::templates::list_templates),
        )
        .route("/assistant/query", post(handlers::query::run_query))
        .route("/assistant/chat", post(handlers::chat::chat))
        .layer(axum_mw::from_fn(jwt_auth))
        .layer(Extension(jwt_config));

    // Public routes (no auth)
    let public = Router::new().route("/health", get(handlers::health::health));

    public
        .merge(protected)
        .layer(Extension(executor))
        .layer(Extension(pipeline))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
