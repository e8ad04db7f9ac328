//! Chanakya API - HTTP chat server
//!
//! Serves the chat endpoint, the single-page frontend and its static
//! assets, a health check and the OpenAPI document.
//!
//! Author: hephaex@gmail.com

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    routing::{get, post},
    Json, Router,
};
use middleware::{static_guard, StaticGuard};
use state::AppState;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// OpenAPI document for the JSON endpoints
#[derive(OpenApi)]
#[openapi(
    info(title = "Chanakya API", description = "Ask Chanakya about the Arthashastra"),
    paths(handlers::chat::chat_handler, handlers::health::health_check),
    components(schemas(
        handlers::chat::ChatRequest,
        handlers::chat::ChatResponse,
        handlers::health::HealthResponse,
        error::ApiError
    )),
    tags(
        (name = "chat", description = "Persona chat"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.server.static_dir.clone();
    let index_file = static_dir.join("index.html");
    let guard = Arc::new(StaticGuard::new(&static_dir, &[state.config.index.path.as_path()]));
    let static_files = ServiceBuilder::new()
        .layer(axum::middleware::from_fn_with_state(guard, static_guard))
        .service(ServeDir::new(static_dir));

    let mut router = Router::new()
        .route("/chat", post(handlers::chat::chat_handler))
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route_service("/", ServeFile::new(index_file))
        .nest_service("/static", static_files)
        .with_state(state.clone());

    if state.config.server.cors_enabled {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.layer(TraceLayer::new_for_http())
}
