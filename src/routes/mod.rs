use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

pub mod bookshelf;
pub mod recommendations;
pub mod search;
mod state;

pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search::search))
        .route("/recommend", post(recommendations::recommend))
        .route("/recommend/enriched", post(recommendations::recommend_enriched))
        // Bookshelf session state
        .route(
            "/bookshelf",
            get(bookshelf::get_bookshelf).delete(bookshelf::clear_bookshelf),
        )
        .route("/bookshelf/books", post(bookshelf::add_book))
        .route("/bookshelf/books/:id", delete(bookshelf::remove_book))
        .route(
            "/bookshelf/recommendations",
            post(bookshelf::refresh_recommendations),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
