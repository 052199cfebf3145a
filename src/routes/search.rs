use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult, middleware::RequestId, routes::AppState, services::book_search,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
}

/// Handler for the catalog search proxy
pub async fn search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<serde_json::Value>> {
    tracing::info!(
        request_id = %request_id,
        query = ?params.q,
        "Processing search request"
    );

    let payload = book_search::search_books(state.catalog.as_ref(), params.q.as_deref()).await?;
    Ok(Json(payload))
}
