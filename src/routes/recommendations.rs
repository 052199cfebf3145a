use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{Candidate, EnrichedBook, RecommendationRequest},
    routes::AppState,
    services::recommendations,
};

/// Handler for raw recommendations from the language model
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> AppResult<Json<Vec<Candidate>>> {
    let Json(request) = payload?;
    let books = recommendations::validate_seeds(request.books)?;

    tracing::info!(
        request_id = %request_id,
        seed_count = books.len(),
        "Processing recommendation request"
    );

    let candidates =
        recommendations::get_recommendations(state.language_model.as_ref(), &books).await?;

    tracing::info!(
        request_id = %request_id,
        candidates = candidates.len(),
        "Recommendations generated"
    );

    Ok(Json(candidates))
}

/// Handler for recommendations enriched with catalog metadata
pub async fn recommend_enriched(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> AppResult<Json<Vec<EnrichedBook>>> {
    let Json(request) = payload?;
    let books = recommendations::validate_seeds(request.books)?;

    tracing::info!(
        request_id = %request_id,
        seed_count = books.len(),
        "Processing enriched recommendation request"
    );

    let enriched = recommendations::get_enriched_recommendations(
        state.language_model.as_ref(),
        &state.enrichment,
        &books,
    )
    .await?;

    tracing::info!(
        request_id = %request_id,
        books = enriched.len(),
        "Enriched recommendations generated"
    );

    Ok(Json(enriched))
}
