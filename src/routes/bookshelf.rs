use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{Bookshelf, EnrichedBook, SeedBook, ShelfEntry},
    routes::AppState,
    services::recommendations,
};

/// Get the current bookshelf
pub async fn get_bookshelf(State(state): State<AppState>) -> Json<Bookshelf> {
    let bookshelf = state.bookshelf.read().await;
    Json(bookshelf.clone())
}

/// Put a seed book on the shelf
pub async fn add_book(
    State(state): State<AppState>,
    payload: Result<Json<SeedBook>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ShelfEntry>)> {
    let Json(book) = payload?;
    if book.title.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Book title cannot be empty".to_string(),
        ));
    }

    let entry = state.bookshelf.write().await.add_book(book);
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Take a seed book off the shelf
pub async fn remove_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.bookshelf.write().await.remove_book(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("No book with id {} on the shelf", id)))
    }
}

/// Reset the shelf to empty
pub async fn clear_bookshelf(State(state): State<AppState>) -> StatusCode {
    state.bookshelf.write().await.clear();
    StatusCode::NO_CONTENT
}

/// Generate recommendations from the books currently on the shelf
pub async fn refresh_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<Vec<EnrichedBook>>> {
    // Snapshot so the lock is not held across upstream calls
    let (seeds, generation) = {
        let shelf = state.bookshelf.read().await;
        (shelf.seeds(), shelf.generation())
    };
    if seeds.is_empty() {
        return Err(AppError::InvalidInput(
            "Please add books first.".to_string(),
        ));
    }

    tracing::info!(
        request_id = %request_id,
        seed_count = seeds.len(),
        "Refreshing bookshelf recommendations"
    );

    let enriched = recommendations::get_enriched_recommendations(
        state.language_model.as_ref(),
        &state.enrichment,
        &seeds,
    )
    .await?;

    let stored = state
        .bookshelf
        .write()
        .await
        .set_recommendations(generation, enriched.clone());
    if !stored {
        tracing::info!(
            request_id = %request_id,
            "Shelf changed during refresh, recommendations not stored"
        );
    }

    Ok(Json(enriched))
}
