use crate::{
    error::{AppError, AppResult},
    services::providers::CatalogProvider,
};

/// Number of hits returned by the search proxy
pub const SEARCH_LIMIT: usize = 10;

/// Service function for the catalog search proxy
///
/// Returns the catalog payload as-is so the front end can render its own
/// result list. Upstream failures are logged and reported generically.
pub async fn search_books(
    catalog: &dyn CatalogProvider,
    query: Option<&str>,
) -> AppResult<serde_json::Value> {
    let query = match query.map(str::trim) {
        Some(q) if !q.is_empty() => q,
        _ => return Err(AppError::InvalidInput("Missing query".to_string())),
    };

    catalog.search_raw(query, SEARCH_LIMIT).await.map_err(|e| {
        tracing::error!(
            error = %e,
            query = %query,
            provider = catalog.name(),
            "Catalog search failed"
        );
        AppError::ExternalApi("Failed to fetch books".to_string())
    })
}
