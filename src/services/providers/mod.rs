/// External data providers
///
/// Two black-box upstreams sit behind these traits: the bibliographic catalog
/// (Open Library) and the text-generation model (Gemini). The recommendation
/// and enrichment services only ever see the traits, so tests swap in mocks.
use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::{
    error::{AppError, AppResult},
    models::{Edition, RatingSummary, SearchHit, WorkDetail},
};

pub mod gemini;
pub mod open_library;

pub use gemini::GeminiProvider;
pub use open_library::OpenLibraryProvider;

/// Read-only access to a bibliographic catalog
///
/// Each call is a single request with no retry. Callers decide how to recover
/// from failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Full-text search returning the catalog's payload untouched
    async fn search_raw(&self, query: &str, limit: usize) -> AppResult<serde_json::Value>;

    /// Full-text search decoded into hits
    ///
    /// Documents that fail to decode are skipped rather than failing the search.
    async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<SearchHit>> {
        let payload = self.search_raw(query, limit).await?;
        Ok(parse_search_hits(&payload))
    }

    /// Work detail (description and subjects) by catalog key
    async fn get_work(&self, key: &str) -> AppResult<WorkDetail>;

    /// Editions of a work, filtered by language
    async fn get_editions(&self, key: &str, limit: usize, language: &str)
        -> AppResult<Vec<Edition>>;

    /// Reader rating summary of a work
    async fn get_ratings(&self, key: &str) -> AppResult<RatingSummary>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Text completion from a generative language model
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Sends a single stateless prompt and returns the completion text
    ///
    /// An empty string means the model produced no text.
    async fn generate_text(&self, prompt: &str) -> AppResult<String>;

    /// Model identifier for logging
    fn model_name(&self) -> String;
}

/// Extracts the `docs` array of a search payload into typed hits
pub fn parse_search_hits(payload: &serde_json::Value) -> Vec<SearchHit> {
    payload["docs"]
        .as_array()
        .map(|docs| {
            docs.iter()
                .filter_map(|doc| serde_json::from_value::<SearchHit>(doc.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Builds the HTTP client shared by all providers
///
/// The timeout bounds every request so a hung upstream surfaces as an
/// ordinary fetch failure.
pub fn build_http_client(timeout_secs: u64) -> AppResult<HttpClient> {
    HttpClient::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

/// Turns a non-success response into an `ExternalApi` error
pub(crate) async fn ensure_success(
    response: reqwest::Response,
    provider: &str,
) -> AppResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AppError::ExternalApi(format!(
        "{} API returned status {}: {}",
        provider, status, body
    )))
}
