/// Open Library catalog provider
///
/// API Flow:
/// 1. Search: /search.json?q=... → docs with work key, cover id, authors
/// 2. Work: /works/{id}.json → description, subjects
/// 3. Editions: /works/{id}/editions.json → ISBNs
/// 4. Ratings: /works/{id}/ratings.json → average rating
use crate::{
    error::{AppError, AppResult},
    models::{catalog::EditionsResponse, Edition, RatingSummary, WorkDetail},
    services::providers::{ensure_success, CatalogProvider},
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

const PROVIDER_NAME: &str = "open_library";

#[derive(Clone)]
pub struct OpenLibraryProvider {
    http_client: HttpClient,
    api_url: String,
}

impl OpenLibraryProvider {
    pub fn new(http_client: HttpClient, api_url: String) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL of a work resource; keys are joined as `/works/OL...W`
    fn work_url(&self, key: &str, suffix: &str) -> String {
        let key = key.trim();
        if key.starts_with('/') {
            format!("{}{}{}", self.api_url, key, suffix)
        } else {
            format!("{}/{}{}", self.api_url, key, suffix)
        }
    }

    /// GETs a URL and decodes the JSON body, logging the payload on decode failure
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let response = self.http_client.get(url).query(query).send().await?;
        let response = ensure_success(response, "Open Library").await?;

        let response_text = response.text().await?;
        tracing::debug!(url = %url, response = %response_text, "Raw Open Library response");

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                url = %url,
                response = %response_text,
                "Failed to deserialize Open Library response"
            );
            AppError::ExternalApi(format!("Failed to parse Open Library response: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl CatalogProvider for OpenLibraryProvider {
    async fn search_raw(&self, query: &str, limit: usize) -> AppResult<serde_json::Value> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let url = format!("{}/search.json", self.api_url);
        let payload: serde_json::Value = self
            .get_json(
                &url,
                &[("q", query.to_string()), ("limit", limit.to_string())],
            )
            .await?;

        tracing::info!(
            query = %query,
            results = payload["docs"].as_array().map(|d| d.len()).unwrap_or(0),
            provider = PROVIDER_NAME,
            "Catalog search completed"
        );

        Ok(payload)
    }

    async fn get_work(&self, key: &str) -> AppResult<WorkDetail> {
        let url = self.work_url(key, ".json");
        self.get_json(&url, &[]).await
    }

    async fn get_editions(
        &self,
        key: &str,
        limit: usize,
        language: &str,
    ) -> AppResult<Vec<Edition>> {
        let url = self.work_url(key, "/editions.json");
        let editions: EditionsResponse = self
            .get_json(
                &url,
                &[
                    ("limit", limit.to_string()),
                    ("languages", language.to_string()),
                ],
            )
            .await?;
        Ok(editions.entries)
    }

    async fn get_ratings(&self, key: &str) -> AppResult<RatingSummary> {
        let url = self.work_url(key, "/ratings.json");
        self.get_json(&url, &[]).await
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
