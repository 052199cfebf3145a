use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    config::Config,
    error::AppResult,
    models::Bookshelf,
    services::{
        providers::{
            build_http_client, CatalogProvider, GeminiProvider, LanguageModel,
            OpenLibraryProvider,
        },
        EnrichmentService,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogProvider>,
    pub language_model: Arc<dyn LanguageModel>,
    pub enrichment: EnrichmentService,
    /// Session state of the front end, starts empty
    pub bookshelf: Arc<RwLock<Bookshelf>>,
}

impl AppState {
    /// Creates application state around the given providers
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        language_model: Arc<dyn LanguageModel>,
        covers_url: String,
    ) -> Self {
        Self {
            enrichment: EnrichmentService::new(catalog.clone(), covers_url),
            catalog,
            language_model,
            bookshelf: Arc::new(RwLock::new(Bookshelf::new())),
        }
    }

    /// Wires the Open Library and Gemini providers from configuration
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let http_client = build_http_client(config.request_timeout_secs)?;

        let catalog = Arc::new(OpenLibraryProvider::new(
            http_client.clone(),
            config.catalog_api_url.clone(),
        ));
        let language_model = Arc::new(GeminiProvider::new(
            http_client,
            config.gemini_api_key.clone(),
            config.gemini_api_url.clone(),
            config.gemini_model.clone(),
        ));

        tracing::info!(
            catalog = %config.catalog_api_url,
            model = %config.gemini_model,
            timeout_secs = config.request_timeout_secs,
            "Providers configured"
        );

        Ok(Self::new(catalog, language_model, config.covers_url.clone()))
    }
}
