use std::fmt::Display;
use std::sync::Arc;

use crate::{
    error::AppError,
    models::{
        Candidate, EnrichedBook, PublishYear, Rating, SearchHit, MAX_SUBJECTS, PLACEHOLDER_COVER,
    },
    services::providers::CatalogProvider,
};

/// Language filter for edition lookups
pub const EDITION_LANGUAGE: &str = "eng";

/// Catalog lookup that fed a field of an enriched book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentStage {
    Search,
    Work,
    Editions,
    Ratings,
}

impl Display for EnrichmentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrichmentStage::Search => write!(f, "search"),
            EnrichmentStage::Work => write!(f, "work"),
            EnrichmentStage::Editions => write!(f, "editions"),
            EnrichmentStage::Ratings => write!(f, "ratings"),
        }
    }
}

/// Turns language-model candidates into display-ready books
///
/// Each candidate runs search → (work, editions, ratings). A failed lookup only
/// resets the fields it would have filled; a candidate never fails as a whole.
#[derive(Clone)]
pub struct EnrichmentService {
    catalog: Arc<dyn CatalogProvider>,
    covers_url: String,
}

impl EnrichmentService {
    pub fn new(catalog: Arc<dyn CatalogProvider>, covers_url: String) -> Self {
        Self {
            catalog,
            covers_url: covers_url.trim_end_matches('/').to_string(),
        }
    }

    /// Medium-size cover URL for a catalog cover id
    pub fn cover_url(&self, cover_id: i64) -> String {
        format!("{}/b/id/{}-M.jpg", self.covers_url, cover_id)
    }

    /// Enriches all candidates concurrently, keeping input order
    pub async fn enrich_batch(&self, candidates: Vec<Candidate>) -> Vec<EnrichedBook> {
        tracing::info!(
            candidates = candidates.len(),
            provider = self.catalog.name(),
            "Enriching recommendations"
        );

        let tasks: Vec<_> = candidates
            .iter()
            .cloned()
            .map(|candidate| {
                let service = self.clone();
                tokio::spawn(async move { service.enrich_candidate(&candidate).await })
            })
            .collect();

        let mut books = Vec::with_capacity(candidates.len());
        for (candidate, task) in candidates.iter().zip(tasks) {
            match task.await {
                Ok(book) => books.push(book),
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        title = %candidate.title,
                        "Enrichment task failed"
                    );
                    books.push(EnrichedBook::from_candidate(candidate));
                }
            }
        }

        books
    }

    /// Enriches one candidate with catalog metadata
    pub async fn enrich_candidate(&self, candidate: &Candidate) -> EnrichedBook {
        let query = format!("{} {}", candidate.title, candidate.author);

        let hit = match self.catalog.search(query.trim(), 1).await {
            Ok(hits) => hits.into_iter().next().unwrap_or_default(),
            Err(e) => {
                log_field_failure(EnrichmentStage::Search, query.trim(), &e);
                return EnrichedBook::from_candidate(candidate);
            }
        };

        let mut book = self.merge_search_hit(candidate, &hit);

        let Some(key) = hit.key.as_deref() else {
            tracing::debug!(title = %candidate.title, "No catalog key, skipping detail lookups");
            return book;
        };

        let (work, editions, ratings) = tokio::join!(
            self.catalog.get_work(key),
            self.catalog.get_editions(key, 1, EDITION_LANGUAGE),
            self.catalog.get_ratings(key),
        );

        match work {
            Ok(work) => {
                if let Some(description) = work.description.filter(|d| !d.trim().is_empty()) {
                    book.synopsis = description;
                }
                if let Some(subjects) = work.subjects {
                    book.subjects = subjects.into_iter().take(MAX_SUBJECTS).collect();
                }
            }
            Err(e) => log_field_failure(EnrichmentStage::Work, key, &e),
        }

        match editions {
            Ok(editions) => {
                book.isbn = editions.first().and_then(|edition| edition.preferred_isbn());
            }
            Err(e) => log_field_failure(EnrichmentStage::Editions, key, &e),
        }

        match ratings {
            Ok(ratings) => {
                if let Some(average) = ratings.average() {
                    book.rating = Rating::Average(average);
                }
            }
            Err(e) => log_field_failure(EnrichmentStage::Ratings, key, &e),
        }

        tracing::debug!(
            key = %key,
            title = %book.title,
            isbn = ?book.isbn,
            "Candidate enriched"
        );

        book
    }

    /// Fills the search-derived fields, falling back to the candidate
    fn merge_search_hit(&self, candidate: &Candidate, hit: &SearchHit) -> EnrichedBook {
        let mut book = EnrichedBook::from_candidate(candidate);

        if let Some(title) = hit.title.as_ref().filter(|t| !t.is_empty()) {
            book.title = title.clone();
        }
        if let Some(author) = hit.author_name.first() {
            book.author = author.clone();
        }
        book.cover = hit
            .cover_i
            .map(|id| self.cover_url(id))
            .unwrap_or_else(|| PLACEHOLDER_COVER.to_string());
        book.first_publish_year = hit
            .first_publish_year
            .map(PublishYear::Year)
            .unwrap_or(PublishYear::Unknown);

        book
    }
}

fn log_field_failure(stage: EnrichmentStage, lookup: &str, error: &AppError) {
    tracing::warn!(
        stage = %stage,
        lookup = %lookup,
        error = %error,
        "Catalog lookup failed, using fallback"
    );
}
