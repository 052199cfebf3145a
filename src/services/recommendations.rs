use crate::{
    error::{AppError, AppResult},
    models::{Candidate, EnrichedBook, SeedBook},
    services::{providers::LanguageModel, EnrichmentService},
};

/// Number of books the model is asked to recommend
pub const RECOMMENDATION_COUNT: usize = 6;

const NO_BOOKS_MESSAGE: &str = "No books provided. Please select at least one book.";

/// Rejects an absent or empty seed list
pub fn validate_seeds(books: Option<Vec<SeedBook>>) -> AppResult<Vec<SeedBook>> {
    match books {
        Some(books) if !books.is_empty() => Ok(books),
        _ => Err(AppError::InvalidInput(NO_BOOKS_MESSAGE.to_string())),
    }
}

/// Builds the recommendation prompt for the given seed books
pub fn build_prompt(books: &[SeedBook]) -> String {
    let seeds = books
        .iter()
        .map(|book| format!("\"{}\" by {}", book.title, book.author))
        .collect::<Vec<_>>()
        .join(" and ");

    format!(
        r#"I'd like recommendations for {count} books similar to {seeds}.

Please focus on books that share similar themes, writing style, character development, or overall tone. If possible, prioritize books with related contexts or narrative structures.

Each recommendation should be returned in a JSON array with the following structure:
[
  {{
    "title": "Recommended Book Title",
    "author": "Author Name",
    "why": "Short explanation (max 200 words) on how it relates to the selected books."
  }}
]

Return **only** valid JSON with no extra text.
Treat each new prompt as a new request and do not use the context of books requested earlier."#,
        count = RECOMMENDATION_COUNT,
        seeds = seeds,
    )
}

/// Removes Markdown code fences (```json and ```) wherever they appear
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parses a model completion into candidates
///
/// Invalid JSON and JSON that is not an array both yield
/// `MalformedModelResponse` carrying the fence-stripped text. Array entries
/// are not validated; anything that is not an object becomes an empty
/// candidate and is filled in by enrichment.
pub fn parse_candidates(completion: &str) -> AppResult<Vec<Candidate>> {
    if completion.is_empty() {
        return Err(AppError::EmptyModelResponse);
    }

    let cleaned = strip_code_fences(completion);
    tracing::debug!(cleaned = %cleaned, "Cleaned model response");

    let malformed = |reason: String| {
        tracing::error!(
            reason = %reason,
            raw_response = %cleaned,
            "Failed to parse model response"
        );
        AppError::MalformedModelResponse {
            reason,
            raw_response: cleaned.clone(),
        }
    };

    let value: serde_json::Value =
        serde_json::from_str(&cleaned).map_err(|e| malformed(e.to_string()))?;

    let serde_json::Value::Array(items) = value else {
        return Err(malformed(
            "Unexpected response format. Expected an array.".to_string(),
        ));
    };

    Ok(items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect())
}

/// Asks the language model for books similar to the seeds
pub async fn get_recommendations(
    model: &dyn LanguageModel,
    books: &[SeedBook],
) -> AppResult<Vec<Candidate>> {
    if books.is_empty() {
        return Err(AppError::InvalidInput(NO_BOOKS_MESSAGE.to_string()));
    }

    let prompt = build_prompt(books);
    let completion = model.generate_text(&prompt).await?;

    tracing::debug!(
        model = %model.model_name(),
        response = %completion,
        "Raw model response"
    );

    let candidates = parse_candidates(&completion)?;

    tracing::info!(
        seeds = books.len(),
        candidates = candidates.len(),
        "Parsed recommendations"
    );

    Ok(candidates)
}

/// Full flow: ask the model, then enrich every candidate from the catalog
///
/// Enrichment starts only after the candidate list is complete; the returned
/// books follow candidate order.
pub async fn get_enriched_recommendations(
    model: &dyn LanguageModel,
    enrichment: &EnrichmentService,
    books: &[SeedBook],
) -> AppResult<Vec<EnrichedBook>> {
    let candidates = get_recommendations(model, books).await?;
    Ok(enrichment.enrich_batch(candidates).await)
}
