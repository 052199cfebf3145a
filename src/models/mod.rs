use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod bookshelf;
pub mod catalog;

pub use bookshelf::{Bookshelf, ShelfEntry};
pub use catalog::{Edition, RatingSummary, SearchHit, WorkDetail};

/// Synopsis used when the catalog has no description for a work
pub const NO_SYNOPSIS: &str = "No synopsis available.";

/// Subject list used when the catalog has no subjects for a work
pub const NO_SUBJECTS: &str = "N/A";

/// Cover path used when the catalog has no cover for a work
pub const PLACEHOLDER_COVER: &str = "/placeholder.jpg";

/// Maximum number of subjects kept on an enriched book
pub const MAX_SUBJECTS: usize = 5;

/// A book the user picked as a taste anchor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedBook {
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

impl SeedBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            cover: None,
        }
    }
}

/// A raw suggestion from the language model
///
/// Fields are taken as-is from the model reply. Missing or `null` fields
/// decode to empty strings and other scalars are stringified; enrichment
/// applies the fallbacks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Candidate {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub author: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub why: String,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    })
}

/// First publication year, or the "Unknown" sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishYear {
    Year(i32),
    Unknown,
}

impl Serialize for PublishYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PublishYear::Year(year) => serializer.serialize_i32(*year),
            PublishYear::Unknown => serializer.serialize_str("Unknown"),
        }
    }
}

/// Average reader rating, or the "No rating" sentinel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rating {
    Average(f64),
    NoRating,
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Rating::Average(average) => serializer.serialize_f64(*average),
            Rating::NoRating => serializer.serialize_str("No rating"),
        }
    }
}

/// A recommendation merged with catalog metadata, ready for display
///
/// Every field has a fallback, so a record built from a candidate alone is
/// still complete.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnrichedBook {
    pub title: String,
    pub author: String,
    pub cover: String,
    pub why: String,
    pub isbn: Option<String>,
    pub first_publish_year: PublishYear,
    pub subjects: Vec<String>,
    pub synopsis: String,
    pub rating: Rating,
}

impl EnrichedBook {
    /// Builds the record used when no catalog data could be fetched
    pub fn from_candidate(candidate: &Candidate) -> Self {
        Self {
            title: candidate.title.clone(),
            author: non_empty_or_unknown(&candidate.author),
            cover: PLACEHOLDER_COVER.to_string(),
            why: candidate.why.clone(),
            isbn: None,
            first_publish_year: PublishYear::Unknown,
            subjects: vec![NO_SUBJECTS.to_string()],
            synopsis: NO_SYNOPSIS.to_string(),
            rating: Rating::NoRating,
        }
    }
}

fn non_empty_or_unknown(value: &str) -> String {
    if value.trim().is_empty() {
        "Unknown".to_string()
    } else {
        value.to_string()
    }
}

/// Request body shared by the recommendation endpoints
#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub books: Option<Vec<SeedBook>>,
}
