/// Open Library payload types
///
/// Every field is optional in practice, so everything here decodes with
/// defaults. Shape differences (e.g. the two forms of `description`) are
/// resolved while decoding and never leak past this module.
use serde::{Deserialize, Deserializer};

/// One document from `/search.json`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SearchHit {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author_name: Vec<String>,
    #[serde(default)]
    pub cover_i: Option<i64>,
    #[serde(default)]
    pub first_publish_year: Option<i32>,
}

/// Work detail from `/works/{id}.json`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkDetail {
    pub description: Option<String>,
    /// First subject list the work carries, even if empty
    pub subjects: Option<Vec<String>>,
}

/// Open Library returns `description` either as a plain string or as a
/// typed text object `{"type": "/type/text", "value": "..."}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDescription {
    Text(String),
    Typed { value: String },
}

#[derive(Deserialize)]
struct RawWork {
    #[serde(default)]
    description: Option<RawDescription>,
    #[serde(default)]
    subjects: Option<Vec<String>>,
    #[serde(default)]
    subject_places: Option<Vec<String>>,
    #[serde(default)]
    subject_people: Option<Vec<String>>,
    #[serde(default)]
    subject_times: Option<Vec<String>>,
}

impl<'de> Deserialize<'de> for WorkDetail {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawWork::deserialize(deserializer)?;

        let description = raw.description.map(|d| match d {
            RawDescription::Text(text) => text,
            RawDescription::Typed { value } => value,
        });

        let subjects = raw
            .subjects
            .or(raw.subject_places)
            .or(raw.subject_people)
            .or(raw.subject_times);

        Ok(WorkDetail {
            description,
            subjects,
        })
    }
}

/// One entry from `/works/{id}/editions.json`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Edition {
    #[serde(default)]
    pub isbn_13: Vec<String>,
    #[serde(default)]
    pub isbn_10: Vec<String>,
}

impl Edition {
    /// ISBN-13 when present, otherwise ISBN-10
    pub fn preferred_isbn(&self) -> Option<String> {
        self.isbn_13
            .first()
            .or_else(|| self.isbn_10.first())
            .cloned()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EditionsResponse {
    #[serde(default)]
    pub entries: Vec<Edition>,
}

/// `/works/{id}/ratings.json`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RatingSummary {
    #[serde(default)]
    pub summary: RatingStats,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RatingStats {
    #[serde(default)]
    pub average: Option<f64>,
    #[serde(default)]
    pub count: Option<u64>,
}

impl RatingSummary {
    pub fn average(&self) -> Option<f64> {
        self.summary.average
    }
}
