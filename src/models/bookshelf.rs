use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{EnrichedBook, SeedBook};

/// A seed book placed on the shelf
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ShelfEntry {
    /// Identifier used to remove the entry
    pub id: Uuid,
    #[serde(flatten)]
    pub book: SeedBook,
}

/// Session state of the front end: the books the user picked and the last
/// batch of recommendations generated from them
#[derive(Debug, Clone, Serialize, Default)]
pub struct Bookshelf {
    pub books: Vec<ShelfEntry>,
    pub recommendations: Vec<EnrichedBook>,
    pub recommended_at: Option<DateTime<Utc>>,
    /// Bumped on every change to `books`
    #[serde(skip)]
    generation: u64,
}

impl Bookshelf {
    /// Creates an empty shelf
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a seed book and returns its entry
    pub fn add_book(&mut self, book: SeedBook) -> ShelfEntry {
        let entry = ShelfEntry {
            id: Uuid::new_v4(),
            book,
        };
        self.books.push(entry.clone());
        self.generation += 1;
        entry
    }

    /// Removes the entry with the given id, returning whether it existed
    pub fn remove_book(&mut self, id: Uuid) -> bool {
        let before = self.books.len();
        self.books.retain(|entry| entry.id != id);
        let removed = self.books.len() != before;
        if removed {
            self.generation += 1;
        }
        removed
    }

    /// Current shelf generation, to pair with a `seeds()` snapshot
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Seed books in shelf order
    pub fn seeds(&self) -> Vec<SeedBook> {
        self.books.iter().map(|entry| entry.book.clone()).collect()
    }

    /// Stores a freshly enriched batch generated from the shelf at
    /// `generation`
    ///
    /// Returns false and leaves the shelf untouched when the books changed
    /// since that snapshot.
    pub fn set_recommendations(
        &mut self,
        generation: u64,
        recommendations: Vec<EnrichedBook>,
    ) -> bool {
        if generation != self.generation {
            return false;
        }
        self.recommendations = recommendations;
        self.recommended_at = Some(Utc::now());
        true
    }

    /// Resets the shelf to its initial empty state
    pub fn clear(&mut self) {
        *self = Self {
            generation: self.generation + 1,
            ..Self::default()
        };
    }
}
