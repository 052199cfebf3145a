pub mod book_search;
pub mod enrichment;
pub mod providers;
pub mod recommendations;

pub use enrichment::EnrichmentService;
