//! Job listing scraper: drives a headless browser over job boards, extracts
//! listing cards and keeps results in a short-lived cache.

pub mod aggregator;
pub mod automation;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod scrapers;

pub use aggregator::JobAggregator;
pub use cache::ResultCache;
pub use models::{FilterVocabulary, ListingRecord, Query, SearchResponse};
