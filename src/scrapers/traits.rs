use crate::models::{FilterVocabulary, ListingRecord, Platform, Query};
use async_trait::async_trait;

/// Common trait for all job board scrapers.
///
/// Scraping never fails from the caller's point of view: a source that
/// cannot be reached or parsed yields an empty list and logs why.
#[async_trait]
pub trait SiteScraper: Send + Sync {
    /// Scrape listings matching `query` from the source
    async fn scrape(&self, query: &Query) -> Vec<ListingRecord>;

    /// Board this scraper serves
    fn platform(&self) -> Platform;

    /// Get the name of the scraper source
    fn source_name(&self) -> &'static str {
        self.platform().label()
    }

    /// Field, seniority and location values this source understands.
    /// `platforms` is filled in by the aggregator.
    fn vocabulary(&self) -> FilterVocabulary;
}
