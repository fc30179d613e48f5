use crate::models::{
    FilterOption, FilterVocabulary, ListingRecord, Platform, Query, SearchResponse,
};
use crate::scrapers::SiteScraper;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

/// Platform used when a query names none, or one we do not know
pub const DEFAULT_PLATFORM: Platform = Platform::HelloWorld;

/// Platform value that asks for every registered source
pub const ALL_PLATFORMS: &str = "all";

/// How a query's platform value was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Single(Platform),
    All,
}

impl Route {
    /// Resolve a normalized platform value.
    pub fn resolve(platform: Option<&str>) -> Self {
        match platform {
            Some(ALL_PLATFORMS) => Route::All,
            Some(value) => Platform::parse(value).map_or_else(
                || {
                    warn!(
                        platform = value,
                        "Unknown platform, using {}",
                        DEFAULT_PLATFORM.as_str()
                    );
                    Route::Single(DEFAULT_PLATFORM)
                },
                Route::Single,
            ),
            None => Route::Single(DEFAULT_PLATFORM),
        }
    }
}

/// Entry point for searches across the configured job boards
pub struct JobAggregator {
    scrapers: Vec<Arc<dyn SiteScraper>>,
}

impl JobAggregator {
    pub fn new() -> Self {
        Self {
            scrapers: Vec::new(),
        }
    }

    /// Register a source. Fan-out results follow registration order.
    pub fn with_scraper(mut self, scraper: Arc<dyn SiteScraper>) -> Self {
        self.scrapers.push(scraper);
        self
    }

    fn scraper_for(&self, platform: Platform) -> Option<&Arc<dyn SiteScraper>> {
        self.scrapers.iter().find(|s| s.platform() == platform)
    }

    pub async fn search(&self, query: &Query) -> SearchResponse {
        let query = query.normalized();

        match Route::resolve(query.platform.as_deref()) {
            Route::All => SearchResponse::new(ALL_PLATFORMS, self.search_all(&query).await),
            Route::Single(platform) => {
                let jobs = match self.scraper_for(platform) {
                    Some(scraper) => scraper.scrape(&query).await,
                    None => {
                        warn!(platform = platform.as_str(), "No scraper registered for platform");
                        Vec::new()
                    }
                };
                SearchResponse::new(platform.label(), jobs)
            }
        }
    }

    /// Query every registered source concurrently and concatenate the
    /// results in registration order.
    pub async fn search_all(&self, query: &Query) -> Vec<ListingRecord> {
        let results = join_all(self.scrapers.iter().map(|s| s.scrape(query))).await;

        let mut jobs = Vec::new();
        for (scraper, found) in self.scrapers.iter().zip(results) {
            info!(source = scraper.source_name(), "{} jobs", found.len());
            jobs.extend(found);
        }
        jobs
    }

    /// Filter values for client-side display. Platforms list every known
    /// board; the other dimensions merge what the sources declare.
    pub fn filters(&self) -> FilterVocabulary {
        let mut vocabulary = FilterVocabulary {
            platforms: Platform::ALL
                .iter()
                .map(|p| FilterOption::new(p.as_str(), p.label()))
                .collect(),
            ..Default::default()
        };

        for scraper in &self.scrapers {
            let declared = scraper.vocabulary();
            merge(&mut vocabulary.fields, declared.fields);
            merge(&mut vocabulary.seniorities, declared.seniorities);
            merge(&mut vocabulary.locations, declared.locations);
        }
        vocabulary
    }
}

impl Default for JobAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn merge(into: &mut Vec<FilterOption>, options: Vec<FilterOption>) {
    for option in options {
        if !into.iter().any(|o| o.value == option.value) {
            into.push(option);
        }
    }
}
