//! helloworld.rs job board

pub mod extract;
pub mod urls;

use crate::automation::{
    AutomationBackend, AutomationPage, AutomationSession, SessionOptions, WaitUntil,
};
use crate::cache::ResultCache;
use crate::models::{FilterVocabulary, ListingRecord, Platform, Query};
use crate::scrapers::traits::SiteScraper;
use crate::scrapers::types::ScrapeTimeouts;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use self::extract::{
    decode_records, extract_from_html, filter_valid, EXTRACT_JOBS_SCRIPT, JOB_CARD_SELECTOR,
};
use self::urls::{ScrapePlan, BASE_ORIGIN, PAGE_SIZE};

const COOKIE_BUTTON: &str = "div.cookie-ribbon-container button";
const SEARCH_INPUT: &str = r#"input[name="q"].__autocomplete-full-text-search"#;
const AUTOCOMPLETE_DROPDOWN: &str = "ul.ui-autocomplete";
const AUTOCOMPLETE_FIRST_ITEM: &str = "ul.ui-autocomplete li.ui-menu-item:first-child a";

type PageOf<B> = <<B as AutomationBackend>::Session as AutomationSession>::Page;

/// A scrape that stopped on an error, with whatever it collected first
struct ScrapeFailure {
    partial: Vec<ListingRecord>,
    error: anyhow::Error,
}

/// Browser-driven scraper for helloworld.rs.
///
/// Every cache miss gets its own browser session, which is closed before
/// `scrape` returns whatever the outcome.
pub struct HelloWorldScraper<B: AutomationBackend> {
    backend: B,
    cache: Arc<ResultCache>,
    session_options: SessionOptions,
    timeouts: ScrapeTimeouts,
}

impl<B: AutomationBackend> HelloWorldScraper<B> {
    pub fn new(backend: B, cache: Arc<ResultCache>) -> Self {
        Self {
            backend,
            cache,
            session_options: SessionOptions::default(),
            timeouts: ScrapeTimeouts::default(),
        }
    }

    pub fn with_session_options(mut self, options: SessionOptions) -> Self {
        self.session_options = options;
        self
    }

    pub fn with_timeouts(mut self, timeouts: ScrapeTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// `Ok(None)` when the listings never rendered; that outcome is not
    /// worth caching.
    async fn run_session(
        &self,
        plan: &ScrapePlan,
    ) -> Result<Option<Vec<ListingRecord>>, ScrapeFailure> {
        debug!(backend = self.backend.name(), "Opening automation session");
        let mut session = self.backend.session(self.session_options.clone());

        let outcome = self.run_page(&mut session, plan).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close browser session: {e}");
        }
        outcome
    }

    async fn run_page(
        &self,
        session: &mut B::Session,
        plan: &ScrapePlan,
    ) -> Result<Option<Vec<ListingRecord>>, ScrapeFailure> {
        let page = session.new_page().await.map_err(|e| ScrapeFailure {
            partial: Vec::new(),
            error: anyhow::Error::new(e).context("Failed to open browser page"),
        })?;

        let mut jobs = Vec::new();
        let result = if plan.all_pages {
            self.scrape_all_pages(&page, plan, &mut jobs).await.map(|()| true)
        } else {
            self.scrape_single_page(&page, plan).await.map(|found| match found {
                Some(found) => {
                    jobs = found;
                    true
                }
                None => false,
            })
        };

        if let Err(e) = page.close().await {
            debug!("Failed to close page: {e}");
        }

        match result {
            Ok(true) => Ok(Some(jobs)),
            Ok(false) => Ok(None),
            Err(error) => Err(ScrapeFailure {
                partial: jobs,
                error,
            }),
        }
    }

    /// `Ok(None)` when no job card shows up in time
    async fn scrape_single_page(
        &self,
        page: &PageOf<B>,
        plan: &ScrapePlan,
    ) -> Result<Option<Vec<ListingRecord>>> {
        info!(url = %plan.url, "Scraping helloworld.rs");
        page.goto(&plan.url, WaitUntil::NetworkIdle)
            .await
            .context("Failed to load listings page")?;

        self.dismiss_cookie_consent(page).await;
        if let Some(keyword) = &plan.keyword {
            self.keyword_search(page, keyword).await;
        }

        if !self.has_job_cards(page, self.timeouts.content).await? {
            info!("No job cards appeared, returning no results");
            return Ok(None);
        }

        let jobs = filter_valid(self.extract_jobs(page).await?);
        info!("Scraped {} jobs", jobs.len());
        Ok(Some(jobs))
    }

    /// Walk offsets 0, 30, 60, ... until a page is empty or short.
    /// Collected jobs stay in `jobs` even if a later page fails.
    async fn scrape_all_pages(
        &self,
        page: &PageOf<B>,
        plan: &ScrapePlan,
        jobs: &mut Vec<ListingRecord>,
    ) -> Result<()> {
        let mut offset = 0;

        loop {
            let url = urls::with_page_offset(&plan.base_url, offset);
            info!(offset, url = %url, "Scraping page");

            page.goto(&url, WaitUntil::NetworkIdle)
                .await
                .with_context(|| format!("Failed to load page at offset {offset}"))?;

            if offset == 0 {
                self.dismiss_cookie_consent(page).await;
                if let Some(keyword) = &plan.keyword {
                    self.keyword_search(page, keyword).await;
                }
            }

            if !self.has_job_cards(page, self.timeouts.next_page).await? {
                info!(offset, "No job cards found, stopping");
                break;
            }

            let found = filter_valid(self.extract_jobs(page).await?);
            if found.is_empty() {
                info!(offset, "No valid jobs on page, stopping");
                break;
            }

            let count = found.len();
            info!(offset, "Found {count} jobs");
            jobs.extend(found);

            if count < PAGE_SIZE {
                info!(offset, "Fewer than {PAGE_SIZE} jobs, treating as last page");
                break;
            }
            offset += PAGE_SIZE;
        }

        info!("Total jobs scraped across pages: {}", jobs.len());
        Ok(())
    }

    /// `Ok(false)` when no card shows up in time
    async fn has_job_cards(&self, page: &PageOf<B>, timeout: Duration) -> Result<bool> {
        match page.wait_for_selector(JOB_CARD_SELECTOR, timeout).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(anyhow::Error::new(e).context("Waiting for job cards failed")),
        }
    }

    /// Run the extractor in the page, falling back to parsing a snapshot
    /// of the HTML when that does not yield records.
    async fn extract_jobs(&self, page: &PageOf<B>) -> Result<Vec<ListingRecord>> {
        let args = [Value::from(JOB_CARD_SELECTOR), Value::from(BASE_ORIGIN)];

        let in_page = page
            .evaluate(EXTRACT_JOBS_SCRIPT, &args)
            .await
            .map_err(anyhow::Error::from)
            .and_then(decode_records);

        match in_page {
            Ok(jobs) => Ok(jobs),
            Err(e) => {
                warn!("In-page extraction failed, parsing page HTML instead: {e:#}");
                let html = page.content().await.context("Failed to read page HTML")?;
                Ok(extract_from_html(&html))
            }
        }
    }

    /// Best effort: click the cookie banner if it shows up.
    async fn dismiss_cookie_consent(&self, page: &PageOf<B>) -> bool {
        let accepted = async {
            page.wait_for_selector(COOKIE_BUTTON, self.timeouts.consent).await?;
            page.click(COOKIE_BUTTON).await
        }
        .await;

        match accepted {
            Ok(()) => {
                info!("Cookie consent accepted");
                true
            }
            Err(e) => {
                info!("Cookie consent not found or already accepted");
                debug!("Cookie consent: {e}");
                false
            }
        }
    }

    /// Best effort: filter by keyword through the search box. On failure
    /// the unfiltered listings are scraped instead.
    async fn keyword_search(&self, page: &PageOf<B>, keyword: &str) -> bool {
        match self.try_keyword_search(page, keyword).await {
            Ok(()) => {
                info!(keyword, "Keyword search completed, results loaded");
                true
            }
            Err(e) => {
                warn!(keyword, "Keyword search failed, continuing without it: {e:#}");
                false
            }
        }
    }

    async fn try_keyword_search(&self, page: &PageOf<B>, keyword: &str) -> Result<()> {
        info!(keyword, "Typing keyword");
        page.wait_for_selector(SEARCH_INPUT, self.timeouts.search_input)
            .await
            .context("Search input not found")?;
        page.type_text(SEARCH_INPUT, keyword)
            .await
            .context("Failed to type keyword")?;

        debug!("Waiting for autocomplete dropdown...");
        page.wait_for_selector(AUTOCOMPLETE_DROPDOWN, self.timeouts.autocomplete)
            .await
            .context("Autocomplete dropdown did not appear")?;
        tokio::time::sleep(self.timeouts.autocomplete_settle).await;

        debug!("Clicking first autocomplete suggestion...");
        page.click(AUTOCOMPLETE_FIRST_ITEM)
            .await
            .context("Failed to click autocomplete suggestion")?;
        page.wait_for_navigation(WaitUntil::NetworkIdle)
            .await
            .context("Search results did not load")?;
        tokio::time::sleep(self.timeouts.search_settle).await;

        Ok(())
    }
}

#[async_trait]
impl<B: AutomationBackend> SiteScraper for HelloWorldScraper<B> {
    async fn scrape(&self, query: &Query) -> Vec<ListingRecord> {
        let plan = ScrapePlan::new(&query.normalized());

        if let Some(cached) = self.cache.get::<Vec<ListingRecord>>(&plan.cache_key) {
            return cached;
        }

        match self.run_session(&plan).await {
            Ok(Some(jobs)) => {
                self.cache.insert(&plan.cache_key, &jobs);
                jobs
            }
            Ok(None) => Vec::new(),
            Err(ScrapeFailure { partial, error }) => {
                error!(url = %plan.url, "Error scraping helloworld.rs: {error:#}");
                if !partial.is_empty() {
                    warn!("Returning {} jobs collected before the failure", partial.len());
                }
                partial
            }
        }
    }

    fn platform(&self) -> Platform {
        Platform::HelloWorld
    }

    fn vocabulary(&self) -> FilterVocabulary {
        FilterVocabulary {
            platforms: Vec::new(),
            fields: urls::options(urls::FIELDS),
            seniorities: urls::options(urls::SENIORITIES),
            locations: urls::options(urls::LOCATIONS),
        }
    }
}
