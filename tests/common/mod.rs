//! In-memory automation backend that serves scripted listing pages.

#![allow(dead_code)]

use async_trait::async_trait;
use job_scout::automation::{
    AutomationBackend, AutomationPage, AutomationSession, SessionOptions, WaitUntil,
};
use job_scout::cache::ResultCache;
use job_scout::error::{AutomationError, AutomationResult};
use job_scout::scrapers::helloworld::extract::{EXTRACT_JOBS_SCRIPT, JOB_CARD_SELECTOR};
use job_scout::scrapers::{HelloWorldScraper, ScrapeTimeouts};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const COOKIE_BUTTON: &str = "div.cookie-ribbon-container button";
pub const AUTOCOMPLETE_FIRST_ITEM: &str = "ul.ui-autocomplete li.ui-menu-item:first-child a";

/// What the simulated site serves
#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    /// Extractor output per page, indexed by `offset / 30`
    pub pages: Vec<Vec<Value>>,
    pub consent_banner: bool,
    pub search_box: bool,
    pub fail_launch: bool,
    /// Navigation to this offset fails
    pub fail_at_offset: Option<usize>,
    /// In-page evaluation fails; `html` is served instead
    pub evaluate_fails: bool,
    pub html: String,
    /// Waiting for job cards fails as if the tab had crashed
    pub card_wait_fails: bool,
}

#[derive(Debug, Default)]
pub struct Calls {
    pub sessions: AtomicUsize,
    pub launches: AtomicUsize,
    pub session_closes: AtomicUsize,
    pub page_closes: AtomicUsize,
    pub visited: Mutex<Vec<String>>,
    pub typed: Mutex<Vec<String>>,
    pub clicked: Mutex<Vec<String>>,
}

impl Calls {
    pub fn sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }

    pub fn session_closes(&self) -> usize {
        self.session_closes.load(Ordering::SeqCst)
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }

    pub fn typed(&self) -> Vec<String> {
        self.typed.lock().unwrap().clone()
    }

    pub fn clicked(&self) -> Vec<String> {
        self.clicked.lock().unwrap().clone()
    }
}

#[derive(Clone)]
pub struct FakeBackend {
    site: Arc<FakeSite>,
    pub calls: Arc<Calls>,
}

impl FakeBackend {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site: Arc::new(site),
            calls: Arc::new(Calls::default()),
        }
    }
}

impl AutomationBackend for FakeBackend {
    type Session = FakeSession;

    fn session(&self, _options: SessionOptions) -> FakeSession {
        self.calls.sessions.fetch_add(1, Ordering::SeqCst);
        FakeSession {
            site: Arc::clone(&self.site),
            calls: Arc::clone(&self.calls),
            running: false,
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub struct FakeSession {
    site: Arc<FakeSite>,
    calls: Arc<Calls>,
    running: bool,
}

#[async_trait]
impl AutomationSession for FakeSession {
    type Page = FakePage;

    async fn init(&mut self) -> AutomationResult<()> {
        if self.running {
            return Ok(());
        }
        if self.site.fail_launch {
            return Err(AutomationError::Launch("no browser installed".to_string()));
        }
        self.calls.launches.fetch_add(1, Ordering::SeqCst);
        self.running = true;
        Ok(())
    }

    async fn new_page(&mut self) -> AutomationResult<FakePage> {
        self.init().await?;
        Ok(FakePage {
            site: Arc::clone(&self.site),
            calls: Arc::clone(&self.calls),
            offset: Mutex::new(0),
        })
    }

    async fn close(&mut self) -> AutomationResult<()> {
        if self.running {
            self.running = false;
            self.calls.session_closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

pub struct FakePage {
    site: Arc<FakeSite>,
    calls: Arc<Calls>,
    offset: Mutex<usize>,
}

impl FakePage {
    fn current_page(&self) -> Vec<Value> {
        let offset = *self.offset.lock().unwrap();
        self.site.pages.get(offset / 30).cloned().unwrap_or_default()
    }
}

fn offset_of(url: &str) -> usize {
    url.split("page=")
        .nth(1)
        .and_then(|rest| rest.split('&').next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl AutomationPage for FakePage {
    async fn goto(&self, url: &str, _wait_until: WaitUntil) -> AutomationResult<()> {
        self.calls.visited.lock().unwrap().push(url.to_string());
        let offset = offset_of(url);
        if self.site.fail_at_offset == Some(offset) {
            return Err(AutomationError::Backend("connection reset".to_string()));
        }
        *self.offset.lock().unwrap() = offset;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> AutomationResult<()> {
        if selector == JOB_CARD_SELECTOR && self.site.card_wait_fails {
            return Err(AutomationError::Backend("target closed".to_string()));
        }

        let present = if selector == JOB_CARD_SELECTOR {
            !self.current_page().is_empty()
        } else if selector == COOKIE_BUTTON {
            self.site.consent_banner
        } else {
            self.site.search_box
        };

        if present {
            Ok(())
        } else {
            Err(AutomationError::NotFound {
                selector: selector.to_string(),
                timeout,
            })
        }
    }

    async fn wait_for_navigation(&self, _wait_until: WaitUntil) -> AutomationResult<()> {
        Ok(())
    }

    async fn click(&self, selector: &str) -> AutomationResult<()> {
        self.calls.clicked.lock().unwrap().push(selector.to_string());
        Ok(())
    }

    async fn type_text(&self, _selector: &str, text: &str) -> AutomationResult<()> {
        self.calls.typed.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn press_key(&self, _key: &str) -> AutomationResult<()> {
        Ok(())
    }

    async fn evaluate(&self, function: &str, _args: &[Value]) -> AutomationResult<Value> {
        if self.site.evaluate_fails {
            return Err(AutomationError::Evaluate("execution context destroyed".to_string()));
        }
        if function == EXTRACT_JOBS_SCRIPT {
            return Ok(Value::Array(self.current_page()));
        }
        Ok(Value::Null)
    }

    async fn content(&self) -> AutomationResult<String> {
        Ok(self.site.html.clone())
    }

    async fn close(&self) -> AutomationResult<()> {
        self.calls.page_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A card as the in-page extractor would report it
pub fn card(title: &str) -> Value {
    json!({
        "title": title,
        "company": "Acme",
        "location": "Beograd",
        "posted": "danas",
        "link": format!("https://www.helloworld.rs/posao/{title}"),
        "tags": ["Rust"],
        "companyLogo": "",
        "inactive": false
    })
}

/// A skeleton card with nothing in it
pub fn blank_card() -> Value {
    json!({
        "title": "", "company": "", "location": "", "posted": "", "link": "",
        "tags": [], "companyLogo": "", "inactive": false
    })
}

/// `count` cards titled `p{page}-{i}`
pub fn listing_page(page: usize, count: usize) -> Vec<Value> {
    (0..count).map(|i| card(&format!("p{page}-{i}"))).collect()
}

pub fn scraper(backend: FakeBackend) -> HelloWorldScraper<FakeBackend> {
    HelloWorldScraper::new(backend, Arc::new(ResultCache::new()))
        .with_timeouts(ScrapeTimeouts::default().without_pauses())
}
