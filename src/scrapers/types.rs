use std::time::Duration;

/// How long each step of a scrape waits before giving up on it
#[derive(Debug, Clone)]
pub struct ScrapeTimeouts {
    /// Cookie banner appearing
    pub consent: Duration,
    /// Search box appearing
    pub search_input: Duration,
    /// Autocomplete list appearing after typing
    pub autocomplete: Duration,
    /// Pause before clicking a suggestion so the list finishes rendering
    pub autocomplete_settle: Duration,
    /// Pause after the search navigation for late data
    pub search_settle: Duration,
    /// First listing card, single-page mode
    pub content: Duration,
    /// First listing card on each page while paginating
    pub next_page: Duration,
}

impl Default for ScrapeTimeouts {
    fn default() -> Self {
        Self {
            consent: Duration::from_secs(3),
            search_input: Duration::from_secs(5),
            autocomplete: Duration::from_secs(5),
            autocomplete_settle: Duration::from_millis(500),
            search_settle: Duration::from_secs(1),
            content: Duration::from_secs(10),
            next_page: Duration::from_secs(5),
        }
    }
}

impl ScrapeTimeouts {
    /// Same waits, no fixed pauses
    pub fn without_pauses(self) -> Self {
        Self {
            autocomplete_settle: Duration::ZERO,
            search_settle: Duration::ZERO,
            ..self
        }
    }
}
