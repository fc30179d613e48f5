//! Listing card extraction for helloworld.rs.
//!
//! [`EXTRACT_JOBS_SCRIPT`] is shipped into the page and run where the DOM
//! lives. [`extract_from_html`] applies the same rules to a page snapshot
//! and is used when the in-page run does not produce usable data.

use crate::models::ListingRecord;
use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;
use url::Url;

pub const JOB_CARD_SELECTOR: &str = "div.relative.rounded-lg.overflow-hidden";

const TITLE_LINK: &str = "h3 a";
const COMPANY_LINK: &str = "h4 a";
const LOCATION_TEXT: &str = "i.la-map-marker ~ p";
const POSTED_TEXT: &str = "i.la-clock ~ p";
const TAG_LINKS: &str = "a.jobtag";
const COMPANY_LOGO: &str = "a.__ga4_job_company_logo img";

/// Card root carries all of these when the posting has expired
const INACTIVE_CLASSES: [&str; 3] = ["bg-transparent", "shadow-none", "border-gray-600"];

/// Called as `(cardSelector, baseUrl)`. Returns one object per card, or
/// `null` for a card that threw. Must not reference anything outside itself.
pub const EXTRACT_JOBS_SCRIPT: &str = r#"
(cardSelector, baseUrl) => {
    const extract = (card) => {
        const text = (selector) => card.querySelector(selector)?.textContent?.trim() || '';
        const attr = (selector, name) => card.querySelector(selector)?.getAttribute(name) || '';
        const absolute = (path) => {
            if (!path || !path.trim()) return '';
            try {
                return new URL(path, baseUrl).href;
            } catch (_) {
                return '';
            }
        };
        const classes = card.classList;

        return {
            title: text('h3 a'),
            company: text('h4 a'),
            location: text('i.la-map-marker ~ p'),
            posted: text('i.la-clock ~ p'),
            link: absolute(attr('h3 a', 'href')),
            tags: Array.from(card.querySelectorAll('a.jobtag'))
                .map((a) => a.textContent?.trim())
                .filter(Boolean),
            companyLogo: absolute(attr('a.__ga4_job_company_logo img', 'src')),
            inactive: ['bg-transparent', 'shadow-none', 'border-gray-600']
                .every((name) => classes.contains(name)),
        };
    };

    return Array.from(document.querySelectorAll(cardSelector)).map((card) => {
        try {
            return extract(card);
        } catch (_) {
            return null;
        }
    });
}
"#;

/// Decode the script's output. Cards that threw or came back malformed are
/// skipped; only a payload that is not a list is an error.
pub fn decode_records(payload: Value) -> Result<Vec<ListingRecord>> {
    let items: Vec<Value> =
        serde_json::from_value(payload).context("Extraction payload is not a list")?;

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            if item.is_null() {
                debug!(card = idx, "Card failed to extract in page");
                return None;
            }
            serde_json::from_value::<ListingRecord>(item)
                .map_err(|e| debug!(card = idx, "Skipping malformed card: {e}"))
                .ok()
        })
        .collect())
}

/// Drop placeholder cards that carry no data at all.
pub fn filter_valid(records: Vec<ListingRecord>) -> Vec<ListingRecord> {
    records.into_iter().filter(ListingRecord::has_content).collect()
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Apply the card rules to a full page of HTML.
pub fn extract_from_html(html: &str) -> Vec<ListingRecord> {
    let document = Html::parse_document(html);
    let base = Url::parse(crate::scrapers::helloworld::urls::BASE_ORIGIN).ok();
    let rules = CardRules::new();

    let records: Vec<_> = document
        .select(&selector(JOB_CARD_SELECTOR))
        .map(|card| rules.extract(card, base.as_ref()))
        .collect();

    debug!("Found {} job cards in HTML", records.len());
    records
}

struct CardRules {
    title: Selector,
    company: Selector,
    location: Selector,
    posted: Selector,
    tags: Selector,
    logo: Selector,
}

impl CardRules {
    fn new() -> Self {
        Self {
            title: selector(TITLE_LINK),
            company: selector(COMPANY_LINK),
            location: selector(LOCATION_TEXT),
            posted: selector(POSTED_TEXT),
            tags: selector(TAG_LINKS),
            logo: selector(COMPANY_LOGO),
        }
    }

    fn extract(&self, card: ElementRef<'_>, base: Option<&Url>) -> ListingRecord {
        let first = |sel: &Selector| card.select(sel).next();
        let text = |sel: &Selector| first(sel).map(element_text).unwrap_or_default();
        let attr = |sel: &Selector, name: &str| {
            first(sel)
                .and_then(|el| el.value().attr(name))
                .map(|v| absolute(v, base))
                .unwrap_or_default()
        };

        let classes: Vec<&str> = card.value().classes().collect();

        ListingRecord {
            title: text(&self.title),
            company: text(&self.company),
            location: text(&self.location),
            posted: text(&self.posted),
            link: attr(&self.title, "href"),
            tags: card
                .select(&self.tags)
                .map(element_text)
                .filter(|t| !t.is_empty())
                .collect(),
            company_logo: attr(&self.logo, "src"),
            inactive: INACTIVE_CLASSES.iter().all(|c| classes.contains(c)),
        }
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn absolute(path: &str, base: Option<&Url>) -> String {
    let path = path.trim();
    if path.is_empty() {
        return String::new();
    }

    match base {
        Some(base) => base.join(path).map(String::from).unwrap_or_default(),
        None => Url::parse(path).map(String::from).unwrap_or_default(),
    }
}
