use crate::models::{FilterOption, Query};

pub const BASE_ORIGIN: &str = "https://www.helloworld.rs";
pub const LISTINGS_URL: &str = "https://www.helloworld.rs/oglasi-za-posao/";

/// Listings per page; the site paginates by record offset
pub const PAGE_SIZE: usize = 30;

/// A client-facing filter value and the token the site expects for it
#[derive(Debug, Clone, Copy)]
pub struct VocabularyEntry {
    pub value: &'static str,
    pub label: &'static str,
    pub token: &'static str,
}

const fn entry(value: &'static str, label: &'static str, token: &'static str) -> VocabularyEntry {
    VocabularyEntry {
        value,
        label,
        token,
    }
}

/// Path segment per field
pub const FIELDS: &[VocabularyEntry] = &[
    entry("software-engineering", "Software Engineering", "programiranje"),
    entry("project-management", "Project Management", "menadzment"),
];

/// `senioritet[i]` value per level
pub const SENIORITIES: &[VocabularyEntry] = &[
    entry("junior", "Junior", "1"),
    entry("medior", "Medior", "2"),
    entry("senior", "Senior", "3"),
];

/// Accepted but not offered to clients
const SENIORITY_ALIASES: &[(&str, &str)] = &[("mid", "medior")];

/// Path segment per city
pub const LOCATIONS: &[VocabularyEntry] = &[
    entry("beograd", "Beograd", "beograd"),
    entry("novi-sad", "Novi Sad", "novi-sad"),
    entry("nis", "Niš", "nis"),
    entry("kragujevac", "Kragujevac", "kragujevac"),
];

fn token(table: &[VocabularyEntry], value: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|e| e.value.eq_ignore_ascii_case(value))
        .map(|e| e.token)
}

pub fn options(table: &[VocabularyEntry]) -> Vec<FilterOption> {
    table
        .iter()
        .map(|e| FilterOption::new(e.value, e.label))
        .collect()
}

fn seniority_token(level: &str) -> Option<&'static str> {
    let level = level.trim().to_lowercase();
    let canonical = SENIORITY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == level)
        .map_or(level.as_str(), |(_, value)| *value);
    token(SENIORITIES, canonical)
}

/// `senioritet[i]=v` pairs, percent-encoded. `i` is the level's position
/// in the input, so dropped levels leave a gap rather than shifting the rest.
pub fn seniority_params(levels: &[String]) -> Vec<String> {
    levels
        .iter()
        .enumerate()
        .filter_map(|(index, level)| {
            seniority_token(level).map(|value| format!("senioritet%5B{index}%5D={value}"))
        })
        .collect()
}

/// Listings URL for the query's filters, without any page offset.
/// Values without a mapping are left out.
pub fn build_url(query: &Query) -> String {
    let segments: Vec<&str> = [
        query.field.as_deref().and_then(|f| token(FIELDS, f)),
        query.location.as_deref().and_then(|l| token(LOCATIONS, l)),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut url = format!("{LISTINGS_URL}{}", segments.join("/"));

    let params = seniority_params(&query.seniority);
    if !params.is_empty() {
        url.push('?');
        url.push_str(&params.join("&"));
    }

    url
}

pub fn with_page_offset(base_url: &str, offset: usize) -> String {
    if offset == 0 {
        return base_url.to_string();
    }

    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{separator}page={offset}")
}

/// Record offset of a 1-based page number
pub fn page_offset(page: Option<u32>) -> usize {
    page.map_or(0, |p| (p.saturating_sub(1) as usize) * PAGE_SIZE)
}

/// Everything a scrape needs to know about one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapePlan {
    /// Filters only, used as the pagination base
    pub base_url: String,
    /// Filters plus the requested page
    pub url: String,
    pub keyword: Option<String>,
    pub all_pages: bool,
    pub cache_key: String,
}

impl ScrapePlan {
    /// `query` is expected to be normalized already.
    pub fn new(query: &Query) -> Self {
        let base_url = build_url(query);
        let url = with_page_offset(&base_url, page_offset(query.page));
        let cache_key = format!(
            "helloworld-jobs:{url}:q={}:allPages={}",
            query.q.as_deref().unwrap_or(""),
            query.all_pages
        );

        Self {
            base_url,
            url,
            keyword: query.q.clone(),
            all_pages: query.all_pages,
            cache_key,
        }
    }
}
