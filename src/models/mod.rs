use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Job board a query can be routed to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    HelloWorld,
    Infostud,
    LinkedIn,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::HelloWorld, Platform::Infostud, Platform::LinkedIn];

    /// Identifier used in queries and cache keys
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::HelloWorld => "helloworld",
            Platform::Infostud => "infostud",
            Platform::LinkedIn => "linkedin",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Platform::HelloWorld => "HelloWorld",
            Platform::Infostud => "Infostud",
            Platform::LinkedIn => "LinkedIn",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

/// One job posting as extracted from a listing card
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    pub posted: String,
    pub link: String,
    pub tags: Vec<String>,
    pub company_logo: String,
    pub inactive: bool,
}

impl ListingRecord {
    /// Skeleton and placeholder cards come back with every field blank.
    pub fn has_content(&self) -> bool {
        !self.title.is_empty()
            || !self.company.is_empty()
            || !self.location.is_empty()
            || !self.posted.is_empty()
            || !self.link.is_empty()
            || !self.tags.is_empty()
            || !self.company_logo.is_empty()
    }
}

/// Search intent as received from the caller.
///
/// Filter values are trimmed and lowercased by [`Query::normalized`]; a
/// missing or blank value means "no filter".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Query {
    pub platform: Option<String>,
    /// Free-text keyword
    pub q: Option<String>,
    pub field: Option<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub seniority: Vec<String>,
    pub location: Option<String>,
    /// 1-based page number
    pub page: Option<u32>,
    pub all_pages: bool,
}

impl Query {
    pub fn normalized(&self) -> Self {
        Self {
            platform: normalize(self.platform.as_deref()),
            // Keywords are typed into the site's search box as given
            q: self
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            field: normalize(self.field.as_deref()),
            seniority: self
                .seniority
                .iter()
                .flat_map(|s| split_levels(s))
                .collect(),
            location: normalize(self.location.as_deref()),
            page: self.page.filter(|p| *p > 0),
            all_pages: self.all_pages,
        }
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

/// Split a comma-joined seniority string into lowercased levels.
pub fn split_levels(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        None,
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => split_levels(&s),
        OneOrMany::Many(list) => list.iter().flat_map(|s| split_levels(s)).collect(),
        OneOrMany::None => Vec::new(),
    })
}

/// One selectable value of a filter dimension
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// Filter values a client may offer, per dimension
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterVocabulary {
    pub platforms: Vec<FilterOption>,
    pub fields: Vec<FilterOption>,
    pub seniorities: Vec<FilterOption>,
    pub locations: Vec<FilterOption>,
}

/// Result of a search, ready to be rendered by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub data: Vec<ListingRecord>,
    pub total: usize,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

impl SearchResponse {
    pub fn new(source: impl Into<String>, data: Vec<ListingRecord>) -> Self {
        Self {
            total: data.len(),
            data,
            source: source.into(),
            fetched_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_only_record_is_kept() {
        let record = ListingRecord {
            tags: vec!["x".to_string()],
            ..Default::default()
        };
        assert!(record.has_content());
    }

    #[test]
    fn test_blank_record_is_dropped() {
        assert!(!ListingRecord::default().has_content());

        let inactive_only = ListingRecord {
            inactive: true,
            ..Default::default()
        };
        assert!(!inactive_only.has_content());
    }

    #[test]
    fn test_seniority_accepts_string_or_list() {
        let from_string: Query =
            serde_json::from_str(r#"{"seniority": "Junior, senior"}"#).unwrap();
        assert_eq!(from_string.seniority, vec!["junior", "senior"]);

        let from_list: Query =
            serde_json::from_str(r#"{"seniority": ["medior", "SENIOR"]}"#).unwrap();
        assert_eq!(from_list.seniority, vec!["medior", "senior"]);

        let absent: Query = serde_json::from_str(r#"{"q": "rust"}"#).unwrap();
        assert!(absent.seniority.is_empty());
    }

    #[test]
    fn test_normalized_lowercases_and_drops_blanks() {
        let query = Query {
            platform: Some(" HelloWorld ".to_string()),
            q: Some("  ".to_string()),
            field: Some("Software-Engineering".to_string()),
            seniority: vec!["Junior,Senior".to_string()],
            location: Some(String::new()),
            page: Some(0),
            all_pages: true,
        }
        .normalized();

        assert_eq!(query.platform.as_deref(), Some("helloworld"));
        assert_eq!(query.q, None);
        assert_eq!(query.field.as_deref(), Some("software-engineering"));
        assert_eq!(query.seniority, vec!["junior", "senior"]);
        assert_eq!(query.location, None);
        assert_eq!(query.page, None);
        assert!(query.all_pages);
    }

    #[test]
    fn test_record_uses_camel_case_keys() {
        let json = r#"{"title":"Rust dev","companyLogo":"https://x/logo.png","tags":["rust"]}"#;
        let record: ListingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.company_logo, "https://x/logo.png");
        assert_eq!(record.company, "");
        assert!(!record.inactive);
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!(Platform::parse("LinkedIn"), Some(Platform::LinkedIn));
        assert_eq!(Platform::parse("monster"), None);
    }
}
