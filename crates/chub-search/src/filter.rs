use serde::{Deserialize, Serialize};

/// Sort orders understood by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortKey {
    #[default]
    DownloadCount,
    Id,
    Rating,
    Default,
    RatingCount,
    LastActivityAt,
    TrendingDownloads,
    CreatedAt,
    Name,
    NTokens,
    Random,
    /// Not a recognized key; sent verbatim and left to the service to judge
    Other(String),
}

impl SortKey {
    pub const ALL: [SortKey; 11] = [
        SortKey::DownloadCount,
        SortKey::Id,
        SortKey::Rating,
        SortKey::Default,
        SortKey::RatingCount,
        SortKey::LastActivityAt,
        SortKey::TrendingDownloads,
        SortKey::CreatedAt,
        SortKey::Name,
        SortKey::NTokens,
        SortKey::Random,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::DownloadCount => "download_count",
            Self::Id => "id",
            Self::Rating => "rating",
            Self::Default => "default",
            Self::RatingCount => "rating_count",
            Self::LastActivityAt => "last_activity_at",
            Self::TrendingDownloads => "trending_downloads",
            Self::CreatedAt => "created_at",
            Self::Name => "name",
            Self::NTokens => "n_tokens",
            Self::Random => "random",
            Self::Other(key) => key,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::DownloadCount => "Download Count",
            Self::Id => "ID",
            Self::Rating => "Rating",
            Self::Default => "Default",
            Self::RatingCount => "Rating Count",
            Self::LastActivityAt => "Last Activity",
            Self::TrendingDownloads => "Trending Downloads",
            Self::CreatedAt => "Creation Date",
            Self::Name => "Name",
            Self::NTokens => "Token Count",
            Self::Random => "Random",
            Self::Other(key) => key,
        }
    }
}

impl From<&str> for SortKey {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            return Self::default();
        }
        Self::ALL
            .iter()
            .find(|key| key.as_str() == s)
            .cloned()
            .unwrap_or_else(|| Self::Other(s.to_string()))
    }
}

impl From<String> for SortKey {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        key.as_str().to_string()
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalized search criteria handed to the query builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub search_term: String,
    pub include_tags: Vec<String>,
    pub exclude_tags: Vec<String>,
    /// `None` falls back to the configured default
    pub nsfw: Option<bool>,
    pub sort: SortKey,
    pub page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            nsfw: None,
            sort: SortKey::default(),
            page: 1,
        }
    }
}

/// Split a comma separated tag field into trimmed entries
///
/// Empty entries are kept; the query builder drops them.
pub fn split_tags(text: &str) -> Vec<String> {
    text.split(',').map(|tag| tag.trim().to_string()).collect()
}

/// Raw filter field values as the user left them in the panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchForm {
    pub search_text: String,
    pub include_text: String,
    pub exclude_text: String,
    pub page: u32,
    pub sort: SortKey,
    pub nsfw: bool,
}

impl SearchForm {
    pub fn new(nsfw: bool) -> Self {
        Self {
            search_text: String::new(),
            include_text: String::new(),
            exclude_text: String::new(),
            page: 1,
            sort: SortKey::default(),
            nsfw,
        }
    }

    pub fn filter_state(&self) -> FilterState {
        FilterState {
            search_term: self.search_text.clone(),
            include_tags: split_tags(&self.include_text),
            exclude_tags: split_tags(&self.exclude_text),
            nsfw: Some(self.nsfw),
            sort: self.sort.clone(),
            page: self.page.max(1),
        }
    }
}

impl Default for SearchForm {
    fn default() -> Self {
        Self::new(false)
    }
}
