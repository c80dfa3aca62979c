//! Turns filter state into a catalog search request

use crate::config::{Endpoints, SearchSettings};
use crate::filter::FilterState;

/// Server-side ceiling on the joined, comma separated tag list
pub const TAG_PARAM_LIMIT: usize = 100;

/// A catalog GET request. Parameter values are already percent-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub endpoint: String,
    pub params: Vec<(&'static str, String)>,
}

impl SearchRequest {
    pub fn url(&self) -> String {
        let query = self
            .params
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.endpoint, query)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Join the non-empty tags with commas and cut the result at [`TAG_PARAM_LIMIT`] characters
pub fn join_tags(tags: &[String]) -> String {
    tags.iter()
        .filter(|tag| !tag.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",")
        .chars()
        .take(TAG_PARAM_LIMIT)
        .collect()
}

pub fn build_search_request(
    filter: &FilterState,
    settings: &SearchSettings,
    endpoints: &Endpoints,
) -> SearchRequest {
    let mut params: Vec<(&'static str, String)> = Vec::new();

    if !filter.search_term.is_empty() {
        params.push((
            "search",
            urlencoding::encode(&filter.search_term).into_owned(),
        ));
    }
    params.push(("first", settings.find_count.to_string()));
    params.push(("page", filter.page.max(1).to_string()));
    params.push(("sort", filter.sort.as_str().to_string()));
    params.push(("asc", "false".to_string()));
    params.push(("include_forks", "true".to_string()));
    params.push(("nsfw", filter.nsfw.unwrap_or(settings.nsfw).to_string()));

    for (name, tags) in [
        ("tags", &filter.include_tags),
        ("exclude_tags", &filter.exclude_tags),
    ] {
        let joined = join_tags(tags);
        if !joined.is_empty() {
            params.push((name, urlencoding::encode(&joined).into_owned()));
        }
    }

    SearchRequest {
        endpoint: endpoints.search.clone(),
        params,
    }
}
