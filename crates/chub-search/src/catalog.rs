use serde::{Deserialize, Serialize};

use crate::error::QueryFailure;
use crate::http::Transport;
use crate::query::SearchRequest;

/// One search hit, before its avatar is resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRecord {
    /// `author/slug` path, unique within the catalog
    pub identifier: String,
    pub display_name: String,
    pub short_description: String,
    pub topic_tags: Vec<String>,
    pub author_handle: String,
}

impl CatalogRecord {
    pub fn new(
        identifier: &str,
        display_name: &str,
        short_description: &str,
        topic_tags: Vec<String>,
    ) -> Self {
        Self {
            identifier: identifier.to_string(),
            display_name: display_name.to_string(),
            short_description: short_description.to_string(),
            topic_tags,
            author_handle: author_of(identifier).to_string(),
        }
    }
}

/// First path segment of an identifier
pub fn author_of(identifier: &str) -> &str {
    identifier.split('/').next().unwrap_or_default()
}

#[derive(Deserialize)]
struct SearchResponse {
    nodes: Vec<SearchNode>,
}

#[derive(Deserialize)]
struct SearchNode {
    #[serde(rename = "fullPath")]
    full_path: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    tagline: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
}

impl From<SearchNode> for CatalogRecord {
    fn from(node: SearchNode) -> Self {
        let description = node
            .description
            .filter(|d| !d.is_empty())
            .or(node.tagline)
            .unwrap_or_default();
        CatalogRecord::new(
            &node.full_path,
            node.name.as_deref().unwrap_or_default(),
            &description,
            node.topics,
        )
    }
}

pub fn parse_search_response(body: &[u8]) -> Result<Vec<CatalogRecord>, QueryFailure> {
    let response: SearchResponse = serde_json::from_slice(body)?;
    Ok(response.nodes.into_iter().map(CatalogRecord::from).collect())
}

/// Run the catalog query. Records come back in service order.
pub fn fetch_catalog(
    transport: &dyn Transport,
    request: &SearchRequest,
) -> Result<Vec<CatalogRecord>, QueryFailure> {
    let url = request.url();
    log::debug!("Catalog query: {}", url);

    let response = transport.get(&url)?;
    if !response.is_success() {
        return Err(QueryFailure::Status(response.status));
    }
    parse_search_response(&response.body)
}
