//! Catalog query plus concurrent avatar fan-out, reassembled in response order

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::asset::{AssetRegistry, AssetResolver, AssetScope, AssetUri};
use crate::catalog::{fetch_catalog, CatalogRecord};
use crate::config::{Endpoints, SearchSettings};
use crate::error::SearchError;
use crate::filter::FilterState;
use crate::http::Transport;
use crate::query::build_search_request;

/// A catalog record with its resolved avatar
///
/// `asset` is `None` when both avatar endpoints failed; the record stays in
/// place so the result set keeps the response's length and order.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedResult {
    #[serde(flatten)]
    pub record: CatalogRecord,
    pub asset: Option<AssetUri>,
}

/// The results of one search, owning the asset references it created
#[derive(Debug)]
pub struct ResultSet {
    pub results: Vec<EnrichedResult>,
    pub duration: Duration,
    assets: Option<AssetScope>,
}

impl ResultSet {
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            duration: Duration::ZERO,
            assets: None,
        }
    }

    /// Wrap results that do not own any asset references
    #[cfg(test)]
    pub(crate) fn from_results(results: Vec<EnrichedResult>) -> Self {
        Self {
            results,
            duration: Duration::ZERO,
            assets: None,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Live asset references owned by this result set
    pub fn asset_count(&self) -> usize {
        self.assets.as_ref().map_or(0, AssetScope::len)
    }

    /// Number of records shown with a placeholder instead of an avatar
    pub fn missing_assets(&self) -> usize {
        self.results.iter().filter(|r| r.asset.is_none()).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EnrichedResult> {
        self.results.iter()
    }
}

pub struct Aggregator {
    transport: Arc<dyn Transport>,
    resolver: AssetResolver,
    registry: AssetRegistry,
    settings: SearchSettings,
    endpoints: Endpoints,
}

impl Aggregator {
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: AssetRegistry,
        settings: SearchSettings,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            resolver: AssetResolver::new(transport.clone(), endpoints.clone()),
            transport,
            registry,
            settings,
            endpoints,
        }
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Query the catalog and resolve every record's avatar concurrently
    ///
    /// Waits for every avatar fetch; a failed fetch becomes a placeholder
    /// entry rather than failing the search.
    pub fn search(&self, filter: &FilterState) -> Result<ResultSet, SearchError> {
        let start = Instant::now();
        let request = build_search_request(filter, &self.settings, &self.endpoints);
        let records = fetch_catalog(self.transport.as_ref(), &request)?;

        if records.is_empty() {
            log::debug!("No characters found");
            return Ok(ResultSet::empty());
        }

        let outcomes: Vec<Result<Vec<u8>, SearchError>> = std::thread::scope(|s| {
            let handles: Vec<_> = records
                .iter()
                .map(|record| {
                    let resolver = &self.resolver;
                    s.spawn(move || resolver.resolve(&record.identifier))
                })
                .collect();

            // Join in spawn order so output follows the response, not completion
            handles
                .into_iter()
                .zip(&records)
                .map(|(handle, record)| {
                    handle.join().unwrap_or_else(|_| {
                        Err(SearchError::FetchFailed {
                            identifier: record.identifier.clone(),
                        })
                    })
                })
                .collect()
        });

        let mut scope = self.registry.scope();
        let results: Vec<EnrichedResult> = records
            .into_iter()
            .zip(outcomes)
            .map(|(record, outcome)| {
                let asset = match outcome {
                    Ok(bytes) => Some(scope.register(bytes)),
                    Err(e) => {
                        log::warn!("{}", e);
                        None
                    }
                };
                EnrichedResult { record, asset }
            })
            .collect();

        let result_set = ResultSet {
            results,
            duration: start.elapsed(),
            assets: Some(scope),
        };
        log::debug!(
            "Search returned {} characters ({} without avatar) in {:?}",
            result_set.len(),
            result_set.missing_assets(),
            result_set.duration
        );
        Ok(result_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryFailure;
    use crate::http::fake::{unreachable, FakeTransport};
    use crate::http::HttpResponse;
    use std::thread;

    fn endpoints() -> Endpoints {
        Endpoints::with_bases("https://api.test", "https://avatars.test")
    }

    fn nodes(paths: &[&str]) -> String {
        let nodes: Vec<_> = paths
            .iter()
            .map(|p| serde_json::json!({"fullPath": p, "name": p, "description": "", "topics": []}))
            .collect();
        serde_json::json!({ "nodes": nodes }).to_string()
    }

    fn aggregator(transport: Arc<FakeTransport>) -> Aggregator {
        Aggregator::new(
            transport,
            AssetRegistry::new(),
            SearchSettings::default(),
            endpoints(),
        )
    }

    fn body_path(call: &crate::http::fake::Call) -> String {
        call.body
            .as_ref()
            .and_then(|b| b["fullPath"].as_str())
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn test_empty_response_skips_asset_calls() {
        let transport = Arc::new(FakeTransport::new(|call| {
            assert_eq!(call.method, "GET", "no avatar requests expected");
            Ok(HttpResponse::new(200, nodes(&[])))
        }));
        let agg = aggregator(transport.clone());

        let result = agg.search(&FilterState::default()).unwrap();
        assert!(result.is_empty());
        assert_eq!(transport.calls().len(), 1);
    }

    #[test]
    fn test_order_preserved_regardless_of_completion() {
        let paths = ["a/slow", "b/medium", "c/fast"];
        let body = nodes(&paths);
        let transport = Arc::new(FakeTransport::new(move |call| {
            if call.method == "GET" {
                return Ok(HttpResponse::new(200, body.clone()));
            }
            let path = body_path(call);
            let delay = match path.as_str() {
                "a/slow" => 60,
                "b/medium" => 30,
                _ => 0,
            };
            thread::sleep(Duration::from_millis(delay));
            Ok(HttpResponse::new(200, path.into_bytes()))
        }));
        let agg = aggregator(transport);

        let result = agg.search(&FilterState::default()).unwrap();
        let ids: Vec<_> = result.iter().map(|r| r.record.identifier.as_str()).collect();
        assert_eq!(ids, paths);

        for entry in result.iter() {
            let uri = entry.asset.as_ref().unwrap();
            let bytes = agg.registry().get(uri).unwrap();
            assert_eq!(&*bytes, entry.record.identifier.as_bytes());
        }
    }

    #[test]
    fn test_asset_fetches_overlap() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let paths = ["a/1", "b/2", "c/3", "d/4", "e/5", "f/6"];
        let body = nodes(&paths);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (running_in, peak_in) = (running.clone(), peak.clone());
        let transport = Arc::new(FakeTransport::new(move |call| {
            if call.method == "GET" {
                return Ok(HttpResponse::new(200, body.clone()));
            }
            let now = running_in.fetch_add(1, Ordering::SeqCst) + 1;
            peak_in.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(100));
            running_in.fetch_sub(1, Ordering::SeqCst);
            Ok(HttpResponse::new(200, "img"))
        }));
        let agg = aggregator(transport);

        let start = Instant::now();
        let result = agg.search(&FilterState::default()).unwrap();
        let elapsed = start.elapsed();

        assert_eq!(result.len(), paths.len());
        assert_eq!(result.missing_assets(), 0);
        assert!(
            peak.load(Ordering::SeqCst) > 1,
            "avatar requests never ran at the same time"
        );
        // six 100ms fetches back to back would take 600ms
        assert!(elapsed < Duration::from_millis(450), "took {:?}", elapsed);
        assert_eq!(running.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_partial_failure_keeps_placeholders() {
        let body = nodes(&["a/ok", "b/broken", "c/ok", "d/broken"]);
        let transport = Arc::new(FakeTransport::new(move |call| {
            if call.url.contains("/search?") {
                return Ok(HttpResponse::new(200, body.clone()));
            }
            let broken = call.url.contains("broken") || body_path(call).contains("broken");
            if broken {
                Ok(HttpResponse::new(500, ""))
            } else {
                Ok(HttpResponse::new(200, "img"))
            }
        }));
        let agg = aggregator(transport.clone());

        let result = agg.search(&FilterState::default()).unwrap();
        assert_eq!(result.len(), 4);
        assert_eq!(result.missing_assets(), 2);
        let with_asset: Vec<_> = result
            .iter()
            .filter(|r| r.asset.is_some())
            .map(|r| r.record.identifier.as_str())
            .collect();
        assert_eq!(with_asset, ["a/ok", "c/ok"]);
        assert!(result.results[1].asset.is_none());
        assert_eq!(agg.registry().live_count(), 2);

        // 1 query + 4 primaries + 2 fallbacks
        assert_eq!(transport.calls().len(), 7);
    }

    #[test]
    fn test_dropping_result_set_releases_assets() {
        let body = nodes(&["a/one", "b/two"]);
        let transport = Arc::new(FakeTransport::new(move |call| match call.method {
            "GET" => Ok(HttpResponse::new(200, body.clone())),
            _ => Ok(HttpResponse::new(200, "img")),
        }));
        let agg = aggregator(transport);

        let first = agg.search(&FilterState::default()).unwrap();
        assert_eq!(agg.registry().live_count(), 2);
        let second = agg.search(&FilterState::default()).unwrap();
        assert_eq!(agg.registry().live_count(), 4);

        drop(first);
        assert_eq!(agg.registry().live_count(), 2);
        drop(second);
        assert_eq!(agg.registry().live_count(), 0);
    }

    #[test]
    fn test_query_failures() {
        let status = aggregator(Arc::new(FakeTransport::new(|_| {
            Ok(HttpResponse::new(503, ""))
        })));
        assert!(matches!(
            status.search(&FilterState::default()),
            Err(SearchError::QueryFailed(QueryFailure::Status(503)))
        ));

        let malformed = aggregator(Arc::new(FakeTransport::new(|_| {
            Ok(HttpResponse::new(200, "not json"))
        })));
        assert!(matches!(
            malformed.search(&FilterState::default()),
            Err(SearchError::QueryFailed(QueryFailure::Malformed(_)))
        ));

        let offline = aggregator(Arc::new(FakeTransport::new(|call| {
            Err(unreachable(&call.url))
        })));
        assert!(matches!(
            offline.search(&FilterState::default()),
            Err(SearchError::QueryFailed(QueryFailure::Transport(_)))
        ));
    }
}
