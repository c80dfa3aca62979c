//! Avatar resolution and the transient references that expose fetched bytes

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::Endpoints;
use crate::error::SearchError;
use crate::http::Transport;

/// Fetches the avatar for one catalog identifier, primary endpoint first
pub struct AssetResolver {
    transport: Arc<dyn Transport>,
    endpoints: Endpoints,
}

impl AssetResolver {
    pub fn new(transport: Arc<dyn Transport>, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// Exactly one fallback GET when the primary POST does not succeed
    pub fn resolve(&self, identifier: &str) -> Result<Vec<u8>, SearchError> {
        let body = serde_json::json!({
            "fullPath": identifier,
            "format": "tavern",
            "version": "main",
        });

        match self.transport.post_json(&self.endpoints.download, &body, &[]) {
            Ok(response) if response.is_success() => return Ok(response.body),
            Ok(response) => log::info!(
                "Request failed for {} (HTTP {}), trying backup endpoint",
                identifier,
                response.status
            ),
            Err(e) => log::info!(
                "Request failed for {} ({}), trying backup endpoint",
                identifier,
                e
            ),
        }

        let fallback_url = self.endpoints.avatar_url(identifier);
        match self.transport.get(&fallback_url) {
            Ok(response) if response.is_success() => Ok(response.body),
            Ok(response) => {
                log::warn!(
                    "Backup avatar for {} failed: HTTP {}",
                    identifier,
                    response.status
                );
                Err(SearchError::FetchFailed {
                    identifier: identifier.to_string(),
                })
            }
            Err(e) => {
                log::warn!("Backup avatar for {} failed: {}", identifier, e);
                Err(SearchError::FetchFailed {
                    identifier: identifier.to_string(),
                })
            }
        }
    }
}

/// Process-local handle to fetched image bytes, e.g. `chub-asset://3`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AssetUri(String);

impl AssetUri {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: u64,
    live: HashMap<AssetUri, Arc<[u8]>>,
}

/// Shared table of live asset references. Cloning shares the table.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn scope(&self) -> AssetScope {
        AssetScope {
            registry: self.clone(),
            uris: Vec::new(),
        }
    }

    pub fn get(&self, uri: &AssetUri) -> Option<Arc<[u8]>> {
        self.lock().live.get(uri).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    fn create(&self, bytes: Vec<u8>) -> AssetUri {
        let mut inner = self.lock();
        inner.next_id += 1;
        let uri = AssetUri(format!("chub-asset://{}", inner.next_id));
        inner.live.insert(uri.clone(), Arc::from(bytes));
        uri
    }

    fn revoke(&self, uri: &AssetUri) {
        self.lock().live.remove(uri);
    }
}

/// Owns every reference created for one result set and revokes them on drop
#[derive(Debug)]
pub struct AssetScope {
    registry: AssetRegistry,
    uris: Vec<AssetUri>,
}

impl AssetScope {
    pub fn register(&mut self, bytes: Vec<u8>) -> AssetUri {
        let uri = self.registry.create(bytes);
        self.uris.push(uri.clone());
        uri
    }

    pub fn len(&self) -> usize {
        self.uris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }
}

impl Drop for AssetScope {
    fn drop(&mut self) {
        if self.uris.is_empty() {
            return;
        }
        for uri in &self.uris {
            self.registry.revoke(uri);
        }
        log::debug!("Released {} asset references", self.uris.len());
    }
}
