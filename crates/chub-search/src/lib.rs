pub mod aggregate;
pub mod asset;
pub mod catalog;
pub mod config;
pub mod debounce;
pub mod download;
pub mod error;
pub mod filter;
pub mod http;
pub mod panel;
pub mod query;
pub mod render;
pub mod session;

pub use aggregate::{Aggregator, EnrichedResult, ResultSet};
pub use asset::{AssetRegistry, AssetResolver, AssetScope, AssetUri};
pub use catalog::{fetch_catalog, CatalogRecord};
pub use config::{load_settings, save_settings_to, settings_path, Endpoints, SearchSettings};
pub use debounce::{Debouncer, TriggerKind, QUIET_WINDOW};
pub use download::{
    DownloadDispatcher, DownloadOutcome, ImportHost, ImportedFile, Notice, NoticeLevel,
};
pub use error::{ConfigError, QueryFailure, SearchError};
pub use filter::{FilterState, SearchForm, SortKey};
pub use http::{HttpResponse, ReqwestTransport, Transport, TransportError};
pub use panel::{DisplaySurface, MemorySurface, PanelCache, PanelId, PanelOpen, PanelSnapshot};
pub use query::{build_search_request, SearchRequest};
pub use render::{ListStatus, Renderer};
pub use session::{Action, Dispatched, Session};
