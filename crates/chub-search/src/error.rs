use thiserror::Error;

use crate::http::TransportError;

/// Why a catalog query produced no result set
#[derive(Debug, Error)]
pub enum QueryFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("catalog returned HTTP {0}")]
    Status(u16),

    #[error("malformed catalog response: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search failed: {0}")]
    QueryFailed(#[from] QueryFailure),

    #[error("could not fetch avatar for {identifier}")]
    FetchFailed { identifier: String },

    #[error("failed to download {identifier} (HTTP {status})")]
    DownloadFailed { identifier: String, status: u16 },

    #[error("unknown content type: {kind}")]
    UnrecognizedContentKind { kind: String },

    #[error("host refused to import {file_name}: {source}")]
    ImportRejected {
        file_name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to render panel: {0}")]
    Render(#[from] minijinja::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to get home directory")]
    NoHome,
}
