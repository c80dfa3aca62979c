use anyhow::{Context, Result};
use chub_search::{
    AssetRegistry, Aggregator, Endpoints, FilterState, ReqwestTransport, SearchSettings, SortKey,
    Transport,
};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Per-run overrides of the settings file
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Results per page
    #[arg(long, global = true, value_name = "N")]
    pub count: Option<u32>,

    /// Include NSFW characters unless a filter says otherwise
    #[arg(long, global = true)]
    pub nsfw: bool,

    /// Base URL of the host application that imports characters
    #[arg(long, global = true, value_name = "URL")]
    pub host: Option<String>,

    /// Settings file to read instead of ~/.chub/settings.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,
}

impl SettingsArgs {
    pub fn path(&self) -> Result<PathBuf> {
        match &self.settings {
            Some(path) => Ok(path.clone()),
            None => Ok(chub_search::settings_path()?),
        }
    }

    /// Settings file with command line overrides applied
    pub fn load(&self) -> Result<SearchSettings> {
        let path = self.path()?;
        let mut settings = chub_search::config::load_settings_from(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;

        if let Some(count) = self.count {
            settings.find_count = count;
        }
        if self.nsfw {
            settings.nsfw = true;
        }
        if let Some(host) = &self.host {
            settings.host_url = host.clone();
        }
        Ok(settings)
    }
}

/// Filter flags shared by `search` and `query`
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Search term
    #[arg(value_name = "TERM")]
    pub term: Option<String>,

    /// Tags to include (comma separated)
    #[arg(long, value_name = "TAGS")]
    pub tags: Option<String>,

    /// Tags to exclude (comma separated)
    #[arg(long, value_name = "TAGS")]
    pub exclude: Option<String>,

    /// Sort order, e.g. download_count, rating, n_tokens
    #[arg(long, default_value = "download_count")]
    pub sort: String,

    /// Page number (starting at 1)
    #[arg(long, default_value_t = 1)]
    pub page: u32,
}

impl FilterArgs {
    pub fn filter_state(&self) -> FilterState {
        let tags = |text: &Option<String>| {
            text.as_deref()
                .map(chub_search::filter::split_tags)
                .unwrap_or_default()
        };
        FilterState {
            search_term: self.term.clone().unwrap_or_default(),
            include_tags: tags(&self.tags),
            exclude_tags: tags(&self.exclude),
            nsfw: None,
            sort: SortKey::from(self.sort.as_str()),
            page: self.page.max(1),
        }
    }
}

pub fn transport() -> Result<Arc<dyn Transport>> {
    let transport = ReqwestTransport::new().context("Failed to create HTTP client")?;
    Ok(Arc::new(transport))
}

pub fn aggregator(transport: Arc<dyn Transport>, settings: SearchSettings) -> Aggregator {
    Aggregator::new(
        transport,
        AssetRegistry::new(),
        settings,
        Endpoints::from_env(),
    )
}
