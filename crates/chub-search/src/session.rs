//! One interactive search session: form state, debounced searches on worker
//! threads, the live result set and the cached panel

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::aggregate::{Aggregator, ResultSet};
use crate::config::SearchSettings;
use crate::debounce::{Debouncer, TriggerKind};
use crate::download::{DownloadDispatcher, DownloadOutcome};
use crate::error::SearchError;
use crate::filter::{FilterState, SearchForm, SortKey};
use crate::panel::{DisplaySurface, PanelCache, PanelOpen, PanelSnapshot};
use crate::render::{ListStatus, Renderer};

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// User interactions with the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Search,
    SetSearchTerm(String),
    SetIncludeTags(String),
    SetExcludeTags(String),
    PageUp,
    PageDown,
    SetPage(u32),
    ToggleNsfw,
    SelectSort(SortKey),
    Download(String),
}

impl Action {
    fn trigger_kind(&self) -> TriggerKind {
        match self {
            Action::PageUp | Action::PageDown | Action::SetPage(_) => TriggerKind::Pagination,
            _ => TriggerKind::Input,
        }
    }
}

#[derive(Debug)]
pub enum Dispatched {
    /// Waiting for the quiet window
    Scheduled,
    /// Search with this id is running
    Started(u64),
    Download(Result<DownloadOutcome, SearchError>),
}

struct SearchOutcome {
    id: u64,
    result: Result<ResultSet, SearchError>,
}

pub struct Session<S: DisplaySurface> {
    aggregator: Arc<Aggregator>,
    downloads: DownloadDispatcher,
    renderer: Renderer,
    form: SearchForm,
    debouncer: Debouncer<FilterState>,
    panel: PanelCache,
    surface: S,
    /// Results of the latest committed search
    live: Option<ResultSet>,
    status: ListStatus,
    last_error: Option<SearchError>,
    /// Id of the latest started search; older outcomes are stale
    query_counter: u64,
    in_flight: usize,
    result_tx: Sender<SearchOutcome>,
    result_rx: Receiver<SearchOutcome>,
}

impl<S: DisplaySurface> Session<S> {
    pub fn new(
        aggregator: Aggregator,
        downloads: DownloadDispatcher,
        surface: S,
    ) -> Result<Self, SearchError> {
        let (result_tx, result_rx) = mpsc::channel();
        let form = SearchForm::new(aggregator.settings().nsfw);
        Ok(Self {
            aggregator: Arc::new(aggregator),
            downloads,
            renderer: Renderer::new()?,
            form,
            debouncer: Debouncer::default(),
            panel: PanelCache::new(),
            surface,
            live: None,
            status: ListStatus::Idle,
            last_error: None,
            query_counter: 0,
            in_flight: 0,
            result_tx,
            result_rx,
        })
    }

    pub fn form(&self) -> &SearchForm {
        &self.form
    }

    pub fn settings(&self) -> &SearchSettings {
        self.aggregator.settings()
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn status(&self) -> ListStatus {
        self.status
    }

    pub fn live(&self) -> Option<&ResultSet> {
        self.live.as_ref()
    }

    pub fn last_error(&self) -> Option<&SearchError> {
        self.last_error.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn panel(&self) -> &PanelCache {
        &self.panel
    }

    /// Id of the most recently started search, 0 before the first one
    pub fn search_id(&self) -> u64 {
        self.query_counter
    }

    /// A search is waiting for the quiet window or still running
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0 || self.debouncer.is_pending()
    }

    /// Apply a user action to the form and schedule or start a search
    pub fn dispatch(&mut self, action: Action, now: Instant) -> Result<Dispatched, SearchError> {
        let kind = action.trigger_kind();
        match action {
            Action::Download(identifier) => {
                return Ok(Dispatched::Download(self.downloads.download(&identifier)));
            }
            Action::Search => {}
            Action::SetSearchTerm(text) => self.form.search_text = text,
            Action::SetIncludeTags(text) => self.form.include_text = text,
            Action::SetExcludeTags(text) => self.form.exclude_text = text,
            Action::ToggleNsfw => self.form.nsfw = !self.form.nsfw,
            Action::SelectSort(key) => self.form.sort = key,
            Action::PageUp => self.form.page = self.form.page.saturating_add(1).max(1),
            Action::PageDown => self.form.page = self.form.page.saturating_sub(1).max(1),
            Action::SetPage(page) => self.form.page = page.max(1),
        }
        if kind == TriggerKind::Input {
            self.form.page = 1;
        }

        match self.debouncer.trigger(self.form.filter_state(), kind, now) {
            Some(filter) => Ok(Dispatched::Started(self.start_search(filter)?)),
            None => {
                self.refresh_panel()?;
                Ok(Dispatched::Scheduled)
            }
        }
    }

    /// Start a debounced search whose window has passed, then commit finished ones
    pub fn tick(&mut self, now: Instant) -> Result<(), SearchError> {
        if let Some(filter) = self.debouncer.poll(now) {
            self.start_search(filter)?;
        }
        self.poll_results()?;
        Ok(())
    }

    /// Block until nothing is pending or running. Returns `false` on timeout.
    pub fn wait_idle(&mut self, timeout: Duration) -> Result<bool, SearchError> {
        let deadline = Instant::now() + timeout;
        loop {
            self.tick(Instant::now())?;
            if !self.is_busy() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            thread::sleep(IDLE_POLL_INTERVAL);
        }
    }

    fn start_search(&mut self, filter: FilterState) -> Result<u64, SearchError> {
        self.query_counter += 1;
        let id = self.query_counter;
        log::debug!("Starting search {} ({:?}, page {})", id, filter.search_term, filter.page);

        let aggregator = self.aggregator.clone();
        let result_tx = self.result_tx.clone();
        thread::spawn(move || {
            let result = aggregator.search(&filter);
            let _ = result_tx.send(SearchOutcome { id, result });
        });
        self.in_flight += 1;

        self.status = ListStatus::Searching;
        self.refresh_panel()?;
        Ok(id)
    }

    /// Commit the outcome of the latest search (non-blocking)
    ///
    /// Outcomes of older searches are dropped on arrival, which releases
    /// their asset references. Returns `true` when the view changed.
    pub fn poll_results(&mut self) -> Result<bool, SearchError> {
        let mut committed = false;
        while let Ok(outcome) = self.result_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            if outcome.id != self.query_counter {
                log::debug!(
                    "Discarding results of search {} (latest is {})",
                    outcome.id,
                    self.query_counter
                );
                continue;
            }

            match outcome.result {
                Ok(results) => {
                    self.status = if results.is_empty() {
                        ListStatus::NoResults
                    } else {
                        ListStatus::Idle
                    };
                    self.live = Some(results);
                    self.last_error = None;
                }
                Err(e) => {
                    log::error!("Error searching characters: {}", e);
                    self.status = ListStatus::Failed;
                    self.live = None;
                    self.last_error = Some(e);
                }
            }
            committed = true;
        }

        if committed {
            self.refresh_panel()?;
        }
        Ok(committed)
    }

    /// Show the panel, restoring the saved one when the surface still holds it
    pub fn open_panel(&mut self) -> Result<PanelOpen, SearchError> {
        let Self {
            aggregator,
            renderer,
            form,
            debouncer,
            panel,
            surface,
            live,
            status,
            ..
        } = self;

        panel.open(surface, |id, kind| -> Result<PanelSnapshot, SearchError> {
            if kind == PanelOpen::Rebuilt {
                // Pending input belonged to the old form
                debouncer.cancel();
                *form = SearchForm::new(aggregator.settings().nsfw);
            }
            let markup = renderer.render_panel(id.get(), form, *status, live.as_ref())?;
            Ok(PanelSnapshot {
                id,
                markup,
                form: form.clone(),
            })
        })
    }

    pub fn close_panel(&mut self) {
        self.panel.close(&mut self.surface);
    }

    fn refresh_panel(&mut self) -> Result<(), SearchError> {
        let Self {
            renderer,
            form,
            panel,
            surface,
            live,
            status,
            ..
        } = self;

        panel.refresh(surface, |id| {
            renderer.render_panel(id.get(), form, *status, live.as_ref())
        })?;
        panel.set_form(form);
        Ok(())
    }
}
