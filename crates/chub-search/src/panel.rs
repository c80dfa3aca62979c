//! Keeps the rendered panel alive across close and reopen

use crate::filter::SearchForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelId(u64);

impl PanelId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Captured panel: markup plus the filter values it was rendered with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSnapshot {
    pub id: PanelId,
    pub markup: String,
    pub form: SearchForm,
}

/// The host's popup area
pub trait DisplaySurface {
    /// Attach the panel and make it visible
    fn show(&mut self, snapshot: &PanelSnapshot);

    /// Hide the panel without destroying it
    fn hide(&mut self);

    /// Whether the panel `id` is still reachable from the host's document
    fn contains(&self, id: PanelId) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelOpen {
    /// First open of this session
    Built,
    /// Saved panel re-attached without rendering
    Restored,
    /// Saved panel was torn down by the host and had to be rebuilt
    Rebuilt,
}

#[derive(Debug)]
enum PanelState {
    Empty,
    Cached(PanelSnapshot),
}

#[derive(Debug)]
pub struct PanelCache {
    state: PanelState,
    visible: bool,
    /// Set when the surface dropped the saved panel behind our back
    lost: bool,
    next_id: u64,
}

impl Default for PanelCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelCache {
    pub fn new() -> Self {
        Self {
            state: PanelState::Empty,
            visible: false,
            lost: false,
            next_id: 0,
        }
    }

    pub fn snapshot(&self) -> Option<&PanelSnapshot> {
        match &self.state {
            PanelState::Cached(snapshot) => Some(snapshot),
            PanelState::Empty => None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show the panel, re-attaching the saved one when the surface still has it
    ///
    /// `build` is only called when there is nothing to restore.
    pub fn open<E>(
        &mut self,
        surface: &mut dyn DisplaySurface,
        build: impl FnOnce(PanelId, PanelOpen) -> Result<PanelSnapshot, E>,
    ) -> Result<PanelOpen, E> {
        let kind = match &self.state {
            PanelState::Cached(snapshot) if surface.contains(snapshot.id) => {
                log::debug!("Using saved panel content");
                surface.show(snapshot);
                self.visible = true;
                return Ok(PanelOpen::Restored);
            }
            PanelState::Cached(snapshot) => {
                log::info!(
                    "Panel {} is no longer attached, removing reference",
                    snapshot.id.get()
                );
                PanelOpen::Rebuilt
            }
            PanelState::Empty if self.lost => PanelOpen::Rebuilt,
            PanelState::Empty => PanelOpen::Built,
        };

        self.state = PanelState::Empty;
        self.lost = false;
        self.next_id += 1;
        let snapshot = build(PanelId(self.next_id), kind)?;
        surface.show(&snapshot);
        self.state = PanelState::Cached(snapshot);
        self.visible = true;
        Ok(kind)
    }

    pub fn close(&mut self, surface: &mut dyn DisplaySurface) {
        if self.visible {
            surface.hide();
            self.visible = false;
        }
    }

    /// Re-render the saved panel in place
    ///
    /// Returns `false` without rendering when there is no panel. A panel the
    /// surface no longer holds is dropped; the next [`PanelCache::open`] rebuilds.
    pub fn refresh<E>(
        &mut self,
        surface: &mut dyn DisplaySurface,
        render: impl FnOnce(PanelId) -> Result<String, E>,
    ) -> Result<bool, E> {
        let PanelState::Cached(snapshot) = &mut self.state else {
            return Ok(false);
        };
        if !surface.contains(snapshot.id) {
            log::info!(
                "Panel {} is no longer attached, removing reference",
                snapshot.id.get()
            );
            self.state = PanelState::Empty;
            self.visible = false;
            self.lost = true;
            return Ok(false);
        }

        snapshot.markup = render(snapshot.id)?;
        if self.visible {
            surface.show(snapshot);
        }
        Ok(true)
    }

    /// Update the saved form values without re-rendering
    pub fn set_form(&mut self, form: &SearchForm) {
        if let PanelState::Cached(snapshot) = &mut self.state {
            snapshot.form = form.clone();
        }
    }
}

/// Surface that keeps the attached panel in memory
#[derive(Debug, Default)]
pub struct MemorySurface {
    attached: Option<PanelSnapshot>,
    visible: bool,
    shows: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markup currently displayed, `None` while hidden
    pub fn displayed(&self) -> Option<&str> {
        self.attached
            .as_ref()
            .filter(|_| self.visible)
            .map(|s| s.markup.as_str())
    }

    pub fn attached(&self) -> Option<&PanelSnapshot> {
        self.attached.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Number of `show` calls so far
    pub fn show_count(&self) -> usize {
        self.shows
    }

    /// Destroy the attached panel as if the host rebuilt its popup
    pub fn tear_down(&mut self) {
        self.attached = None;
        self.visible = false;
    }
}

impl DisplaySurface for MemorySurface {
    fn show(&mut self, snapshot: &PanelSnapshot) {
        self.attached = Some(snapshot.clone());
        self.visible = true;
        self.shows += 1;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn contains(&self, id: PanelId) -> bool {
        self.attached.as_ref().is_some_and(|s| s.id == id)
    }
}
