//! Layout store: the single owner of panel layout state.
//!
//! DESIGN
//! ======
//! `LayoutStore` holds the active layout and the list of saved layouts. All
//! mutation goes through its methods; each one validates, applies the change
//! in memory, then writes the `{layouts, currentLayout}` slice to storage.
//! Panel mutations act on the active layout, bump its version, and copy the
//! result over the `layouts` entry with the same id (if there is one).
//!
//! The store is uninitialized until a layout becomes active through
//! `set_current_layout`, `create_default_layout`, or `rehydrate`. While
//! uninitialized, panel operations fail with `NoActiveLayout`.
//!
//! ERROR HANDLING
//! ==============
//! Failed operations leave state untouched and say why (`NoActiveLayout`,
//! `PanelNotFound`, `LayoutNotFound`, `InvalidPanel`). Every path that puts
//! panels into the store checks them the way rehydration will, so the store
//! never writes a record it can't read back. A storage write that
//! fails after a successful mutation does not undo it: the error is logged,
//! the store is marked dirty, and the next mutation or an explicit `flush`
//! writes the full slice again.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::consts::{DEFAULT_LAYOUT_ID, LAYOUT_ID_PREFIX, PANEL_ID_PREFIX};
use crate::error::ErrorCode;
use crate::ids::{IdGenerator, TimestampIds};
use crate::layout::{Layout, LayoutUpdate, default_layout};
use crate::panel::{Panel, PanelConfig, PanelError, PanelType, PanelUpdate};
use crate::persistence::{self, Storage, StorageError};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no active layout")]
    NoActiveLayout,
    #[error("panel not found: {0}")]
    PanelNotFound(String),
    #[error("layout not found: {0}")]
    LayoutNotFound(String),
    #[error("invalid panel: {0}")]
    InvalidPanel(#[from] PanelError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NoActiveLayout => "E_NO_ACTIVE_LAYOUT",
            Self::PanelNotFound(_) => "E_PANEL_NOT_FOUND",
            Self::LayoutNotFound(_) => "E_LAYOUT_NOT_FOUND",
            Self::InvalidPanel(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Storage(e) => e.retryable(),
            _ => false,
        }
    }
}

/// Panel layout state plus the storage it is mirrored to.
pub struct LayoutStore<S: Storage> {
    storage: S,
    config: StoreConfig,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
    current_layout: Option<Layout>,
    layouts: Vec<Layout>,
    dirty: bool,
}

impl<S: Storage> LayoutStore<S> {
    /// An uninitialized store using the system clock and timestamp ids.
    /// Nothing is read from `storage` until [`LayoutStore::rehydrate`].
    #[must_use]
    pub fn new(storage: S, config: StoreConfig) -> Self {
        Self {
            storage,
            config,
            ids: Box::new(TimestampIds),
            clock: Box::new(SystemClock),
            current_layout: None,
            layouts: Vec::new(),
            dirty: false,
        }
    }

    #[must_use]
    pub fn with_ids(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    // =========================================================================
    // READS
    // =========================================================================

    #[must_use]
    pub fn current_layout(&self) -> Option<&Layout> {
        self.current_layout.as_ref()
    }

    #[must_use]
    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    #[must_use]
    pub fn layout(&self, layout_id: &str) -> Option<&Layout> {
        self.layouts.iter().find(|l| l.id == layout_id)
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// `true` when in-memory state is ahead of storage because a write failed.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // =========================================================================
    // REHYDRATION
    // =========================================================================

    /// Load persisted state, then make sure a layout is active. If nothing
    /// usable was stored (no current layout, or no layouts at all), the
    /// default layout is created and written back.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the record can't be read or is corrupt. The
    /// in-memory state is left unchanged in that case.
    pub fn rehydrate(&mut self) -> Result<(), StoreError> {
        let restored = persistence::load_state(&self.storage, &self.config.storage_key)?;
        if let Some(state) = restored {
            self.layouts = state.layouts;
            self.current_layout = state.current_layout;
        }

        if self.current_layout.is_none() || self.layouts.is_empty() {
            info!(
                has_current = self.current_layout.is_some(),
                layouts = self.layouts.len(),
                "no usable layout state; creating default layout"
            );
            self.create_default_layout();
        } else {
            info!(
                layouts = self.layouts.len(),
                current = self.current_layout.as_ref().map_or("", |l| l.id.as_str()),
                "layout state rehydrated"
            );
        }
        Ok(())
    }

    /// Like [`LayoutStore::rehydrate`], but a corrupt record is deleted and
    /// replaced with the default layout instead of failing.
    ///
    /// # Errors
    ///
    /// Returns `Storage` only for backend read failures, or if the corrupt
    /// record can't be removed.
    pub fn rehydrate_or_reset(&mut self) -> Result<(), StoreError> {
        match self.rehydrate() {
            Err(StoreError::Storage(StorageError::Corrupt { key, source })) => {
                warn!(%key, error = %source, "stored layout state is corrupt; resetting");
                self.storage.remove_item(&key)?;
                self.layouts.clear();
                self.current_layout = None;
                self.create_default_layout();
                Ok(())
            }
            other => other,
        }
    }

    // =========================================================================
    // LAYOUTS
    // =========================================================================

    /// Replace the active layout. The layout need not be one of `layouts`,
    /// and `layouts` is not touched.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPanel` if a panel would not load back from storage.
    /// The active layout is unchanged in that case.
    pub fn set_current_layout(&mut self, layout: Option<Layout>) -> Result<(), StoreError> {
        if let Some(layout) = &layout {
            layout.validate()?;
        }
        debug!(layout_id = layout.as_ref().map_or("", |l| l.id.as_str()), "set current layout");
        self.current_layout = layout;
        self.persist();
        Ok(())
    }

    /// Make the saved layout `layout_id` active.
    ///
    /// # Errors
    ///
    /// Returns `LayoutNotFound` if no saved layout has that id.
    pub fn activate_layout(&mut self, layout_id: &str) -> Result<Layout, StoreError> {
        let layout = self
            .layout(layout_id)
            .cloned()
            .ok_or_else(|| StoreError::LayoutNotFound(layout_id.to_owned()))?;
        self.set_current_layout(Some(layout.clone()))?;
        Ok(layout)
    }

    /// Create an empty layout, append it to `layouts`, and return it. The
    /// active layout does not change.
    pub fn create_layout(&mut self, name: &str) -> Layout {
        let id = self.ids.next_id(LAYOUT_ID_PREFIX);
        let layout = Layout::new(id, &self.config.user_id, name, self.clock.now());
        debug!(layout_id = %layout.id, name, "layout created");
        self.layouts.push(layout.clone());
        self.persist();
        layout
    }

    /// Remove a saved layout. Clears the active layout if it has the same id.
    ///
    /// # Errors
    ///
    /// Returns `LayoutNotFound` if neither the saved list nor the active
    /// layout has that id.
    pub fn delete_layout(&mut self, layout_id: &str) -> Result<(), StoreError> {
        let before = self.layouts.len();
        self.layouts.retain(|l| l.id != layout_id);
        let removed = self.layouts.len() != before;

        let was_current = self.current_layout.as_ref().is_some_and(|l| l.id == layout_id);
        if was_current {
            self.current_layout = None;
        }

        if !removed && !was_current {
            return Err(StoreError::LayoutNotFound(layout_id.to_owned()));
        }
        debug!(layout_id, was_current, "layout deleted");
        self.persist();
        Ok(())
    }

    /// Shallow-merge `update` into the saved layout and the active layout
    /// with this id. Each matched copy gets its own version bump.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPanel` if a replacement panel is invalid, and
    /// `LayoutNotFound` if no copy matched. Neither changes state.
    pub fn update_layout(&mut self, layout_id: &str, update: &LayoutUpdate) -> Result<Layout, StoreError> {
        update.validate()?;
        let now = self.clock.now();
        let mut result = None;

        if let Some(saved) = self.layouts.iter_mut().find(|l| l.id == layout_id) {
            saved.apply(update);
            saved.touch(now);
            result = Some(saved.clone());
        }
        if let Some(current) = self.current_layout.as_mut().filter(|l| l.id == layout_id) {
            current.apply(update);
            current.touch(now);
            result = Some(current.clone());
        }

        let layout = result.ok_or_else(|| StoreError::LayoutNotFound(layout_id.to_owned()))?;
        debug!(layout_id, version = layout.version, "layout updated");
        self.persist();
        Ok(layout)
    }

    /// Install the canonical starter layout at the front of `layouts`,
    /// replacing any earlier default, and make it active.
    pub fn create_default_layout(&mut self) -> Layout {
        let layout = default_layout(&mut *self.ids, &self.config.user_id, self.clock.now());
        self.layouts.retain(|l| l.id != DEFAULT_LAYOUT_ID);
        self.layouts.insert(0, layout.clone());
        self.current_layout = Some(layout.clone());
        info!(layout_id = DEFAULT_LAYOUT_ID, panels = layout.panels.len(), "default layout created");
        self.persist();
        layout
    }

    pub fn reset_to_default(&mut self) -> Layout {
        self.create_default_layout()
    }

    // =========================================================================
    // PANELS
    // =========================================================================

    /// Append a new panel of `kind` to the active layout. `config` is parsed
    /// against the type's record; `None` uses the type's default config.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveLayout` or `InvalidPanel`.
    pub fn add_panel(&mut self, kind: PanelType, config: Option<Value>) -> Result<Panel, StoreError> {
        if self.current_layout.is_none() {
            return Err(StoreError::NoActiveLayout);
        }
        let config = match config {
            Some(raw) => PanelConfig::from_value(kind, raw)?,
            None => PanelConfig::default_for(kind),
        };
        let panel = Panel::new(self.ids.next_id(PANEL_ID_PREFIX), config, None);

        let created = panel.clone();
        self.mutate_current(|layout| {
            layout.panels.push(panel);
            Ok(())
        })?;
        debug!(panel_id = %created.id, kind = %kind, "panel added");
        Ok(created)
    }

    /// Remove a panel from the active layout.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveLayout` or `PanelNotFound`.
    pub fn remove_panel(&mut self, panel_id: &str) -> Result<Panel, StoreError> {
        let removed = self.mutate_current(|layout| {
            let index = layout
                .panels
                .iter()
                .position(|p| p.id == panel_id)
                .ok_or_else(|| StoreError::PanelNotFound(panel_id.to_owned()))?;
            Ok(layout.panels.remove(index))
        })?;
        debug!(panel_id, "panel removed");
        Ok(removed)
    }

    /// Shallow-merge `update` into a panel of the active layout.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveLayout`, `PanelNotFound`, or `InvalidPanel`.
    pub fn update_panel(&mut self, panel_id: &str, update: &PanelUpdate) -> Result<Panel, StoreError> {
        let panel = self.mutate_current(|layout| {
            let panel = layout
                .panel_mut(panel_id)
                .ok_or_else(|| StoreError::PanelNotFound(panel_id.to_owned()))?;
            panel.apply(update)?;
            Ok(panel.clone())
        })?;
        debug!(panel_id, "panel updated");
        Ok(panel)
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Write the current slice to storage now, clearing the dirty flag.
    ///
    /// # Errors
    ///
    /// Returns the storage error; the store stays dirty.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        persistence::save_state(
            &mut self.storage,
            &self.config.storage_key,
            &self.layouts,
            self.current_layout.as_ref(),
        )?;
        self.dirty = false;
        Ok(())
    }

    /// Run `f` against the active layout. On success, bump its version,
    /// mirror it into `layouts`, and persist. On failure nothing changes.
    fn mutate_current<T>(&mut self, f: impl FnOnce(&mut Layout) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let current = self.current_layout.as_ref().ok_or(StoreError::NoActiveLayout)?;
        let mut next = current.clone();
        let out = f(&mut next)?;
        next.touch(self.clock.now());

        if let Some(saved) = self.layouts.iter_mut().find(|l| l.id == next.id) {
            saved.clone_from(&next);
        }
        self.current_layout = Some(next);
        self.persist();
        Ok(out)
    }

    fn persist(&mut self) {
        if let Err(e) = self.flush() {
            self.dirty = true;
            error!(error = %e, code = e.error_code(), "failed to persist layout state");
        }
    }
}
