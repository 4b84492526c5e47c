//! Layout model and the canonical starter layout.
//!
//! DESIGN
//! ======
//! A `Layout` is a named, versioned, ordered list of panels plus the grid
//! geometry they share. Layouts are plain data: the store owns version bumps
//! and `updatedAt` refreshes, so nothing here mutates those fields except
//! `touch`, which the store calls after every successful change.

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::consts::{
    DEFAULT_LAYOUT_ID, DEFAULT_LAYOUT_NAME, GRID_CELL_SIZE, GRID_COLUMNS, GRID_GAP, GRID_ROWS, PANEL_ID_PREFIX,
};
use crate::ids::IdGenerator;
use crate::panel::{
    Panel, PanelConfig, PanelError, PanelType, Position, RecommendationsConfig, SearchConfig, Size, VideoFeedConfig,
    WatchLaterConfig,
};

// =============================================================================
// GRID
// =============================================================================

/// Shared geometry of a layout's grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    pub columns: u32,
    pub rows: u32,
    pub gap: u32,
    pub cell_size: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { columns: GRID_COLUMNS, rows: GRID_ROWS, gap: GRID_GAP, cell_size: GRID_CELL_SIZE }
    }
}

// =============================================================================
// LAYOUT
// =============================================================================

/// A saved panel arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Display order is insertion order.
    pub panels: Vec<Panel>,
    pub grid_config: GridConfig,
    /// Bumped on every mutation; never decreases.
    pub version: u64,
    pub is_default: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Layout {
    /// An empty, non-default layout at version 1.
    #[must_use]
    pub fn new(id: String, user_id: &str, name: &str, now: OffsetDateTime) -> Self {
        Self {
            id,
            user_id: user_id.to_owned(),
            name: name.to_owned(),
            panels: Vec::new(),
            grid_config: GridConfig::default(),
            version: 1,
            is_default: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a mutation: bump `version` and refresh `updated_at`.
    pub fn touch(&mut self, now: OffsetDateTime) {
        self.version += 1;
        self.updated_at = now;
    }

    #[must_use]
    pub fn panel(&self, panel_id: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id == panel_id)
    }

    /// Validate every panel.
    ///
    /// # Errors
    ///
    /// Returns the first panel's `PanelError`.
    pub fn validate(&self) -> Result<(), PanelError> {
        self.panels.iter().try_for_each(Panel::validate)
    }

    pub(crate) fn panel_mut(&mut self, panel_id: &str) -> Option<&mut Panel> {
        self.panels.iter_mut().find(|p| p.id == panel_id)
    }

    /// Shallow-merge an update. Does not touch version or timestamps.
    pub fn apply(&mut self, update: &LayoutUpdate) {
        if let Some(name) = &update.name {
            self.name.clone_from(name);
        }
        if let Some(user_id) = &update.user_id {
            self.user_id.clone_from(user_id);
        }
        if let Some(panels) = &update.panels {
            self.panels.clone_from(panels);
        }
        if let Some(grid) = update.grid_config {
            self.grid_config = grid;
        }
    }
}

/// Sparse update for a layout. Store-managed fields (`id`, `version`,
/// `isDefault`, timestamps) are not updatable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LayoutUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panels: Option<Vec<Panel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_config: Option<GridConfig>,
}

impl LayoutUpdate {
    #[must_use]
    pub fn rename(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Self::default() }
    }

    /// Validate replacement panels, if any.
    ///
    /// # Errors
    ///
    /// Returns the first panel's `PanelError`.
    pub fn validate(&self) -> Result<(), PanelError> {
        self.panels.iter().flatten().try_for_each(Panel::validate)
    }
}

// =============================================================================
// DEFAULT LAYOUT
// =============================================================================

/// Build the canonical starter layout: YouTube feed, cross-platform search,
/// AI recommendations, and watch-later, on a 3x2 grid.
#[must_use]
pub fn default_layout(ids: &mut dyn IdGenerator, user_id: &str, now: OffsetDateTime) -> Layout {
    let mut layout = Layout::new(DEFAULT_LAYOUT_ID.to_owned(), user_id, DEFAULT_LAYOUT_NAME, now);
    layout.is_default = true;
    layout.panels = default_panels(ids);
    layout
}

/// The four starter panels, tiled on the default grid.
#[must_use]
pub fn default_panels(ids: &mut dyn IdGenerator) -> Vec<Panel> {
    let cell = GRID_CELL_SIZE;
    let gap = GRID_GAP;
    let wide = 3 * cell + 2 * gap;
    let narrow = 2 * cell + gap;
    let tall = 2 * cell + gap;

    let feed = PanelConfig::VideoFeed(VideoFeedConfig {
        platform: Some("youtube".into()),
        max_items: Some(20),
        ..VideoFeedConfig::default()
    });
    let search = PanelConfig::Search(SearchConfig {
        platforms: Some(vec!["youtube".into(), "twitch".into(), "vimeo".into()]),
        results_limit: Some(20),
        ..SearchConfig::default()
    });
    let recommendations = PanelConfig::Recommendations(RecommendationsConfig {
        source: Some("ai".into()),
        max_items: Some(10),
        ..RecommendationsConfig::default()
    });
    let watch_later = PanelConfig::WatchLater(WatchLaterConfig { max_items: Some(50), ..WatchLaterConfig::default() });

    vec![
        Panel::new(ids.next_id(PANEL_ID_PREFIX), feed, Some("YouTube Feed".into()))
            .with_geometry(Position::new(0, 0), Size::new(wide, tall)),
        Panel::new(ids.next_id(PANEL_ID_PREFIX), search, Some("Cross-Platform Search".into()))
            .with_geometry(Position::new(wide + gap, 0), Size::new(narrow, tall)),
        Panel::new(ids.next_id(PANEL_ID_PREFIX), recommendations, Some("AI Recommendations".into()))
            .with_geometry(Position::new(0, tall + gap), Size::new(wide, cell)),
        Panel::new(ids.next_id(PANEL_ID_PREFIX), watch_later, Some(PanelType::WatchLater.default_title().into()))
            .with_geometry(Position::new(wide + gap, tall + gap), Size::new(narrow, cell)),
    ]
}
