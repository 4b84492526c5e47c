//! Shared constants for the layout store.

// ── Persistence ─────────────────────────────────────────────────

/// Storage key under which the `{layouts, currentLayout}` slice is persisted.
pub const STORAGE_KEY: &str = "newtube-layout-storage";

/// Schema version written into the persisted envelope. Records carrying any
/// other version are discarded on rehydration.
pub const STORAGE_SCHEMA_VERSION: u32 = 0;

// ── Ownership ───────────────────────────────────────────────────

/// Owner recorded on layouts when no authenticated user is available.
pub const PLACEHOLDER_USER_ID: &str = "current-user";

// ── Default layout ──────────────────────────────────────────────

/// Fixed id of the auto-created starter layout.
pub const DEFAULT_LAYOUT_ID: &str = "default-layout";

/// Display name of the auto-created starter layout.
pub const DEFAULT_LAYOUT_NAME: &str = "Default Layout";

// ── Grid geometry ───────────────────────────────────────────────

pub const GRID_COLUMNS: u32 = 3;
pub const GRID_ROWS: u32 = 2;
pub const GRID_GAP: u32 = 16;
pub const GRID_CELL_SIZE: u32 = 200;

// ── New panels ──────────────────────────────────────────────────

/// Width given to panels added through `add_panel`.
pub const NEW_PANEL_WIDTH: u32 = 400;

/// Height given to panels added through `add_panel`.
pub const NEW_PANEL_HEIGHT: u32 = 300;

/// Title used when a raw panel type string names no known type.
pub const FALLBACK_PANEL_TITLE: &str = "Panel";

// ── Id prefixes ─────────────────────────────────────────────────

pub const LAYOUT_ID_PREFIX: &str = "layout";
pub const PANEL_ID_PREFIX: &str = "panel";
