//! Panel layout state for the NewTube streaming dashboard.
//!
//! The dashboard is a grid of panels (feeds, search, player, recommendations,
//! ...) arranged into named, versioned layouts. This crate owns that state:
//! building panels and the starter layout, applying edits, and mirroring the
//! `{layouts, currentLayout}` slice to key-value storage so it survives
//! restarts. Rendering and drag-and-drop live in the host; they call into
//! [`store::LayoutStore`] and re-render from what it returns.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | `LayoutStore`: mutations, rehydration, dirty tracking |
//! | [`layout`] | `Layout`, grid geometry, the default starter layout |
//! | [`panel`] | `Panel`, panel types, per-type config, title resolver |
//! | [`persistence`] | `Storage` backends and the persisted envelope |
//! | [`config`] | Environment-driven `StoreConfig` |
//! | [`ids`] | Injected id generators |
//! | [`clock`] | Injected time source |
//! | [`error`] | `ErrorCode` trait shared by all error enums |
//! | [`consts`] | Storage key, grid defaults, id prefixes |

pub mod clock;
pub mod config;
pub mod consts;
pub mod error;
pub mod ids;
pub mod layout;
pub mod panel;
pub mod persistence;
pub mod store;
