use std::cell::Cell;
use std::rc::Rc;

use serde_json::json;
use time::OffsetDateTime;

use super::*;
use crate::clock::FixedClock;
use crate::ids::SequentialIds;
use crate::layout::GridConfig;
use crate::panel::{Position, SearchConfig, Size, VideoFeedConfig};
use crate::persistence::MemoryStorage;

const T0: i64 = 1_700_000_000;

/// Advances one second on every read so `updatedAt` refreshes are visible.
struct SteppingClock {
    secs: Cell<i64>,
}

impl Clock for SteppingClock {
    fn now(&self) -> OffsetDateTime {
        let secs = self.secs.get();
        self.secs.set(secs + 1);
        OffsetDateTime::from_unix_timestamp(secs).unwrap()
    }
}

/// Storage whose writes can be switched off from the test body.
#[derive(Clone, Default)]
struct FlakyStorage {
    inner: Rc<std::cell::RefCell<MemoryStorage>>,
    failing: Rc<Cell<bool>>,
}

impl Storage for FlakyStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.borrow().get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.failing.get() {
            return Err(StorageError::Io {
                key: key.to_owned(),
                source: std::io::Error::other("disk unplugged"),
            });
        }
        self.inner.borrow_mut().set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.inner.borrow_mut().remove_item(key)
    }
}

fn test_store() -> LayoutStore<MemoryStorage> {
    test_store_with(MemoryStorage::new())
}

fn test_store_with<S: Storage>(storage: S) -> LayoutStore<S> {
    LayoutStore::new(storage, StoreConfig::default())
        .with_ids(SequentialIds::new())
        .with_clock(SteppingClock { secs: Cell::new(T0) })
}

/// A store whose active layout is a fresh, empty user layout.
fn active_store() -> LayoutStore<MemoryStorage> {
    let mut store = test_store();
    let layout = store.create_layout("My Layout");
    store.set_current_layout(Some(layout)).unwrap();
    store
}

fn current(store: &LayoutStore<impl Storage>) -> &Layout {
    store.current_layout().unwrap()
}

fn stored_state(store: &LayoutStore<MemoryStorage>) -> serde_json::Value {
    let raw = store.storage().get_item("newtube-layout-storage").unwrap().unwrap();
    serde_json::from_str(&raw).unwrap()
}

// =============================================================
// Uninitialized store
// =============================================================

#[test]
fn new_store_is_uninitialized() {
    let store = test_store();
    assert!(store.current_layout().is_none());
    assert!(store.layouts().is_empty());
    assert!(!store.is_dirty());
    assert!(store.storage().is_empty());
    assert_eq!(store.config(), &StoreConfig::default());
}

#[test]
fn panel_ops_fail_without_active_layout() {
    let mut store = test_store();
    assert!(matches!(store.add_panel(PanelType::Search, None), Err(StoreError::NoActiveLayout)));
    assert!(matches!(store.remove_panel("panel-1"), Err(StoreError::NoActiveLayout)));
    assert!(matches!(
        store.update_panel("panel-1", &PanelUpdate::default()),
        Err(StoreError::NoActiveLayout)
    ));
    assert!(store.storage().is_empty());
}

#[test]
fn no_active_layout_error_code() {
    let err = StoreError::NoActiveLayout;
    assert_eq!(err.error_code(), "E_NO_ACTIVE_LAYOUT");
    assert!(!err.retryable());
}

// =============================================================
// create_layout / set_current_layout
// =============================================================

#[test]
fn create_layout_appends_without_activating() {
    let mut store = test_store();
    let layout = store.create_layout("My Layout");
    assert_eq!(layout.id, "layout-1");
    assert_eq!(layout.name, "My Layout");
    assert_eq!(layout.user_id, "current-user");
    assert_eq!(layout.version, 1);
    assert!(!layout.is_default);
    assert!(layout.panels.is_empty());
    assert_eq!(store.layouts(), &[layout]);
    assert!(store.current_layout().is_none());
}

#[test]
fn create_layout_accepts_empty_name() {
    let mut store = test_store();
    let layout = store.create_layout("");
    assert_eq!(layout.name, "");
    assert_eq!(store.layouts().len(), 1);
}

#[test]
fn create_layout_persists() {
    let mut store = test_store();
    store.create_layout("A");
    let state = stored_state(&store);
    assert_eq!(state["state"]["layouts"][0]["name"], json!("A"));
    assert_eq!(state["state"]["currentLayout"], json!(null));
}

#[test]
fn set_current_layout_replaces_unconditionally() {
    let mut store = test_store();
    let now = OffsetDateTime::from_unix_timestamp(T0).unwrap();
    let detached = Layout::new("elsewhere".into(), "someone", "Detached", now);
    store.set_current_layout(Some(detached.clone())).unwrap();
    assert_eq!(store.current_layout(), Some(&detached));
    assert!(store.layouts().is_empty());

    store.set_current_layout(None).unwrap();
    assert!(store.current_layout().is_none());
}

#[test]
fn set_current_layout_rejects_zero_limit_panel() {
    let mut store = active_store();
    let mut layout = store.create_layout("x");
    layout.panels.push(Panel::new(
        "panel-a".into(),
        PanelConfig::Search(SearchConfig { results_limit: Some(0), ..SearchConfig::default() }),
        None,
    ));

    let err = store.set_current_layout(Some(layout)).unwrap_err();
    assert!(matches!(err, StoreError::InvalidPanel(PanelError::ZeroCount { field: "resultsLimit", .. })));
    assert_eq!(err.error_code(), "E_INVALID_CONFIG");
    assert_eq!(current(&store).id, "layout-1");

    // What was written still loads, so a lenient restart keeps both layouts.
    let mut reloaded = test_store_with(store.storage().clone());
    reloaded.rehydrate_or_reset().unwrap();
    let ids: Vec<&str> = reloaded.layouts().iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["layout-1", "layout-2"]);
    assert_eq!(current(&reloaded).id, "layout-1");
}

#[test]
fn set_current_layout_checks_extra_config_keys() {
    let mut store = active_store();
    let mut extra = serde_json::Map::new();
    extra.insert("maxItems".into(), json!(0));
    let mut layout = store.create_layout("x");
    layout.panels.push(Panel::new(
        "panel-a".into(),
        PanelConfig::VideoFeed(VideoFeedConfig { extra, ..VideoFeedConfig::default() }),
        None,
    ));
    let err = store.set_current_layout(Some(layout)).unwrap_err();
    assert_eq!(err.error_code(), "E_INVALID_CONFIG");
    assert_eq!(current(&store).id, "layout-1");
}

#[test]
fn activate_layout_copies_saved_layout() {
    let mut store = test_store();
    let a = store.create_layout("A");
    store.create_layout("B");
    let activated = store.activate_layout(&a.id).unwrap();
    assert_eq!(activated, a);
    assert_eq!(current(&store).id, "layout-1");
}

#[test]
fn activate_layout_unknown_id() {
    let mut store = test_store();
    let err = store.activate_layout("missing").unwrap_err();
    assert!(matches!(err, StoreError::LayoutNotFound(ref id) if id == "missing"));
    assert_eq!(err.error_code(), "E_LAYOUT_NOT_FOUND");
}

// =============================================================
// add_panel
// =============================================================

#[test]
fn add_panel_scenario_with_config() {
    let mut store = active_store();
    store.add_panel(PanelType::Search, Some(json!({"resultsLimit": 5}))).unwrap();

    let layout = current(&store);
    assert_eq!(layout.panels.len(), 1);
    assert_eq!(layout.panels[0].config.get("resultsLimit"), Some(json!(5)));
    assert_eq!(layout.version, 2);
}

#[test]
fn add_panel_uses_factory_defaults() {
    let mut store = active_store();
    let panel = store.add_panel(PanelType::WatchLater, None).unwrap();
    assert_eq!(panel.id, "panel-2");
    assert_eq!(panel.title, "Watch Later");
    assert_eq!(panel.position, Position::new(0, 0));
    assert_eq!(panel.size, Size::new(400, 300));
    assert_eq!(panel.config, PanelConfig::default_for(PanelType::WatchLater));
}

#[test]
fn add_panel_stacks_at_origin() {
    let mut store = active_store();
    let a = store.add_panel(PanelType::List, None).unwrap();
    let b = store.add_panel(PanelType::Trending, None).unwrap();
    assert_eq!(a.position, b.position);
    assert_ne!(a.id, b.id);
    let ids: Vec<&str> = current(&store).panels.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec![a.id.as_str(), b.id.as_str()]);
}

#[test]
fn add_panel_rejects_invalid_config_without_bump() {
    let mut store = active_store();
    let err = store.add_panel(PanelType::Search, Some(json!({"resultsLimit": "lots"}))).unwrap_err();
    assert!(matches!(err, StoreError::InvalidPanel(_)));
    assert_eq!(err.error_code(), "E_INVALID_CONFIG");
    assert_eq!(current(&store).version, 1);
    assert!(current(&store).panels.is_empty());
}

#[test]
fn add_panel_mirrors_into_layouts() {
    let mut store = active_store();
    store.add_panel(PanelType::Search, None).unwrap();
    let saved = store.layout("layout-1").unwrap();
    assert_eq!(saved, current(&store));
    assert_eq!(saved.version, 2);
}

#[test]
fn add_panel_refreshes_updated_at() {
    let mut store = active_store();
    let before = current(&store).updated_at;
    store.add_panel(PanelType::Search, None).unwrap();
    let layout = current(&store);
    assert!(layout.updated_at > before);
    assert!(layout.created_at < layout.updated_at);
}

#[test]
fn add_panel_on_detached_layout_does_not_touch_layouts() {
    let mut store = test_store();
    let saved = store.create_layout("Saved");
    let now = OffsetDateTime::from_unix_timestamp(T0).unwrap();
    store.set_current_layout(Some(Layout::new("detached".into(), "u", "D", now))).unwrap();
    store.add_panel(PanelType::Custom, None).unwrap();
    assert_eq!(current(&store).version, 2);
    assert_eq!(store.layouts(), &[saved]);
}

// =============================================================
// remove_panel
// =============================================================

#[test]
fn remove_panel_removes_and_bumps() {
    let mut store = active_store();
    let panel = store.add_panel(PanelType::List, None).unwrap();
    let removed = store.remove_panel(&panel.id).unwrap();
    assert_eq!(removed, panel);
    assert!(current(&store).panels.is_empty());
    assert_eq!(current(&store).version, 3);
    assert_eq!(store.layout("layout-1").unwrap().version, 3);
}

#[test]
fn remove_panel_twice_is_idempotent() {
    let mut store = active_store();
    let panel = store.add_panel(PanelType::List, None).unwrap();
    store.remove_panel(&panel.id).unwrap();
    let version = current(&store).version;

    let err = store.remove_panel(&panel.id).unwrap_err();
    assert!(matches!(err, StoreError::PanelNotFound(_)));
    assert_eq!(err.error_code(), "E_PANEL_NOT_FOUND");
    assert_eq!(current(&store).version, version);
}

#[test]
fn version_counts_successful_panel_mutations() {
    let mut store = active_store();
    let mut successes = 0;
    let a = store.add_panel(PanelType::Search, None).unwrap();
    successes += 1;
    let b = store.add_panel(PanelType::List, None).unwrap();
    successes += 1;
    store.remove_panel(&a.id).unwrap();
    successes += 1;
    assert!(store.remove_panel(&a.id).is_err());
    assert!(store.remove_panel("nope").is_err());
    store.add_panel(PanelType::Trending, None).unwrap();
    successes += 1;
    store.remove_panel(&b.id).unwrap();
    successes += 1;

    assert_eq!(current(&store).version, 1 + successes);
}

// =============================================================
// update_panel
// =============================================================

#[test]
fn update_panel_merges_fields() {
    let mut store = active_store();
    let panel = store.add_panel(PanelType::VideoPlayer, None).unwrap();
    let update = PanelUpdate {
        title: Some("Now Playing".into()),
        position: Some(Position::new(10, 20)),
        size: Some(Size::new(640, 360)),
        config: Some(json!({"videoId": "dQw4w9WgXcQ", "autoplay": true})),
        ..PanelUpdate::default()
    };
    let updated = store.update_panel(&panel.id, &update).unwrap();
    assert_eq!(updated.title, "Now Playing");
    assert_eq!(updated.position, Position::new(10, 20));
    assert_eq!(updated.size, Size::new(640, 360));
    assert_eq!(updated.config.get("videoId"), Some(json!("dQw4w9WgXcQ")));
    assert!(updated.visible);
    assert_eq!(current(&store).panels[0], updated);
    assert_eq!(current(&store).version, 3);
    assert_eq!(store.layout("layout-1").unwrap().panels[0], updated);
}

#[test]
fn update_panel_unknown_id() {
    let mut store = active_store();
    let err = store.update_panel("ghost", &PanelUpdate::default()).unwrap_err();
    assert!(matches!(err, StoreError::PanelNotFound(ref id) if id == "ghost"));
    assert_eq!(current(&store).version, 1);
}

#[test]
fn update_panel_rejects_empty_size() {
    let mut store = active_store();
    let panel = store.add_panel(PanelType::List, None).unwrap();
    let update = PanelUpdate { size: Some(Size::new(0, 100)), ..PanelUpdate::default() };
    let err = store.update_panel(&panel.id, &update).unwrap_err();
    assert_eq!(err.error_code(), "E_INVALID_SIZE");
    assert_eq!(current(&store).version, 2);
    assert_eq!(current(&store).panels[0].size, Size::new(400, 300));
}

// =============================================================
// update_layout
// =============================================================

#[test]
fn update_layout_updates_saved_and_current() {
    let mut store = active_store();
    let updated = store.update_layout("layout-1", &LayoutUpdate::rename("Renamed")).unwrap();
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.version, 2);
    assert_eq!(current(&store).name, "Renamed");
    assert_eq!(store.layout("layout-1").unwrap().name, "Renamed");
    assert_eq!(store.layout("layout-1").unwrap().version, 2);
}

#[test]
fn update_layout_bumps_each_copy_independently() {
    let mut store = active_store();
    // Saved copy moves ahead of the active copy.
    store.update_layout("layout-1", &LayoutUpdate::rename("One")).unwrap();
    let stale = store.layout("layout-1").unwrap().clone();
    store.update_layout("layout-1", &LayoutUpdate::rename("Two")).unwrap();
    store.set_current_layout(Some(stale)).unwrap();

    store.update_layout("layout-1", &LayoutUpdate::rename("Three")).unwrap();
    assert_eq!(store.layout("layout-1").unwrap().version, 4);
    assert_eq!(current(&store).version, 3);
}

#[test]
fn update_layout_saved_only() {
    let mut store = active_store();
    let other = store.create_layout("Other");
    store.update_layout(&other.id, &LayoutUpdate::rename("Other 2")).unwrap();
    assert_eq!(store.layout(&other.id).unwrap().name, "Other 2");
    assert_eq!(current(&store).name, "My Layout");
    assert_eq!(current(&store).version, 1);
}

#[test]
fn update_layout_replaces_panels_and_grid() {
    let mut store = active_store();
    let panels = vec![
        Panel::new("panel-a".into(), PanelConfig::default_for(PanelType::Trending), None)
            .with_geometry(Position::new(1, 0), Size::new(200, 200)),
        Panel::new("panel-b".into(), PanelConfig::default_for(PanelType::Custom), Some("Notes".into())),
    ];
    let grid = GridConfig { columns: 4, rows: 3, gap: 8, cell_size: 120 };
    let update = LayoutUpdate { panels: Some(panels.clone()), grid_config: Some(grid), ..LayoutUpdate::default() };

    let updated = store.update_layout("layout-1", &update).unwrap();
    assert_eq!(updated.panels, panels);
    assert_eq!(updated.grid_config, grid);
    assert_eq!(updated.version, 2);
    assert_eq!(store.layout("layout-1").unwrap().grid_config, grid);
    assert!(!store.is_dirty());

    let mut reloaded = test_store_with(store.storage().clone());
    reloaded.rehydrate().unwrap();
    assert_eq!(reloaded.layouts(), store.layouts());
    assert_eq!(reloaded.current_layout(), store.current_layout());
}

#[test]
fn update_layout_rejects_empty_panel_size() {
    let mut store = active_store();
    let before = stored_state(&store);
    let flat = Panel::new("panel-a".into(), PanelConfig::default_for(PanelType::Search), None)
        .with_geometry(Position::default(), Size::new(0, 0));
    let update = LayoutUpdate { panels: Some(vec![flat]), ..LayoutUpdate::default() };

    let err = store.update_layout("layout-1", &update).unwrap_err();
    assert!(matches!(err, StoreError::InvalidPanel(PanelError::EmptySize { width: 0, height: 0 })));
    assert_eq!(err.error_code(), "E_INVALID_SIZE");
    assert!(current(&store).panels.is_empty());
    assert_eq!(current(&store).version, 1);
    assert_eq!(store.layout("layout-1").unwrap().version, 1);
    assert_eq!(stored_state(&store), before);

    let mut reloaded = test_store_with(store.storage().clone());
    reloaded.rehydrate().unwrap();
    assert_eq!(current(&reloaded).id, "layout-1");
}

#[test]
fn update_layout_unknown_id() {
    let mut store = active_store();
    let err = store.update_layout("missing", &LayoutUpdate::rename("x")).unwrap_err();
    assert!(matches!(err, StoreError::LayoutNotFound(_)));
}

// =============================================================
// delete_layout
// =============================================================

#[test]
fn delete_current_layout_clears_current() {
    let mut store = active_store();
    let id = current(&store).id.clone();
    store.delete_layout(&id).unwrap();
    assert!(store.current_layout().is_none());
    assert!(store.layout(&id).is_none());
    assert!(matches!(store.add_panel(PanelType::Search, None), Err(StoreError::NoActiveLayout)));
}

#[test]
fn delete_other_layout_keeps_current() {
    let mut store = active_store();
    let other = store.create_layout("Other");
    store.delete_layout(&other.id).unwrap();
    assert_eq!(current(&store).id, "layout-1");
    assert_eq!(store.layouts().len(), 1);
}

#[test]
fn delete_unknown_layout_changes_nothing() {
    let mut store = active_store();
    let before: Vec<Layout> = store.layouts().to_vec();
    let err = store.delete_layout("missing").unwrap_err();
    assert!(matches!(err, StoreError::LayoutNotFound(_)));
    assert_eq!(store.layouts(), before.as_slice());
    assert!(store.current_layout().is_some());
}

// =============================================================
// create_default_layout / reset_to_default
// =============================================================

#[test]
fn create_default_layout_shape() {
    let mut store = test_store();
    let layout = store.create_default_layout();
    assert_eq!(layout.id, "default-layout");
    assert!(layout.is_default);
    assert_eq!(layout.version, 1);
    assert_eq!(layout.panels.len(), 4);
    let kinds: Vec<PanelType> = layout.panels.iter().map(Panel::panel_type).collect();
    assert_eq!(
        kinds,
        vec![PanelType::VideoFeed, PanelType::Search, PanelType::Recommendations, PanelType::WatchLater]
    );
    assert_eq!(layout.grid_config.columns, 3);
    assert_eq!(layout.grid_config.rows, 2);
    assert_eq!(layout.grid_config.gap, 16);
    assert_eq!(layout.grid_config.cell_size, 200);
    assert_eq!(current(&store), &layout);
}

#[test]
fn create_default_layout_pins_first_and_replaces_prior() {
    let mut store = test_store();
    store.create_layout("Mine");
    store.create_default_layout();
    store.add_panel(PanelType::Custom, None).unwrap();
    store.create_default_layout();

    let ids: Vec<&str> = store.layouts().iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["default-layout", "layout-1"]);
    assert_eq!(store.layouts().iter().filter(|l| l.is_default).count(), 1);
    assert_eq!(current(&store).version, 1);
    assert_eq!(current(&store).panels.len(), 4);
}

#[test]
fn reset_to_default_restores_canonical_layout() {
    let mut store = active_store();
    store.reset_to_default();
    assert_eq!(current(&store).id, "default-layout");
    assert_eq!(store.layouts()[0].id, "default-layout");
    assert_eq!(store.layouts().len(), 2);
}

// =============================================================
// Rehydration
// =============================================================

#[test]
fn rehydrate_empty_storage_creates_default() {
    let mut store = test_store();
    store.rehydrate().unwrap();
    assert_eq!(current(&store).id, "default-layout");
    assert_eq!(store.layouts().len(), 1);
    assert_eq!(stored_state(&store)["state"]["currentLayout"]["id"], json!("default-layout"));
}

#[test]
fn rehydrate_roundtrip_preserves_state() {
    let mut first = active_store();
    first.add_panel(PanelType::Search, Some(json!({"resultsLimit": 5}))).unwrap();
    first.create_layout("Second");
    let storage = first.storage().clone();

    let mut second = test_store_with(storage);
    second.rehydrate().unwrap();
    assert_eq!(second.layouts(), first.layouts());
    assert_eq!(second.current_layout(), first.current_layout());
}

#[test]
fn rehydrate_without_current_creates_default_in_front() {
    let mut first = test_store();
    first.create_layout("Only");
    let storage = first.storage().clone();

    let mut second = test_store_with(storage);
    second.rehydrate().unwrap();
    let ids: Vec<&str> = second.layouts().iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["default-layout", "layout-1"]);
    assert_eq!(current(&second).id, "default-layout");
}

#[test]
fn rehydrate_with_current_but_no_layouts_creates_default() {
    let now = OffsetDateTime::from_unix_timestamp(T0).unwrap();
    let orphan = Layout::new("orphan".into(), "current-user", "Orphan", now);
    let mut storage = MemoryStorage::new();
    persistence::save_state(&mut storage, "newtube-layout-storage", &[], Some(&orphan)).unwrap();

    let mut store = test_store_with(storage);
    store.rehydrate().unwrap();
    assert_eq!(current(&store).id, "default-layout");
    let ids: Vec<&str> = store.layouts().iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["default-layout"]);

    let state = stored_state(&store);
    assert_eq!(state["state"]["currentLayout"]["id"], json!("default-layout"));
    assert_eq!(state["state"]["layouts"].as_array().unwrap().len(), 1);
}

#[test]
fn rehydrate_other_schema_version_falls_back_to_default() {
    let mut first = active_store();
    first.create_layout("Second");
    let mut envelope = stored_state(&first);
    envelope["version"] = json!(7);
    let mut storage = MemoryStorage::new();
    storage.set_item("newtube-layout-storage", &envelope.to_string()).unwrap();

    let mut store = test_store_with(storage);
    store.rehydrate().unwrap();
    assert_eq!(current(&store).id, "default-layout");
    assert_eq!(store.layouts().len(), 1);

    let state = stored_state(&store);
    assert_eq!(state["version"], json!(0));
    assert_eq!(state["state"]["layouts"][0]["id"], json!("default-layout"));
}

#[test]
fn rehydrate_corrupt_record_errors_and_keeps_state() {
    let mut storage = MemoryStorage::new();
    storage.set_item("newtube-layout-storage", "][").unwrap();
    let mut store = test_store_with(storage);
    let err = store.rehydrate().unwrap_err();
    assert_eq!(err.error_code(), "E_STORAGE_CORRUPT");
    assert!(store.current_layout().is_none());
}

#[test]
fn rehydrate_or_reset_replaces_corrupt_record() {
    let mut storage = MemoryStorage::new();
    storage.set_item("newtube-layout-storage", "][").unwrap();
    let mut store = test_store_with(storage);
    store.rehydrate_or_reset().unwrap();
    assert_eq!(current(&store).id, "default-layout");
    assert_eq!(stored_state(&store)["version"], json!(0));
}

// =============================================================
// Persistence failures
// =============================================================

#[test]
fn failed_write_marks_dirty_and_keeps_mutation() {
    let storage = FlakyStorage::default();
    let failing = Rc::clone(&storage.failing);
    let mut store = test_store_with(storage);
    store.create_default_layout();

    failing.set(true);
    let panel = store.add_panel(PanelType::Search, None).unwrap();
    assert!(store.is_dirty());
    assert!(current(&store).panel(&panel.id).is_some());

    let err = store.flush().unwrap_err();
    assert!(err.retryable());
    assert!(store.is_dirty());

    failing.set(false);
    store.flush().unwrap();
    assert!(!store.is_dirty());

    let mut reloaded = test_store_with(store.storage().clone());
    reloaded.rehydrate().unwrap();
    assert!(current(&reloaded).panel(&panel.id).is_some());
}

#[test]
fn quota_exceeded_is_reported_through_flush() {
    let mut store = test_store_with(MemoryStorage::with_quota(64));
    store.create_default_layout();
    assert!(store.is_dirty());
    let err = store.flush().unwrap_err();
    assert_eq!(err.error_code(), "E_STORAGE_QUOTA");
    assert_eq!(current(&store).id, "default-layout");
}

#[test]
fn fixed_clock_stamps_created_layouts() {
    let now = OffsetDateTime::from_unix_timestamp(T0).unwrap();
    let mut store = LayoutStore::new(MemoryStorage::new(), StoreConfig::default())
        .with_ids(SequentialIds::new())
        .with_clock(FixedClock(now));
    let layout = store.create_layout("Pinned");
    assert_eq!(layout.created_at, now);
    assert_eq!(layout.updated_at, now);
}
