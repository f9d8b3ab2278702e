//! Sidebar width and per-workspace visibility, persisted through a
//! [`LayoutStore`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;

use crate::config::ShellConfig;
use crate::store::{LayoutStore, StoreChange, SubscriptionId};

/// Allowed sidebar widths. The upper bound shrinks with the viewport but
/// never below `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WidthBounds {
    pub min: u32,
    pub max: u32,
    pub rail: u32,
}

impl WidthBounds {
    pub fn from_config(config: &ShellConfig) -> Self {
        Self {
            min: config.sidebar_min_width,
            max: config.sidebar_max_width,
            rail: config.rail_width,
        }
    }

    pub fn upper_for_viewport(&self, viewport_width: f64) -> f64 {
        (viewport_width - f64::from(self.rail))
            .min(f64::from(self.max))
            .max(f64::from(self.min))
    }

    pub fn clamp(&self, raw: f64, viewport_width: f64) -> u32 {
        let min = f64::from(self.min);
        if !raw.is_finite() {
            return self.min;
        }
        raw.max(min)
            .min(self.upper_for_viewport(viewport_width))
            .round() as u32
    }

    /// Clamp without a viewport, used for stored values.
    pub fn clamp_stored(&self, raw: f64) -> u32 {
        if !raw.is_finite() {
            return self.min;
        }
        raw.max(f64::from(self.min))
            .min(f64::from(self.max))
            .round() as u32
    }

    pub fn width_for_pointer(&self, pointer_x: f64, viewport_width: f64) -> u32 {
        self.clamp(pointer_x - f64::from(self.rail), viewport_width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResizeState {
    #[default]
    Idle,
    Resizing { start_width: u32, live_width: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeEvent {
    PointerDown,
    PointerMove { pointer_x: f64, viewport_width: f64 },
    PointerUp,
    /// Listener teardown while a drag is in flight.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeEffect {
    ApplyLive(u32),
    Persist(u32),
    Restore(u32),
}

impl ResizeState {
    pub fn is_resizing(&self) -> bool {
        matches!(self, ResizeState::Resizing { .. })
    }

    pub fn transition(
        self,
        event: ResizeEvent,
        current_width: u32,
        bounds: &WidthBounds,
    ) -> (ResizeState, Option<ResizeEffect>) {
        match (self, event) {
            (ResizeState::Idle, ResizeEvent::PointerDown) => (
                ResizeState::Resizing {
                    start_width: current_width,
                    live_width: current_width,
                },
                None,
            ),
            (
                ResizeState::Resizing { start_width, .. },
                ResizeEvent::PointerMove {
                    pointer_x,
                    viewport_width,
                },
            ) => {
                let live_width = bounds.width_for_pointer(pointer_x, viewport_width);
                (
                    ResizeState::Resizing {
                        start_width,
                        live_width,
                    },
                    Some(ResizeEffect::ApplyLive(live_width)),
                )
            }
            (ResizeState::Resizing { live_width, .. }, ResizeEvent::PointerUp) => {
                (ResizeState::Idle, Some(ResizeEffect::Persist(live_width)))
            }
            (ResizeState::Resizing { start_width, .. }, ResizeEvent::Abort) => {
                (ResizeState::Idle, Some(ResizeEffect::Restore(start_width)))
            }
            (state, _) => (state, None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    prefix: String,
}

impl StorageKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn open(&self, workspace_id: &str) -> String {
        format!("{}.open.{workspace_id}", self.prefix)
    }

    pub fn width(&self) -> String {
        format!("{}.width", self.prefix)
    }

    pub fn last_workspace(&self) -> String {
        format!("{}.lastWorkspace", self.prefix)
    }

    pub fn workspace_for_open_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.prefix.as_str())?
            .strip_prefix(".open.")
            .filter(|id| !id.is_empty())
    }

    pub fn owns(&self, key: &str) -> bool {
        key.strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    }
}

#[derive(Debug, Clone)]
struct LayoutRules {
    keys: StorageKeys,
    bounds: WidthBounds,
    default_width: u32,
}

impl LayoutRules {
    fn parse_width(&self, raw: &str) -> u32 {
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => self.bounds.clamp_stored(value),
            _ => {
                tracing::debug!(raw, "ignoring unparsable sidebar width");
                self.default_width
            }
        }
    }
}

fn parse_visibility(raw: &str) -> bool {
    match raw.trim() {
        "true" => true,
        "false" => false,
        other => {
            tracing::debug!(raw = other, "ignoring unparsable sidebar visibility");
            true
        }
    }
}

#[derive(Debug, Default)]
struct LayoutCache {
    open: HashMap<String, bool>,
    width: u32,
    last_workspace: Option<String>,
}

impl LayoutCache {
    fn apply(&mut self, rules: &LayoutRules, change: &StoreChange) {
        let (key, value) = match change {
            StoreChange::Key { key, value } => (key, value.as_deref()),
            StoreChange::Cleared => {
                *self = LayoutCache {
                    width: rules.default_width,
                    ..LayoutCache::default()
                };
                return;
            }
        };
        if *key == rules.keys.width() {
            self.width = value.map_or(rules.default_width, |raw| rules.parse_width(raw));
        } else if *key == rules.keys.last_workspace() {
            self.last_workspace = value
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string);
        } else if let Some(workspace_id) = rules.keys.workspace_for_open_key(key) {
            match value {
                Some(raw) => {
                    self.open
                        .insert(workspace_id.to_string(), parse_visibility(raw));
                }
                None => {
                    self.open.remove(workspace_id);
                }
            }
        }
    }
}

/// Persisted sidebar layout: one global width and a visibility flag per
/// workspace. Store failures are logged and never surfaced; reads fall back to
/// defaults.
pub struct SidebarLayout<S: LayoutStore> {
    store: S,
    rules: LayoutRules,
    cache: Rc<RefCell<LayoutCache>>,
    resize: ResizeState,
    subscription: Option<SubscriptionId>,
}

impl<S: LayoutStore> SidebarLayout<S> {
    pub fn load(store: S, config: &ShellConfig) -> Self {
        let rules = LayoutRules {
            keys: StorageKeys::new(config.storage_prefix.clone()),
            bounds: WidthBounds::from_config(config),
            default_width: config.sidebar_default_width,
        };

        let width = match store.get(&rules.keys.width()) {
            Ok(Some(raw)) => rules.parse_width(&raw),
            Ok(None) => rules.default_width,
            Err(error) => {
                tracing::debug!(%error, "failed to read sidebar width");
                rules.default_width
            }
        };
        let last_workspace = match store.get(&rules.keys.last_workspace()) {
            Ok(value) => value.filter(|id| !id.trim().is_empty()),
            Err(error) => {
                tracing::debug!(%error, "failed to read last workspace");
                None
            }
        };

        let cache = Rc::new(RefCell::new(LayoutCache {
            open: HashMap::new(),
            width,
            last_workspace,
        }));
        let subscription = {
            let cache = Rc::clone(&cache);
            let rules = rules.clone();
            store.subscribe(Box::new(move |change| {
                if let Ok(mut cache) = cache.try_borrow_mut() {
                    cache.apply(&rules, change);
                }
            }))
        };

        Self {
            store,
            rules,
            cache,
            resize: ResizeState::Idle,
            subscription: Some(subscription),
        }
    }

    /// Defaults to `true` for workspaces never toggled.
    pub fn visibility(&self, workspace_id: &str) -> bool {
        if let Some(open) = self.cache.borrow().open.get(workspace_id) {
            return *open;
        }
        let open = match self.store.get(&self.rules.keys.open(workspace_id)) {
            Ok(Some(raw)) => parse_visibility(&raw),
            Ok(None) => true,
            Err(error) => {
                tracing::debug!(workspace_id, %error, "failed to read sidebar visibility");
                true
            }
        };
        self.cache
            .borrow_mut()
            .open
            .insert(workspace_id.to_string(), open);
        open
    }

    pub fn set_visibility(&mut self, workspace_id: &str, open: bool) {
        self.cache
            .borrow_mut()
            .open
            .insert(workspace_id.to_string(), open);
        self.write(
            &self.rules.keys.open(workspace_id),
            if open { "true" } else { "false" },
        );
    }

    /// Flips and persists only `workspace_id`'s flag; returns the new value.
    pub fn toggle(&mut self, workspace_id: &str) -> bool {
        let next = !self.visibility(workspace_id);
        self.set_visibility(workspace_id, next);
        next
    }

    /// Width as currently rendered, live during a drag.
    pub fn width(&self) -> u32 {
        match self.resize {
            ResizeState::Resizing { live_width, .. } => live_width,
            ResizeState::Idle => self.cache.borrow().width,
        }
    }

    pub fn persisted_width(&self) -> u32 {
        self.cache.borrow().width
    }

    pub fn effective_width(&self, viewport_width: f64) -> u32 {
        self.rules
            .bounds
            .clamp(f64::from(self.width()), viewport_width)
    }

    /// Persists an explicit width, clamped to the configured bounds.
    pub fn set_width(&mut self, width: u32) -> u32 {
        let width = self.rules.bounds.clamp_stored(f64::from(width));
        self.persist_width(width);
        width
    }

    pub fn resize_state(&self) -> ResizeState {
        self.resize
    }

    pub fn is_resizing(&self) -> bool {
        self.resize.is_resizing()
    }

    pub fn handle_resize(&mut self, event: ResizeEvent) -> Option<ResizeEffect> {
        let current = self.width();
        let (next, effect) = self.resize.transition(event, current, &self.rules.bounds);
        self.resize = next;
        match effect {
            Some(ResizeEffect::Persist(width)) => {
                tracing::debug!(width, "sidebar resize committed");
                self.persist_width(width);
            }
            Some(ResizeEffect::Restore(width)) => {
                tracing::debug!(width, "sidebar resize aborted");
            }
            Some(ResizeEffect::ApplyLive(_)) | None => {}
        }
        effect
    }

    pub fn last_workspace(&self) -> Option<String> {
        self.cache.borrow().last_workspace.clone()
    }

    pub fn remember_workspace(&mut self, workspace_id: &str) {
        if self.cache.borrow().last_workspace.as_deref() == Some(workspace_id) {
            return;
        }
        self.cache.borrow_mut().last_workspace = Some(workspace_id.to_string());
        self.write(&self.rules.keys.last_workspace(), workspace_id);
    }

    /// Removes every key under the storage prefix and returns to defaults.
    pub fn reset(&mut self) {
        match self.store.keys() {
            Ok(keys) => {
                for key in keys.iter().filter(|key| self.rules.keys.owns(key)) {
                    if let Err(error) = self.store.remove(key) {
                        tracing::warn!(key = %key, %error, "failed to remove layout preference");
                    }
                }
            }
            Err(error) => tracing::warn!(%error, "failed to list layout preferences"),
        }
        self.resize = ResizeState::Idle;
        self.cache
            .borrow_mut()
            .apply(&self.rules, &StoreChange::Cleared);
    }

    fn persist_width(&mut self, width: u32) {
        self.cache.borrow_mut().width = width;
        self.write(&self.rules.keys.width(), &width.to_string());
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(error) = self.store.set(key, value) {
            tracing::warn!(key, %error, "failed to persist layout preference");
        }
    }
}

impl<S: LayoutStore> Drop for SidebarLayout<S> {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.store.unsubscribe(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Listeners, MemoryLayoutStore, StoreError, StoreListener};
    use quickcheck::QuickCheck;

    fn layout_with(store: Rc<MemoryLayoutStore>) -> SidebarLayout<Rc<MemoryLayoutStore>> {
        SidebarLayout::load(store, &ShellConfig::default())
    }

    #[test]
    fn drag_toward_800_persists_max_width_once() {
        let store = Rc::new(MemoryLayoutStore::new());
        let writes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&writes);
        store.subscribe(Box::new(move |change| sink.borrow_mut().push(change.clone())));

        let mut layout = layout_with(Rc::clone(&store));
        assert_eq!(layout.width(), 256);
        assert_eq!(layout.handle_resize(ResizeEvent::PointerDown), None);
        for pointer_x in [400.0, 600.0, 864.0] {
            layout.handle_resize(ResizeEvent::PointerMove {
                pointer_x,
                viewport_width: 1440.0,
            });
        }
        assert_eq!(layout.width(), 480);
        assert!(writes.borrow().is_empty());

        assert_eq!(
            layout.handle_resize(ResizeEvent::PointerUp),
            Some(ResizeEffect::Persist(480))
        );
        assert_eq!(
            store.get("sidebar.width").expect("get"),
            Some("480".to_string())
        );
        assert_eq!(writes.borrow().len(), 1);
    }

    #[test]
    fn live_width_respects_minimum_and_viewport() {
        let bounds = WidthBounds::from_config(&ShellConfig::default());
        assert_eq!(bounds.width_for_pointer(100.0, 1440.0), 220);
        assert_eq!(bounds.width_for_pointer(400.0, 1440.0), 336);
        assert_eq!(bounds.width_for_pointer(900.0, 400.0), 336);
        assert_eq!(bounds.width_for_pointer(900.0, 200.0), 220);
        assert_eq!(bounds.width_for_pointer(f64::NAN, 1440.0), 220);
    }

    #[test]
    fn abort_restores_start_width_without_persisting() {
        let store = Rc::new(MemoryLayoutStore::new());
        let mut layout = layout_with(Rc::clone(&store));
        layout.handle_resize(ResizeEvent::PointerDown);
        layout.handle_resize(ResizeEvent::PointerMove {
            pointer_x: 500.0,
            viewport_width: 1440.0,
        });
        assert_eq!(layout.width(), 436);

        assert_eq!(
            layout.handle_resize(ResizeEvent::Abort),
            Some(ResizeEffect::Restore(256))
        );
        assert_eq!(layout.width(), 256);
        assert_eq!(store.get("sidebar.width").expect("get"), None);
    }

    #[test]
    fn events_outside_a_drag_are_ignored() {
        let bounds = WidthBounds::from_config(&ShellConfig::default());
        let idle = ResizeState::Idle;
        let move_event = ResizeEvent::PointerMove {
            pointer_x: 300.0,
            viewport_width: 1440.0,
        };
        assert_eq!(idle.transition(move_event, 256, &bounds), (idle, None));
        assert_eq!(
            idle.transition(ResizeEvent::PointerUp, 256, &bounds),
            (idle, None)
        );
        let resizing = ResizeState::Resizing {
            start_width: 256,
            live_width: 300,
        };
        assert_eq!(
            resizing.transition(ResizeEvent::PointerDown, 300, &bounds),
            (resizing, None)
        );
    }

    #[test]
    fn toggling_one_workspace_leaves_others_alone() {
        let store = Rc::new(MemoryLayoutStore::new());
        let mut layout = layout_with(Rc::clone(&store));
        assert!(layout.visibility("inbox"));
        assert!(layout.visibility("customers"));

        assert!(!layout.toggle("inbox"));
        assert!(!layout.visibility("inbox"));
        assert!(layout.visibility("customers"));
        assert_eq!(store.keys().expect("keys"), vec!["sidebar.open.inbox"]);
    }

    #[test]
    fn stored_values_are_parsed_leniently() {
        let store = Rc::new(MemoryLayoutStore::with_entries([
            ("sidebar.width", "9000"),
            ("sidebar.open.inbox", "false"),
            ("sidebar.open.actions", "maybe"),
            ("sidebar.lastWorkspace", "customers"),
        ]));
        let layout = layout_with(store);
        assert_eq!(layout.width(), 480);
        assert!(!layout.visibility("inbox"));
        assert!(layout.visibility("actions"));
        assert_eq!(layout.last_workspace().as_deref(), Some("customers"));

        let garbage = Rc::new(MemoryLayoutStore::with_entries([("sidebar.width", "wide")]));
        assert_eq!(layout_with(garbage).width(), 256);
    }

    #[test]
    fn external_changes_refresh_cached_values() {
        let store = Rc::new(MemoryLayoutStore::new());
        let layout = layout_with(Rc::clone(&store));
        assert!(layout.visibility("inbox"));

        store.set("sidebar.open.inbox", "false").expect("set");
        store.set("sidebar.width", "300").expect("set");
        assert!(!layout.visibility("inbox"));
        assert_eq!(layout.width(), 300);

        store.remove("sidebar.width").expect("remove");
        assert_eq!(layout.width(), 256);
    }

    #[test]
    fn cleared_store_resets_cached_values() {
        struct SharedStore {
            inner: MemoryLayoutStore,
            listeners: Listeners,
        }

        impl LayoutStore for SharedStore {
            fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
                self.inner.get(key)
            }
            fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
                self.inner.set(key, value)
            }
            fn remove(&self, key: &str) -> Result<(), StoreError> {
                self.inner.remove(key)
            }
            fn keys(&self) -> Result<Vec<String>, StoreError> {
                self.inner.keys()
            }
            fn subscribe(&self, listener: StoreListener) -> SubscriptionId {
                self.listeners.add(listener)
            }
            fn unsubscribe(&self, id: SubscriptionId) -> bool {
                self.listeners.remove(id)
            }
        }

        let store = Rc::new(SharedStore {
            inner: MemoryLayoutStore::with_entries([
                ("sidebar.width", "320"),
                ("sidebar.open.inbox", "false"),
                ("sidebar.lastWorkspace", "customers"),
            ]),
            listeners: Listeners::default(),
        });
        let layout = SidebarLayout::load(Rc::clone(&store), &ShellConfig::default());
        store
            .listeners
            .notify(&StoreChange::set("sidebar.open.actions", "false"));
        assert_eq!(layout.width(), 320);
        assert!(!layout.visibility("actions"));

        for key in store.inner.keys().expect("keys") {
            store.inner.remove(&key).expect("remove");
        }
        store.listeners.notify(&StoreChange::Cleared);
        assert_eq!(layout.width(), 256);
        assert!(layout.visibility("inbox"));
        assert!(layout.visibility("actions"));
        assert_eq!(layout.last_workspace(), None);
    }

    #[test]
    fn dropping_layout_unsubscribes_from_store() {
        #[derive(Default)]
        struct CountingStore {
            inner: MemoryLayoutStore,
            unsubscribed: std::cell::Cell<usize>,
        }

        impl LayoutStore for CountingStore {
            fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
                self.inner.get(key)
            }
            fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
                self.inner.set(key, value)
            }
            fn remove(&self, key: &str) -> Result<(), StoreError> {
                self.inner.remove(key)
            }
            fn keys(&self) -> Result<Vec<String>, StoreError> {
                self.inner.keys()
            }
            fn subscribe(&self, listener: StoreListener) -> SubscriptionId {
                self.inner.subscribe(listener)
            }
            fn unsubscribe(&self, id: SubscriptionId) -> bool {
                self.unsubscribed.set(self.unsubscribed.get() + 1);
                self.inner.unsubscribe(id)
            }
        }

        let store = Rc::new(CountingStore::default());
        drop(SidebarLayout::load(Rc::clone(&store), &ShellConfig::default()));
        assert_eq!(store.unsubscribed.get(), 1);
    }

    #[test]
    fn failing_store_falls_back_to_defaults() {
        #[derive(Default)]
        struct BrokenStore {
            listeners: Listeners,
        }

        impl LayoutStore for BrokenStore {
            fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
                Err(StoreError::Unavailable("storage disabled".to_string()))
            }
            fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
                Err(StoreError::Unavailable("storage disabled".to_string()))
            }
            fn remove(&self, _key: &str) -> Result<(), StoreError> {
                Err(StoreError::Unavailable("storage disabled".to_string()))
            }
            fn keys(&self) -> Result<Vec<String>, StoreError> {
                Err(StoreError::Unavailable("storage disabled".to_string()))
            }
            fn subscribe(&self, listener: StoreListener) -> SubscriptionId {
                self.listeners.add(listener)
            }
            fn unsubscribe(&self, id: SubscriptionId) -> bool {
                self.listeners.remove(id)
            }
        }

        let mut layout = SidebarLayout::load(BrokenStore::default(), &ShellConfig::default());
        assert_eq!(layout.width(), 256);
        assert!(layout.visibility("inbox"));
        assert!(!layout.toggle("inbox"));
        assert!(!layout.visibility("inbox"));
        assert_eq!(layout.set_width(999), 480);
        layout.reset();
        assert_eq!(layout.width(), 256);
    }

    #[test]
    fn reset_removes_only_prefixed_keys() {
        let store = Rc::new(MemoryLayoutStore::with_entries([
            ("sidebar.width", "300"),
            ("sidebar.open.inbox", "false"),
            ("sidebarish", "keep"),
            ("theme", "dark"),
        ]));
        let mut layout = layout_with(Rc::clone(&store));
        layout.reset();
        assert_eq!(store.keys().expect("keys"), vec!["sidebarish", "theme"]);
        assert_eq!(layout.width(), 256);
        assert!(layout.visibility("inbox"));
    }

    #[test]
    fn storage_keys_round_trip_workspace_ids() {
        let keys = StorageKeys::new("desk");
        assert_eq!(keys.open("inbox"), "desk.open.inbox");
        assert_eq!(keys.workspace_for_open_key("desk.open.inbox"), Some("inbox"));
        assert_eq!(keys.workspace_for_open_key("desk.open."), None);
        assert_eq!(keys.workspace_for_open_key("sidebar.open.inbox"), None);
        assert!(keys.owns("desk.width"));
        assert!(!keys.owns("desktop.width"));
    }

    #[test]
    fn pointer_widths_always_land_within_bounds() {
        fn property(pointer_x: f64, viewport_width: f64) -> bool {
            let bounds = WidthBounds::from_config(&ShellConfig::default());
            let width = bounds.width_for_pointer(pointer_x, viewport_width);
            let available = if viewport_width.is_finite() {
                viewport_width - f64::from(bounds.rail)
            } else {
                f64::INFINITY
            };
            let upper = available.min(f64::from(bounds.max)).max(f64::from(bounds.min));
            width >= bounds.min && f64::from(width) <= upper.round()
        }
        QuickCheck::new()
            .tests(500)
            .quickcheck(property as fn(f64, f64) -> bool);
    }
}
