//! Shell orchestration: one owner for routing, filter panels, sidebar layout
//! and responsive presentation, driven by host events.
//!
//! Hosts (the web shell, the CLI, tests) feed events in and render
//! [`ShellSnapshot`]s out. URL changes produced here (filter apply/clear) are
//! returned as [`Location`]s for the host to push into its history.

use serde::Serialize;

use crate::config::ShellConfig;
use crate::filter::{self, CommittedFilters, FieldValue, FilterDomain, FilterPatch};
use crate::filter_session::{FilterStateManager, SyncOutcome};
use crate::layout::{ResizeEffect, ResizeEvent, ResizeState, SidebarLayout};
use crate::query::{Location, QueryParams};
use crate::registry::{Accent, SidebarItem, WorkspaceRegistry};
use crate::resolver::{ResolvedView, ViewResolver};
use crate::responsive::{
    ModeTransition, OverlayCloseReason, OverlayTrigger, ResponsiveController, ResponsiveState,
    SidebarPresentation,
};
use crate::store::LayoutStore;

/// Named custom events the shell listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellEvent {
    ToggleSidebar,
    OpenCommandPalette,
    CloseCommandPalette,
}

impl ShellEvent {
    pub const ALL: [ShellEvent; 3] = [
        ShellEvent::ToggleSidebar,
        ShellEvent::OpenCommandPalette,
        ShellEvent::CloseCommandPalette,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShellEvent::ToggleSidebar => "toggle-sidebar",
            ShellEvent::OpenCommandPalette => "open-command-palette",
            ShellEvent::CloseCommandPalette => "close-command-palette",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteChange {
    pub previous_workspace: Option<&'static str>,
    pub workspace: Option<&'static str>,
    pub overlay_closed: bool,
}

impl RouteChange {
    pub fn workspace_changed(&self) -> bool {
        self.previous_workspace != self.workspace
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceSnapshot {
    pub id: &'static str,
    pub label: &'static str,
    pub route_prefix: &'static str,
    pub accent: Accent,
    pub items: &'static [SidebarItem],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RailEntry {
    pub id: &'static str,
    pub label: &'static str,
    pub href: &'static str,
    pub accent: Accent,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterFieldSnapshot {
    pub key: &'static str,
    pub value: FieldValue,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterPanelSnapshot {
    pub domain: FilterDomain,
    pub dirty: bool,
    pub fields: Vec<FilterFieldSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarSnapshot {
    pub presentation: SidebarPresentation,
    /// Persisted per-workspace flag, independent of the mobile drawer.
    pub persisted_open: bool,
    pub width: u32,
    pub resize: ResizeState,
}

/// Everything a renderer needs, serializable for the JS bridge and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShellSnapshot {
    pub href: String,
    pub workspace: Option<WorkspaceSnapshot>,
    pub active_item: Option<&'static str>,
    pub filter_domain: Option<FilterDomain>,
    pub active_filter_count: usize,
    pub filter_panel: Option<FilterPanelSnapshot>,
    pub sidebar: SidebarSnapshot,
    pub viewport: ResponsiveState,
    pub command_palette_open: bool,
    pub rail: Vec<RailEntry>,
}

pub struct ShellState<S: LayoutStore> {
    config: ShellConfig,
    resolver: ViewResolver,
    filters: FilterStateManager,
    layout: SidebarLayout<S>,
    responsive: ResponsiveController,
    location: Location,
    view: ResolvedView,
    viewport_width: f64,
    command_palette_open: bool,
}

impl<S: LayoutStore> ShellState<S> {
    pub fn mount(store: S, config: ShellConfig, viewport_width: f64, location: Location) -> Self {
        Self::mount_with_registry(
            WorkspaceRegistry::builtin(),
            store,
            config,
            viewport_width,
            location,
        )
    }

    pub fn mount_with_registry(
        registry: WorkspaceRegistry,
        store: S,
        config: ShellConfig,
        viewport_width: f64,
        location: Location,
    ) -> Self {
        let resolver = ViewResolver::new(registry);
        let view = resolver.resolve_location(&location);
        let mut layout = SidebarLayout::load(store, &config);
        if let Some(workspace_id) = view.workspace_id() {
            layout.remember_workspace(workspace_id);
        }
        let responsive = ResponsiveController::new(config.mobile_breakpoint, viewport_width);
        tracing::debug!(
            href = %location,
            workspace = view.workspace_id().unwrap_or("none"),
            mobile = responsive.is_mobile(),
            "shell mounted"
        );
        Self {
            config,
            resolver,
            filters: FilterStateManager::new(),
            layout,
            responsive,
            location,
            view,
            viewport_width,
            command_palette_open: false,
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn view(&self) -> &ResolvedView {
        &self.view
    }

    pub fn layout(&self) -> &SidebarLayout<S> {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut SidebarLayout<S> {
        &mut self.layout
    }

    pub fn responsive(&self) -> &ResponsiveController {
        &self.responsive
    }

    pub fn filters(&self) -> &FilterStateManager {
        &self.filters
    }

    pub fn is_command_palette_open(&self) -> bool {
        self.command_palette_open
    }

    /// Where to send the user when the current path matches no workspace:
    /// the last active workspace, else the first registered one.
    pub fn landing_location(&self) -> Option<Location> {
        if self.view.workspace.is_some() {
            return None;
        }
        let registry = self.resolver.registry();
        let remembered = self
            .layout
            .last_workspace()
            .and_then(|id| registry.get(&id).copied());
        remembered
            .or_else(|| registry.descriptors().first().copied())
            .map(|workspace| Location::new(workspace.route_prefix, QueryParams::new()))
    }

    pub fn navigate(&mut self, location: Location) -> RouteChange {
        let previous_workspace = self.view.workspace_id();
        let overlay_closed = self.responsive.route_changed();
        self.command_palette_open = false;

        self.view = self.resolver.resolve_location(&location);
        self.location = location;
        let workspace = self.view.workspace_id();

        if previous_workspace != workspace {
            tracing::info!(
                from = previous_workspace.unwrap_or("none"),
                to = workspace.unwrap_or("none"),
                "workspace switched"
            );
            if let Some(workspace_id) = workspace {
                self.layout.remember_workspace(workspace_id);
            }
        }

        let active_domain = self.view.filter_domain;
        let open_domains = self.filters.open_domains().collect::<Vec<_>>();
        for domain in open_domains {
            if Some(domain) == active_domain {
                if self.filters.sync_from_url(domain, &self.location.query)
                    == SyncOutcome::KeptDirtyDraft
                {
                    tracing::debug!(domain = %domain, "url changed under dirty filter draft");
                }
            } else {
                self.filters.close_panel(domain);
            }
        }

        RouteChange {
            previous_workspace,
            workspace,
            overlay_closed,
        }
    }

    pub fn viewport_resized(&mut self, viewport_width: f64) -> ModeTransition {
        self.viewport_width = viewport_width;
        let transition = self.responsive.viewport_resized(viewport_width);
        if transition == ModeTransition::EnteredMobile && self.layout.is_resizing() {
            self.layout.handle_resize(ResizeEvent::Abort);
        }
        transition
    }

    pub fn handle_event(&mut self, event: ShellEvent) {
        match event {
            ShellEvent::ToggleSidebar => self.toggle_sidebar(OverlayTrigger::ExternalEvent),
            ShellEvent::OpenCommandPalette => self.command_palette_open = true,
            ShellEvent::CloseCommandPalette => self.command_palette_open = false,
        }
    }

    /// Menu button and `toggle-sidebar`: the overlay on mobile, the persisted
    /// flag of the active workspace on desktop.
    pub fn toggle_sidebar(&mut self, trigger: OverlayTrigger) {
        if self.responsive.is_mobile() {
            self.responsive.toggle_overlay(trigger);
        } else if let Some(workspace_id) = self.view.workspace_id() {
            let open = self.layout.toggle(workspace_id);
            tracing::debug!(workspace_id, open, "sidebar toggled");
        }
    }

    pub fn close_overlay(&mut self, reason: OverlayCloseReason) -> bool {
        self.responsive.close_overlay(reason)
    }

    /// Starts a drag on the resize handle; only the docked, open sidebar
    /// resizes.
    pub fn sidebar_pointer_down(&mut self) -> bool {
        if self.responsive.is_mobile() || !self.sidebar_persisted_open() {
            return false;
        }
        self.layout.handle_resize(ResizeEvent::PointerDown);
        self.layout.is_resizing()
    }

    pub fn sidebar_pointer_move(&mut self, pointer_x: f64) -> Option<u32> {
        match self.layout.handle_resize(ResizeEvent::PointerMove {
            pointer_x,
            viewport_width: self.viewport_width,
        }) {
            Some(ResizeEffect::ApplyLive(width)) => Some(width),
            _ => None,
        }
    }

    /// Returns the width persisted by this release.
    pub fn sidebar_pointer_up(&mut self) -> Option<u32> {
        match self.layout.handle_resize(ResizeEvent::PointerUp) {
            Some(ResizeEffect::Persist(width)) => Some(width),
            _ => None,
        }
    }

    /// Returns the restored width when a drag was in flight.
    pub fn sidebar_pointer_abort(&mut self) -> Option<u32> {
        match self.layout.handle_resize(ResizeEvent::Abort) {
            Some(ResizeEffect::Restore(width)) => Some(width),
            _ => None,
        }
    }

    pub fn open_filter_panel(&mut self) -> Option<FilterDomain> {
        let domain = self.view.filter_domain?;
        self.filters.open_panel(domain, &self.location.query);
        Some(domain)
    }

    pub fn update_filter_draft(&mut self, patch: &FilterPatch) -> bool {
        match self.view.filter_domain {
            Some(domain) => self.filters.update_draft(domain, patch),
            None => false,
        }
    }

    /// Commits the open draft and navigates to the result.
    pub fn apply_filters(&mut self) -> Option<Location> {
        let domain = self.view.filter_domain?;
        let query = self.filters.apply(domain, &self.location.query)?;
        Some(self.navigate_query(query))
    }

    pub fn clear_filters(&mut self) -> Option<Location> {
        let domain = self.view.filter_domain?;
        let query = self.filters.clear(domain, &self.location.query);
        Some(self.navigate_query(query))
    }

    pub fn close_filter_panel(&mut self) -> bool {
        match self.view.filter_domain {
            Some(domain) => self.filters.close_panel(domain),
            None => false,
        }
    }

    /// Throws away unapplied edits and re-reads the panel from the current URL.
    pub fn discard_filter_changes(&mut self) -> bool {
        match self.view.filter_domain {
            Some(domain) => self.filters.discard_changes(domain, &self.location.query),
            None => false,
        }
    }

    pub fn committed_filters(&self) -> Option<CommittedFilters> {
        self.view
            .filter_domain
            .map(|domain| filter::committed_filters(domain, &self.location.query))
    }

    pub fn active_filter_count(&self) -> usize {
        self.committed_filters()
            .map_or(0, |filters| filters.active_count())
    }

    pub fn snapshot(&self) -> ShellSnapshot {
        let workspace_id = self.view.workspace_id();
        let persisted_open = self.sidebar_persisted_open();
        let filter_panel = self
            .view
            .filter_domain
            .and_then(|domain| self.filters.draft(domain))
            .map(|draft| FilterPanelSnapshot {
                domain: draft.domain(),
                dirty: draft.is_dirty(),
                fields: draft
                    .values()
                    .iter()
                    .map(|(field, value)| FilterFieldSnapshot {
                        key: field.key,
                        value: value.clone(),
                        is_default: field.is_default(value),
                    })
                    .collect(),
            });

        ShellSnapshot {
            href: self.location.to_href(),
            workspace: self.view.workspace.map(|workspace| WorkspaceSnapshot {
                id: workspace.id,
                label: workspace.label,
                route_prefix: workspace.route_prefix,
                accent: workspace.accent,
                items: workspace.items,
            }),
            active_item: self.view.active_item,
            filter_domain: self.view.filter_domain,
            active_filter_count: self.active_filter_count(),
            filter_panel,
            sidebar: SidebarSnapshot {
                presentation: self.responsive.presentation(persisted_open),
                persisted_open,
                width: self.layout.effective_width(self.viewport_width),
                resize: self.layout.resize_state(),
            },
            viewport: self.responsive.state(),
            command_palette_open: self.command_palette_open,
            rail: self
                .resolver
                .registry()
                .descriptors()
                .iter()
                .map(|descriptor| RailEntry {
                    id: descriptor.id,
                    label: descriptor.label,
                    href: descriptor.route_prefix,
                    accent: descriptor.accent,
                    active: Some(descriptor.id) == workspace_id,
                })
                .collect(),
        }
    }

    fn sidebar_persisted_open(&self) -> bool {
        self.view
            .workspace_id()
            .is_none_or(|workspace_id| self.layout.visibility(workspace_id))
    }

    fn navigate_query(&mut self, query: QueryParams) -> Location {
        let next = Location::new(&self.location.path, query);
        self.navigate(next.clone());
        next
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::store::MemoryLayoutStore;

    fn mount(
        store: &Rc<MemoryLayoutStore>,
        viewport_width: f64,
        href: &str,
    ) -> ShellState<Rc<MemoryLayoutStore>> {
        ShellState::mount(
            Rc::clone(store),
            ShellConfig::default(),
            viewport_width,
            Location::parse(href),
        )
    }

    #[test]
    fn inbox_today_link_highlights_today_with_one_filter() {
        let store = Rc::new(MemoryLayoutStore::new());
        let shell = mount(&store, 1440.0, "/inbox?range=today");
        let snapshot = shell.snapshot();
        assert_eq!(snapshot.active_item, Some("today"));
        assert_eq!(snapshot.active_filter_count, 1);
        assert_eq!(
            store.get("sidebar.lastWorkspace").expect("get"),
            Some("inbox".to_string())
        );
    }

    #[test]
    fn applying_status_open_from_panel_updates_url() {
        let store = Rc::new(MemoryLayoutStore::new());
        let mut shell = mount(&store, 1440.0, "/inbox");
        assert_eq!(shell.open_filter_panel(), Some(FilterDomain::Inbox));
        assert!(shell.update_filter_draft(&FilterPatch::new().set("status", "open")));
        assert!(shell.snapshot().filter_panel.is_some_and(|panel| panel.dirty));

        let next = shell.apply_filters().expect("panel was open");
        assert_eq!(next.to_href(), "/inbox?status=open");
        assert_eq!(shell.location().query.get("range"), None);
        assert_eq!(shell.active_filter_count(), 1);
        assert_eq!(shell.view().active_item, Some("open"));
        assert!(!shell.filters().is_open(FilterDomain::Inbox));
    }

    #[test]
    fn clearing_documents_filters_keeps_tab() {
        let store = Rc::new(MemoryLayoutStore::new());
        let mut shell = mount(&store, 1440.0, "/documents?tab=uploads&range=week&q=lease");
        assert_eq!(shell.active_filter_count(), 2);
        let next = shell.clear_filters().expect("documents has filters");
        assert_eq!(next.to_href(), "/documents?tab=uploads");
        assert_eq!(shell.view().active_item, Some("uploads"));
        assert_eq!(shell.active_filter_count(), 0);
    }

    #[test]
    fn drag_release_persists_clamped_width() {
        let store = Rc::new(MemoryLayoutStore::new());
        let mut shell = mount(&store, 1440.0, "/customers");
        assert!(shell.sidebar_pointer_down());
        assert_eq!(shell.sidebar_pointer_move(500.0), Some(436));
        assert_eq!(shell.sidebar_pointer_move(864.0), Some(480));
        assert_eq!(store.get("sidebar.width").expect("get"), None);
        assert_eq!(shell.sidebar_pointer_up(), Some(480));
        assert_eq!(
            store.get("sidebar.width").expect("get"),
            Some("480".to_string())
        );
        assert_eq!(shell.sidebar_pointer_up(), None);
    }

    #[test]
    fn shrinking_to_mobile_leaves_persisted_visibility_alone() {
        let store = Rc::new(MemoryLayoutStore::with_entries([("sidebar.open.customers", "true")]));
        let mut shell = mount(&store, 900.0, "/customers");
        assert_eq!(
            shell.snapshot().sidebar.presentation,
            SidebarPresentation::Docked { open: true }
        );

        assert_eq!(shell.viewport_resized(320.0), ModeTransition::EnteredMobile);
        let snapshot = shell.snapshot();
        assert_eq!(
            snapshot.sidebar.presentation,
            SidebarPresentation::Drawer { open: false }
        );
        assert!(snapshot.sidebar.persisted_open);

        shell.toggle_sidebar(OverlayTrigger::MenuButton);
        assert_eq!(
            shell.snapshot().sidebar.presentation,
            SidebarPresentation::Drawer { open: true }
        );
        assert_eq!(
            store.get("sidebar.open.customers").expect("get"),
            Some("true".to_string())
        );
    }

    #[test]
    fn route_change_closes_overlay_and_palette() {
        let store = Rc::new(MemoryLayoutStore::new());
        let mut shell = mount(&store, 375.0, "/inbox");
        shell.handle_event(ShellEvent::ToggleSidebar);
        shell.handle_event(ShellEvent::OpenCommandPalette);
        assert!(shell.responsive().overlay_open());

        let change = shell.navigate(Location::parse("/customers"));
        assert!(change.overlay_closed);
        assert!(change.workspace_changed());
        assert!(!shell.responsive().overlay_open());
        assert!(!shell.is_command_palette_open());
        assert_eq!(
            store.get("sidebar.lastWorkspace").expect("get"),
            Some("customers".to_string())
        );
    }

    #[test]
    fn desktop_toggle_only_touches_active_workspace() {
        let store = Rc::new(MemoryLayoutStore::new());
        let mut shell = mount(&store, 1280.0, "/inbox");
        shell.handle_event(ShellEvent::ToggleSidebar);
        assert!(!shell.snapshot().sidebar.persisted_open);

        shell.navigate(Location::parse("/actions"));
        assert!(shell.snapshot().sidebar.persisted_open);
        shell.navigate(Location::parse("/inbox?status=open"));
        assert!(!shell.snapshot().sidebar.persisted_open);
        assert_eq!(store.get("sidebar.open.actions").expect("get"), None);
    }

    #[test]
    fn dirty_draft_survives_url_change_in_same_domain() {
        let store = Rc::new(MemoryLayoutStore::new());
        let mut shell = mount(&store, 1280.0, "/customers");
        shell.open_filter_panel();
        shell.update_filter_draft(&FilterPatch::new().toggle("tag", "vip"));

        shell.navigate(Location::parse("/customers?type=company"));
        let panel = shell.snapshot().filter_panel.expect("panel open");
        assert!(panel.dirty);
        assert_eq!(
            panel.fields[0],
            FilterFieldSnapshot {
                key: "type",
                value: FieldValue::Single("all".to_string()),
                is_default: true,
            }
        );

        shell.navigate(Location::parse("/documents"));
        assert!(!shell.filters().is_open(FilterDomain::Customers));
    }

    #[test]
    fn discarding_dirty_draft_picks_up_url_changed_meanwhile() {
        let store = Rc::new(MemoryLayoutStore::new());
        let mut shell = mount(&store, 1280.0, "/inbox?status=open");
        shell.open_filter_panel();
        shell.update_filter_draft(&FilterPatch::new().set("range", "week"));

        shell.navigate(Location::parse("/inbox?status=closed&range=month"));
        let kept = shell.filters().draft(FilterDomain::Inbox).expect("panel open");
        assert_eq!(kept.values().value("status"), Some("open"));

        assert!(shell.discard_filter_changes());
        let panel = shell.snapshot().filter_panel.expect("panel still open");
        assert!(!panel.dirty);
        let draft = shell.filters().draft(FilterDomain::Inbox).expect("panel open");
        assert_eq!(draft.values().value("status"), Some("closed"));
        assert_eq!(draft.values().value("range"), Some("month"));
    }

    #[test]
    fn discard_without_filter_domain_is_a_no_op() {
        let store = Rc::new(MemoryLayoutStore::new());
        let mut shell = mount(&store, 1280.0, "/settings");
        assert!(!shell.discard_filter_changes());
    }

    #[test]
    fn activity_view_switches_filter_domain() {
        let store = Rc::new(MemoryLayoutStore::new());
        let mut shell = mount(&store, 1280.0, "/inbox?view=activity&id=7");
        assert_eq!(shell.open_filter_panel(), Some(FilterDomain::WorkLog));
        shell.update_filter_draft(&FilterPatch::new().set_many("w_type", ["call", "note"]));
        let next = shell.apply_filters().expect("panel open");
        assert_eq!(next.to_href(), "/inbox?view=activity&w_type=call%2Cnote&id=7");
        assert_eq!(shell.view().active_item, Some("activity"));
    }

    #[test]
    fn unmatched_path_lands_on_last_workspace() {
        let store = Rc::new(MemoryLayoutStore::with_entries([("sidebar.lastWorkspace", "documents")]));
        let shell = mount(&store, 1280.0, "/");
        assert_eq!(shell.snapshot().workspace, None);
        assert_eq!(
            shell.landing_location().map(|location| location.to_href()),
            Some("/documents".to_string())
        );

        let fresh = Rc::new(MemoryLayoutStore::new());
        let shell = mount(&fresh, 1280.0, "/");
        assert_eq!(
            shell.landing_location().map(|location| location.to_href()),
            Some("/inbox".to_string())
        );
    }

    #[test]
    fn entering_mobile_mid_drag_restores_width() {
        let store = Rc::new(MemoryLayoutStore::new());
        let mut shell = mount(&store, 1280.0, "/inbox");
        shell.sidebar_pointer_down();
        shell.sidebar_pointer_move(700.0);
        shell.viewport_resized(600.0);
        assert!(!shell.layout().is_resizing());
        assert_eq!(shell.layout().width(), 256);
        assert!(!shell.sidebar_pointer_down());
    }

    #[test]
    fn event_names_round_trip() {
        for event in ShellEvent::ALL {
            assert_eq!(ShellEvent::from_name(event.name()), Some(event));
        }
        assert_eq!(ShellEvent::from_name("open-sidebar"), None);
    }

    #[test]
    fn snapshot_serializes_for_renderers() {
        let store = Rc::new(MemoryLayoutStore::new());
        let shell = mount(&store, 1280.0, "/settings/team");
        let json = serde_json::to_value(shell.snapshot()).expect("serialize snapshot");
        assert_eq!(json["active_item"], "team");
        assert_eq!(json["sidebar"]["presentation"]["mode"], "docked");
        assert_eq!(json["sidebar"]["width"], 256);
        assert_eq!(json["rail"].as_array().map(Vec::len), Some(8));
    }
}
