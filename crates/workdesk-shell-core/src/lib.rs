//! DOM-free engine behind the Workdesk shell: workspace routing, URL-backed
//! filter state and persisted sidebar layout.

#![cfg_attr(
    test,
    allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)
)]

pub mod config;
pub mod filter;
pub mod filter_session;
pub mod layout;
pub mod query;
pub mod registry;
pub mod resolver;
pub mod responsive;
pub mod shell;
pub mod store;

pub use config::{ConfigError, ShellConfig};
pub use filter::{
    CommittedFilters, DraftFilterState, FieldUpdate, FieldValue, FilterDomain, FilterPatch,
    FilterSchema,
};
pub use filter_session::{FilterStateManager, SyncOutcome};
pub use layout::{ResizeEffect, ResizeEvent, ResizeState, SidebarLayout, StorageKeys, WidthBounds};
pub use query::{Location, QueryParams};
pub use registry::{RegistryError, SidebarItem, WorkspaceDescriptor, WorkspaceRegistry};
pub use resolver::{ResolvedView, ViewResolver};
pub use responsive::{
    ModeTransition, OverlayCloseReason, OverlayTrigger, ResponsiveController, SidebarPresentation,
};
pub use shell::{RouteChange, ShellEvent, ShellSnapshot, ShellState};
pub use store::{
    FileLayoutStore, LayoutStore, MemoryLayoutStore, StoreChange, StoreError, SubscriptionId,
};
