use crate::filter::{self, FilterDomain};
use crate::query::{Location, QueryParams, normalize_path};
use crate::registry::{ActiveItemRule, WorkspaceDescriptor, WorkspaceRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolvedView {
    pub workspace: Option<WorkspaceDescriptor>,
    pub active_item: Option<&'static str>,
    /// Filter panel family backing the view, if any.
    pub filter_domain: Option<FilterDomain>,
}

impl ResolvedView {
    pub fn workspace_id(&self) -> Option<&'static str> {
        self.workspace.map(|workspace| workspace.id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewResolver {
    registry: WorkspaceRegistry,
}

impl ViewResolver {
    pub fn new(registry: WorkspaceRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &WorkspaceRegistry {
        &self.registry
    }

    pub fn resolve_location(&self, location: &Location) -> ResolvedView {
        self.resolve(&location.path, &location.query)
    }

    pub fn resolve(&self, pathname: &str, query: &QueryParams) -> ResolvedView {
        let path = normalize_path(pathname);
        let Some(workspace) = self.registry.match_path(&path).copied() else {
            return ResolvedView::default();
        };
        ResolvedView {
            workspace: Some(workspace),
            active_item: active_item(&workspace, &path, query),
            filter_domain: filter_domain(&workspace, query),
        }
    }
}

fn active_item(
    workspace: &WorkspaceDescriptor,
    path: &str,
    query: &QueryParams,
) -> Option<&'static str> {
    let chosen = match workspace.active_item {
        ActiveItemRule::Inbox => {
            let filters = filter::committed_filters(FilterDomain::Inbox, query);
            if is_activity_view(query) {
                Some("activity")
            } else if filters.value("range") == Some("today") {
                Some("today")
            } else if filters.value("status") == Some("open") {
                Some("open")
            } else {
                None
            }
        }
        ActiveItemRule::Actions => {
            let filters = filter::committed_filters(FilterDomain::Actions, query);
            let category = match filters.values("cat") {
                [only] => workspace.item(only).map(|item| item.key),
                _ => None,
            };
            category.or_else(|| (filters.value("view") == Some("archived")).then_some("archive"))
        }
        ActiveItemRule::Customers => {
            let filters = filter::committed_filters(FilterDomain::Customers, query);
            match filters.value("type") {
                Some("company") => Some("companies"),
                Some("contact") => Some("contacts"),
                _ if filters
                    .values("tag")
                    .iter()
                    .any(|tag| tag.eq_ignore_ascii_case("archived")) =>
                {
                    Some("archive")
                }
                _ => None,
            }
        }
        ActiveItemRule::Documents => query
            .get("tab")
            .map(|tab| tab.trim().to_ascii_lowercase())
            .and_then(|tab| match tab.as_str() {
                "uploads" => Some("uploads"),
                "recent" => Some("recent"),
                _ => None,
            }),
        ActiveItemRule::PathSegment => first_segment_after(workspace.route_prefix, path)
            .and_then(|segment| workspace.item(segment).map(|item| item.key)),
    };

    chosen
        .and_then(|key| workspace.item(key).map(|item| item.key))
        .or_else(|| workspace.first_item_key())
}

fn filter_domain(workspace: &WorkspaceDescriptor, query: &QueryParams) -> Option<FilterDomain> {
    match workspace.active_item {
        ActiveItemRule::Inbox if is_activity_view(query) => Some(FilterDomain::WorkLog),
        ActiveItemRule::Inbox => Some(FilterDomain::Inbox),
        ActiveItemRule::Actions => Some(FilterDomain::Actions),
        ActiveItemRule::Customers => Some(FilterDomain::Customers),
        ActiveItemRule::Documents => Some(FilterDomain::Documents),
        ActiveItemRule::PathSegment => None,
    }
}

fn is_activity_view(query: &QueryParams) -> bool {
    query
        .get("view")
        .is_some_and(|view| view.trim().eq_ignore_ascii_case("activity"))
}

fn first_segment_after<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    let rest = if prefix == "/" {
        path
    } else {
        path.strip_prefix(prefix)?
    };
    rest.trim_start_matches('/')
        .split('/')
        .next()
        .filter(|segment| !segment.is_empty())
}
