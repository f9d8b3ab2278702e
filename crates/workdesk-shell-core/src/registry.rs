use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("workspace id must not be empty")]
    EmptyId,
    #[error("duplicate workspace id '{id}'")]
    DuplicateId { id: &'static str },
    #[error("workspace '{id}' route prefix '{prefix}' must start with '/' and not end with '/'")]
    InvalidPrefix {
        id: &'static str,
        prefix: &'static str,
    },
    #[error(
        "workspaces '{first}' and '{second}' share route prefix '{prefix}' with equal priority {priority}"
    )]
    AmbiguousPrefix {
        prefix: &'static str,
        priority: u8,
        first: &'static str,
        second: &'static str,
    },
    #[error("workspace '{id}' declares sidebar item '{key}' twice")]
    DuplicateItem { id: &'static str, key: &'static str },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct SidebarItem {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<&'static str>,
}

impl SidebarItem {
    const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            group: None,
        }
    }

    const fn grouped(key: &'static str, label: &'static str, group: &'static str) -> Self {
        Self {
            key,
            label,
            group: Some(group),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Accent {
    Sky,
    Violet,
    Amber,
    Emerald,
    Rose,
    Indigo,
    Teal,
    Slate,
}

/// Selects the decision table the resolver uses to pick the active sidebar
/// item of a workspace.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActiveItemRule {
    Inbox,
    Actions,
    Customers,
    Documents,
    /// First path segment after the route prefix, when it names an item.
    PathSegment,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WorkspaceDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub route_prefix: &'static str,
    /// Tie-breaker between descriptors sharing a route prefix; lower wins.
    pub priority: u8,
    pub items: &'static [SidebarItem],
    pub accent: Accent,
    pub active_item: ActiveItemRule,
}

impl WorkspaceDescriptor {
    pub fn item(&self, key: &str) -> Option<&'static SidebarItem> {
        self.items.iter().find(|item| item.key == key)
    }

    pub fn first_item_key(&self) -> Option<&'static str> {
        self.items.first().map(|item| item.key)
    }

    /// Segment-aware prefix match: `/inbox` matches `/inbox` and `/inbox/7`
    /// but not `/inboxes`.
    pub fn matches_path(&self, path: &str) -> bool {
        if self.route_prefix == "/" {
            return path.starts_with('/');
        }
        match path.strip_prefix(self.route_prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkspaceRegistry {
    descriptors: Vec<WorkspaceDescriptor>,
}

impl WorkspaceRegistry {
    pub fn new(descriptors: Vec<WorkspaceDescriptor>) -> Result<Self, RegistryError> {
        for (index, descriptor) in descriptors.iter().enumerate() {
            if descriptor.id.trim().is_empty() {
                return Err(RegistryError::EmptyId);
            }
            let prefix = descriptor.route_prefix;
            if !prefix.starts_with('/') || (prefix.len() > 1 && prefix.ends_with('/')) {
                return Err(RegistryError::InvalidPrefix {
                    id: descriptor.id,
                    prefix,
                });
            }
            for (item_index, item) in descriptor.items.iter().enumerate() {
                if descriptor.items[..item_index]
                    .iter()
                    .any(|earlier| earlier.key == item.key)
                {
                    return Err(RegistryError::DuplicateItem {
                        id: descriptor.id,
                        key: item.key,
                    });
                }
            }
            for earlier in &descriptors[..index] {
                if earlier.id == descriptor.id {
                    return Err(RegistryError::DuplicateId { id: descriptor.id });
                }
                if earlier.route_prefix == prefix && earlier.priority == descriptor.priority {
                    return Err(RegistryError::AmbiguousPrefix {
                        prefix,
                        priority: descriptor.priority,
                        first: earlier.id,
                        second: descriptor.id,
                    });
                }
            }
        }
        Ok(Self { descriptors })
    }

    /// The built-in workspace table. Validated by tests, so construction
    /// skips the checks in [`WorkspaceRegistry::new`].
    pub fn builtin() -> Self {
        Self {
            descriptors: BUILTIN_WORKSPACES.to_vec(),
        }
    }

    pub fn descriptors(&self) -> &[WorkspaceDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, id: &str) -> Option<&WorkspaceDescriptor> {
        self.descriptors.iter().find(|descriptor| descriptor.id == id)
    }

    /// Longest matching prefix wins; equal prefixes fall back to the lower
    /// `priority`. Construction guarantees that pair is unique.
    pub fn match_path(&self, path: &str) -> Option<&WorkspaceDescriptor> {
        self.descriptors
            .iter()
            .filter(|descriptor| descriptor.matches_path(path))
            .min_by(|left, right| {
                right
                    .route_prefix
                    .len()
                    .cmp(&left.route_prefix.len())
                    .then(left.priority.cmp(&right.priority))
            })
    }
}

impl Default for WorkspaceRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

const INBOX_ITEMS: [SidebarItem; 4] = [
    SidebarItem::new("all", "All conversations"),
    SidebarItem::new("today", "Today"),
    SidebarItem::new("open", "Open"),
    SidebarItem::grouped("activity", "Work log", "Activity"),
];

const ACTION_ITEMS: [SidebarItem; 6] = [
    SidebarItem::new("all", "All actions"),
    SidebarItem::grouped("follow_up", "Follow-ups", "Categories"),
    SidebarItem::grouped("review", "Reviews", "Categories"),
    SidebarItem::grouped("approval", "Approvals", "Categories"),
    SidebarItem::grouped("billing", "Billing", "Categories"),
    SidebarItem::new("archive", "Archive"),
];

const CUSTOMER_ITEMS: [SidebarItem; 4] = [
    SidebarItem::new("all", "All customers"),
    SidebarItem::new("companies", "Companies"),
    SidebarItem::new("contacts", "Contacts"),
    SidebarItem::new("archive", "Archive"),
];

const DOCUMENT_ITEMS: [SidebarItem; 3] = [
    SidebarItem::new("all", "All documents"),
    SidebarItem::new("uploads", "Uploads"),
    SidebarItem::new("recent", "Recent"),
];

const KNOWLEDGE_ITEMS: [SidebarItem; 3] = [
    SidebarItem::new("articles", "Articles"),
    SidebarItem::new("drafts", "Drafts"),
    SidebarItem::new("collections", "Collections"),
];

const CAMPAIGN_ITEMS: [SidebarItem; 3] = [
    SidebarItem::new("active", "Active"),
    SidebarItem::new("scheduled", "Scheduled"),
    SidebarItem::new("sent", "Sent"),
];

const BILLING_ITEMS: [SidebarItem; 3] = [
    SidebarItem::new("overview", "Overview"),
    SidebarItem::new("invoices", "Invoices"),
    SidebarItem::new("plans", "Plans"),
];

const SETTINGS_ITEMS: [SidebarItem; 5] = [
    SidebarItem::grouped("profile", "Profile", "Account"),
    SidebarItem::grouped("team", "Team", "Account"),
    SidebarItem::grouped("channels", "Channels", "Workspace"),
    SidebarItem::grouped("templates", "Templates", "Workspace"),
    SidebarItem::grouped("notes", "Notes", "Workspace"),
];

const BUILTIN_WORKSPACES: [WorkspaceDescriptor; 8] = [
    WorkspaceDescriptor {
        id: "inbox",
        label: "Inbox",
        route_prefix: "/inbox",
        priority: 0,
        items: &INBOX_ITEMS,
        accent: Accent::Sky,
        active_item: ActiveItemRule::Inbox,
    },
    WorkspaceDescriptor {
        id: "actions",
        label: "Actions",
        route_prefix: "/actions",
        priority: 0,
        items: &ACTION_ITEMS,
        accent: Accent::Amber,
        active_item: ActiveItemRule::Actions,
    },
    WorkspaceDescriptor {
        id: "customers",
        label: "Customers",
        route_prefix: "/customers",
        priority: 0,
        items: &CUSTOMER_ITEMS,
        accent: Accent::Emerald,
        active_item: ActiveItemRule::Customers,
    },
    WorkspaceDescriptor {
        id: "documents",
        label: "Documents",
        route_prefix: "/documents",
        priority: 0,
        items: &DOCUMENT_ITEMS,
        accent: Accent::Violet,
        active_item: ActiveItemRule::Documents,
    },
    WorkspaceDescriptor {
        id: "knowledge",
        label: "Knowledge base",
        route_prefix: "/knowledge",
        priority: 0,
        items: &KNOWLEDGE_ITEMS,
        accent: Accent::Indigo,
        active_item: ActiveItemRule::PathSegment,
    },
    WorkspaceDescriptor {
        id: "campaigns",
        label: "Campaigns",
        route_prefix: "/campaigns",
        priority: 0,
        items: &CAMPAIGN_ITEMS,
        accent: Accent::Rose,
        active_item: ActiveItemRule::PathSegment,
    },
    WorkspaceDescriptor {
        id: "billing",
        label: "Billing",
        route_prefix: "/billing",
        priority: 0,
        items: &BILLING_ITEMS,
        accent: Accent::Teal,
        active_item: ActiveItemRule::PathSegment,
    },
    WorkspaceDescriptor {
        id: "settings",
        label: "Settings",
        route_prefix: "/settings",
        priority: 0,
        items: &SETTINGS_ITEMS,
        accent: Accent::Slate,
        active_item: ActiveItemRule::PathSegment,
    },
];
