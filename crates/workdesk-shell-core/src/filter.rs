//! URL-backed filter state shared by every filter panel.
//!
//! Each domain contributes a declarative [`FilterSchema`]: the ordered list of
//! query keys it owns, their defaults and allowed values, plus the
//! cross-cutting params (`id`, view markers) that survive commit and clear.
//! Default-omission, ordering and baseline handling live here once.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::query::QueryParams;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterDomain {
    Inbox,
    Actions,
    Customers,
    Documents,
    WorkLog,
}

impl FilterDomain {
    pub const ALL: [FilterDomain; 5] = [
        FilterDomain::Inbox,
        FilterDomain::Actions,
        FilterDomain::Customers,
        FilterDomain::Documents,
        FilterDomain::WorkLog,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterDomain::Inbox => "inbox",
            FilterDomain::Actions => "actions",
            FilterDomain::Customers => "customers",
            FilterDomain::Documents => "documents",
            FilterDomain::WorkLog => "work-log",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|domain| domain.as_str() == normalized)
    }

    pub fn schema(self) -> &'static FilterSchema {
        match self {
            FilterDomain::Inbox => &INBOX_SCHEMA,
            FilterDomain::Actions => &ACTIONS_SCHEMA,
            FilterDomain::Customers => &CUSTOMERS_SCHEMA,
            FilterDomain::Documents => &DOCUMENTS_SCHEMA,
            FilterDomain::WorkLog => &WORK_LOG_SCHEMA,
        }
    }
}

impl fmt::Display for FilterDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Single,
    /// Written as one comma-joined value.
    Multi,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Allowed {
    Any,
    OneOf(&'static [&'static str]),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FilterField {
    pub key: &'static str,
    pub kind: FieldKind,
    /// Ignored for multi fields, whose default is the empty list.
    pub default: &'static str,
    pub allowed: Allowed,
}

impl FilterField {
    const fn single(key: &'static str, default: &'static str, allowed: Allowed) -> Self {
        Self {
            key,
            kind: FieldKind::Single,
            default,
            allowed,
        }
    }

    const fn multi(key: &'static str, allowed: Allowed) -> Self {
        Self {
            key,
            kind: FieldKind::Multi,
            default: "",
            allowed,
        }
    }

    pub fn default_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::Single => FieldValue::Single(self.default.to_string()),
            FieldKind::Multi => FieldValue::Multi(Vec::new()),
        }
    }

    pub fn is_default(&self, value: &FieldValue) -> bool {
        match value {
            FieldValue::Single(value) => value == self.default,
            FieldValue::Multi(values) => values.is_empty(),
        }
    }

    /// Normalizes one raw token, returning `None` when it is blank or outside
    /// the allowed set. List tokens cannot hold the `,` separator.
    fn normalize_token(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || (self.kind == FieldKind::Multi && trimmed.contains(',')) {
            return None;
        }
        match self.allowed {
            Allowed::Any => Some(trimmed.to_string()),
            Allowed::OneOf(values) => {
                let lowered = trimmed.to_ascii_lowercase();
                values
                    .iter()
                    .find(|candidate| **candidate == lowered)
                    .map(|candidate| (*candidate).to_string())
            }
        }
    }

    fn normalize_single(&self, raw: &str) -> FieldValue {
        FieldValue::Single(
            self.normalize_token(raw)
                .unwrap_or_else(|| self.default.to_string()),
        )
    }

    fn normalize_multi<'a>(&self, raw: impl IntoIterator<Item = &'a str>) -> FieldValue {
        let mut values: Vec<String> = Vec::new();
        for token in raw.into_iter().flat_map(|value| value.split(',')) {
            if let Some(token) = self.normalize_token(token)
                && !values.contains(&token)
            {
                values.push(token);
            }
        }
        FieldValue::Multi(values)
    }

    /// Reads the field from committed params; invalid input reads as default.
    pub fn read(&self, params: &QueryParams) -> FieldValue {
        match self.kind {
            FieldKind::Single => match params.get(self.key) {
                Some(raw) => self.normalize_single(raw),
                None => self.default_value(),
            },
            FieldKind::Multi => self.normalize_multi(params.get_all(self.key)),
        }
    }

    /// URL value for `value`, or `None` when it is the default.
    pub fn encode(&self, value: &FieldValue) -> Option<String> {
        if self.is_default(value) {
            return None;
        }
        match value {
            FieldValue::Single(value) => Some(value.clone()),
            FieldValue::Multi(values) => Some(values.join(",")),
        }
    }

    fn apply(&self, current: &FieldValue, update: &FieldUpdate) -> FieldValue {
        match (self.kind, update) {
            (_, FieldUpdate::Reset) => self.default_value(),
            (FieldKind::Single, FieldUpdate::Set(raw)) => self.normalize_single(raw),
            (FieldKind::Single, FieldUpdate::SetMany(raw)) => match raw.first() {
                Some(first) => self.normalize_single(first),
                None => self.default_value(),
            },
            (FieldKind::Single, FieldUpdate::Toggle(raw)) => {
                let next = self.normalize_single(raw);
                if &next == current {
                    self.default_value()
                } else {
                    next
                }
            }
            (FieldKind::Multi, FieldUpdate::Set(raw)) => self.normalize_multi([raw.as_str()]),
            (FieldKind::Multi, FieldUpdate::SetMany(raw)) => {
                self.normalize_multi(raw.iter().map(String::as_str))
            }
            (FieldKind::Multi, FieldUpdate::Toggle(raw)) => {
                let mut values = match current {
                    FieldValue::Multi(values) => values.clone(),
                    FieldValue::Single(_) => Vec::new(),
                };
                if let Some(token) = self.normalize_token(raw) {
                    if let Some(index) = values.iter().position(|value| *value == token) {
                        values.remove(index);
                    } else {
                        values.push(token);
                    }
                }
                FieldValue::Multi(values)
            }
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multi(Vec<String>),
}

impl FieldValue {
    pub fn as_single(&self) -> Option<&str> {
        match self {
            FieldValue::Single(value) => Some(value),
            FieldValue::Multi(_) => None,
        }
    }

    pub fn as_multi(&self) -> &[String] {
        match self {
            FieldValue::Single(_) => &[],
            FieldValue::Multi(values) => values,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FilterSchema {
    pub domain: FilterDomain,
    pub fields: &'static [FilterField],
    /// Pairs that identify the view and are always written.
    pub baseline: &'static [(&'static str, &'static str)],
    pub kept_on_clear: &'static [&'static str],
}

impl FilterSchema {
    pub fn field(&self, key: &str) -> Option<&'static FilterField> {
        self.fields.iter().find(|field| field.key == key)
    }

    pub fn read(&'static self, params: &QueryParams) -> FilterValues {
        FilterValues {
            schema: self,
            values: self.fields.iter().map(|field| field.read(params)).collect(),
        }
    }

    fn write_baseline(&self, target: &mut QueryParams) {
        for (key, value) in self.baseline {
            target.append(*key, *value);
        }
    }

    fn owns(&self, key: &str) -> bool {
        self.field(key).is_some() || self.baseline.iter().any(|(baseline, _)| *baseline == key)
    }

    /// Copies pairs this domain does not write, in their original order.
    fn copy_unrelated(&self, source: &QueryParams, target: &mut QueryParams) {
        for (key, value) in source.iter().filter(|(key, _)| !self.owns(key)) {
            target.append(key, value);
        }
    }

    fn copy_kept(keys: &[&str], source: &QueryParams, target: &mut QueryParams) {
        for key in keys {
            if let Some(value) = source.get(key).filter(|value| !value.trim().is_empty()) {
                target.append(*key, value);
            }
        }
    }
}

/// Normalized values of one domain's fields, index-aligned with its schema.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FilterValues {
    schema: &'static FilterSchema,
    values: Vec<FieldValue>,
}

impl FilterValues {
    pub fn domain(&self) -> FilterDomain {
        self.schema.domain
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.schema
            .fields
            .iter()
            .position(|field| field.key == key)
            .and_then(|index| self.values.get(index))
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_single)
    }

    pub fn values(&self, key: &str) -> &[String] {
        self.get(key).map_or(&[], FieldValue::as_multi)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static FilterField, &FieldValue)> {
        self.schema.fields.iter().zip(self.values.iter())
    }

    /// Non-default fields; a multi field counts once however many values it holds.
    pub fn active_count(&self) -> usize {
        self.iter()
            .filter(|(field, value)| !field.is_default(value))
            .count()
    }

    fn apply(&mut self, key: &str, update: &FieldUpdate) -> bool {
        let Some(index) = self.schema.fields.iter().position(|field| field.key == key) else {
            return false;
        };
        let field = &self.schema.fields[index];
        let next = field.apply(&self.values[index], update);
        self.values[index] = next;
        true
    }

    fn write_fields(&self, target: &mut QueryParams) {
        for (field, value) in self.iter() {
            if let Some(encoded) = field.encode(value) {
                target.append(field.key, encoded);
            }
        }
    }
}

/// Committed filters as downstream panels read them.
pub type CommittedFilters = FilterValues;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldUpdate {
    Set(String),
    SetMany(Vec<String>),
    /// Adds or removes one value of a multi field; flips a single field
    /// between the value and its default.
    Toggle(String),
    Reset,
}

/// Partial update merged into a draft.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FilterPatch {
    updates: Vec<(String, FieldUpdate)>,
}

impl FilterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.updates.push((key.into(), FieldUpdate::Set(value.into())));
        self
    }

    pub fn set_many<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.updates.push((key.into(), FieldUpdate::SetMany(values)));
        self
    }

    pub fn toggle(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.updates.push((key.into(), FieldUpdate::Toggle(value.into())));
        self
    }

    pub fn reset(mut self, key: impl Into<String>) -> Self {
        self.updates.push((key.into(), FieldUpdate::Reset));
        self
    }

    pub fn push(&mut self, key: impl Into<String>, update: FieldUpdate) {
        self.updates.push((key.into(), update));
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn updates(&self) -> impl Iterator<Item = (&str, &FieldUpdate)> {
        self.updates
            .iter()
            .map(|(key, update)| (key.as_str(), update))
    }
}

/// Working copy edited inside an open filter panel.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DraftFilterState {
    values: FilterValues,
    dirty: bool,
}

impl DraftFilterState {
    pub fn domain(&self) -> FilterDomain {
        self.values.domain()
    }

    pub fn values(&self) -> &FilterValues {
        &self.values
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

pub fn init_draft(domain: FilterDomain, committed: &QueryParams) -> DraftFilterState {
    DraftFilterState {
        values: domain.schema().read(committed),
        dirty: false,
    }
}

/// Merges `patch` into `draft`. Returns whether any known key was touched;
/// unknown keys are skipped.
pub fn update_draft(draft: &mut DraftFilterState, patch: &FilterPatch) -> bool {
    let mut touched = false;
    for (key, update) in patch.updates() {
        if draft.values.apply(key, update) {
            touched = true;
        } else {
            tracing::debug!(
                domain = %draft.domain(),
                key,
                "ignoring filter update for key outside domain"
            );
        }
    }
    if touched {
        draft.dirty = true;
    }
    touched
}

/// Baseline pairs, then non-default fields in schema order, then every
/// param from `existing` that the domain does not own.
pub fn commit(draft: &DraftFilterState, existing: &QueryParams) -> QueryParams {
    let schema = draft.values.schema;
    let mut next = QueryParams::new();
    schema.write_baseline(&mut next);
    draft.values.write_fields(&mut next);
    schema.copy_unrelated(existing, &mut next);
    next
}

pub fn clear(domain: FilterDomain, existing: &QueryParams) -> QueryParams {
    let schema = domain.schema();
    let mut next = QueryParams::new();
    schema.write_baseline(&mut next);
    FilterSchema::copy_kept(schema.kept_on_clear, existing, &mut next);
    next
}

pub fn active_count(domain: FilterDomain, committed: &QueryParams) -> usize {
    domain.schema().read(committed).active_count()
}

pub fn committed_filters(domain: FilterDomain, committed: &QueryParams) -> CommittedFilters {
    domain.schema().read(committed)
}

const CHANNELS: &[&str] = &["email", "chat", "sms", "whatsapp", "voice"];

const INBOX_FIELDS: [FilterField; 3] = [
    FilterField::multi("src", Allowed::OneOf(CHANNELS)),
    FilterField::single(
        "status",
        "all",
        Allowed::OneOf(&["all", "open", "pending", "closed"]),
    ),
    FilterField::single(
        "range",
        "all",
        Allowed::OneOf(&["all", "today", "week", "month"]),
    ),
];

const ACTIONS_FIELDS: [FilterField; 3] = [
    FilterField::multi(
        "cat",
        Allowed::OneOf(&["follow_up", "review", "approval", "billing"]),
    ),
    FilterField::single(
        "type",
        "all",
        Allowed::OneOf(&["all", "task", "reminder", "escalation"]),
    ),
    FilterField::single("view", "open", Allowed::OneOf(&["open", "archived"])),
];

const CUSTOMERS_FIELDS: [FilterField; 4] = [
    FilterField::single(
        "type",
        "all",
        Allowed::OneOf(&["all", "company", "contact"]),
    ),
    // Free-form tags; a tag cannot contain a comma.
    FilterField::multi("tag", Allowed::Any),
    FilterField::single(
        "range",
        "all",
        Allowed::OneOf(&["all", "week", "month", "quarter", "year"]),
    ),
    FilterField::multi("ch", Allowed::OneOf(CHANNELS)),
];

const DOCUMENTS_FIELDS: [FilterField; 2] = [
    FilterField::single(
        "range",
        "all",
        Allowed::OneOf(&["all", "week", "month", "year"]),
    ),
    FilterField::single("q", "", Allowed::Any),
];

const WORK_LOG_FIELDS: [FilterField; 3] = [
    FilterField::multi(
        "w_type",
        Allowed::OneOf(&["note", "call", "email", "meeting", "task"]),
    ),
    FilterField::multi("w_ch", Allowed::OneOf(CHANNELS)),
    FilterField::single(
        "w_range",
        "all",
        Allowed::OneOf(&["all", "today", "week", "month"]),
    ),
];

static INBOX_SCHEMA: FilterSchema = FilterSchema {
    domain: FilterDomain::Inbox,
    fields: &INBOX_FIELDS,
    baseline: &[],
    kept_on_clear: &["id"],
};

static ACTIONS_SCHEMA: FilterSchema = FilterSchema {
    domain: FilterDomain::Actions,
    fields: &ACTIONS_FIELDS,
    baseline: &[],
    kept_on_clear: &["id"],
};

static CUSTOMERS_SCHEMA: FilterSchema = FilterSchema {
    domain: FilterDomain::Customers,
    fields: &CUSTOMERS_FIELDS,
    baseline: &[],
    kept_on_clear: &["id"],
};

static DOCUMENTS_SCHEMA: FilterSchema = FilterSchema {
    domain: FilterDomain::Documents,
    fields: &DOCUMENTS_FIELDS,
    baseline: &[],
    kept_on_clear: &["tab", "id"],
};

static WORK_LOG_SCHEMA: FilterSchema = FilterSchema {
    domain: FilterDomain::WorkLog,
    fields: &WORK_LOG_FIELDS,
    baseline: &[("view", "activity")],
    kept_on_clear: &[],
};

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen, QuickCheck};

    fn params(raw: &str) -> QueryParams {
        QueryParams::parse(raw)
    }

    #[test]
    fn inbox_range_today_counts_as_one_active_filter() {
        assert_eq!(active_count(FilterDomain::Inbox, &params("range=today")), 1);
    }

    #[test]
    fn multi_values_count_once() {
        let committed = params("src=email,chat&src=sms&status=open");
        assert_eq!(active_count(FilterDomain::Inbox, &committed), 2);
    }

    #[test]
    fn invalid_and_default_values_are_not_active() {
        let committed = params("status=bogus&range=all&src=pigeon&unknown=1");
        assert_eq!(active_count(FilterDomain::Inbox, &committed), 0);
        let filters = committed_filters(FilterDomain::Inbox, &committed);
        assert_eq!(filters.value("status"), Some("all"));
        assert!(filters.values("src").is_empty());
    }

    #[test]
    fn allowed_values_match_case_insensitively() {
        let filters = committed_filters(FilterDomain::Customers, &params("type=Company&ch=EMAIL"));
        assert_eq!(filters.value("type"), Some("company"));
        assert_eq!(filters.values("ch"), ["email".to_string()]);
    }

    #[test]
    fn applying_status_open_drops_range_and_counts_one() {
        let committed = params("");
        let mut draft = init_draft(FilterDomain::Inbox, &committed);
        assert!(update_draft(&mut draft, &FilterPatch::new().set("status", "open")));
        assert!(draft.is_dirty());

        let next = commit(&draft, &committed);
        assert_eq!(next.get("status"), Some("open"));
        assert!(!next.contains("range"));
        assert_eq!(active_count(FilterDomain::Inbox, &next), 1);
    }

    #[test]
    fn commit_preserves_selected_item_id() {
        let committed = params("id=conv_42&status=open&stale=1");
        let mut draft = init_draft(FilterDomain::Inbox, &committed);
        update_draft(&mut draft, &FilterPatch::new().toggle("src", "email"));

        let next = commit(&draft, &committed);
        assert_eq!(
            next.to_query_string(),
            "src=email&status=open&id=conv_42&stale=1"
        );
    }

    #[test]
    fn commit_keeps_params_outside_the_domain_in_order() {
        let committed = params("id=conv_42&compose=1&utm_source=mail&range=week");
        let mut draft = init_draft(FilterDomain::Inbox, &committed);
        update_draft(&mut draft, &FilterPatch::new().set("status", "open"));

        let next = commit(&draft, &committed);
        assert_eq!(
            next.to_query_string(),
            "status=open&range=week&id=conv_42&compose=1&utm_source=mail"
        );
    }

    #[test]
    fn work_log_commit_does_not_repeat_its_baseline() {
        let committed = params("view=activity&tab=notes&view=activity");
        let draft = init_draft(FilterDomain::WorkLog, &committed);
        assert_eq!(
            commit(&draft, &committed).to_query_string(),
            "view=activity&tab=notes"
        );
    }

    #[test]
    fn list_tokens_never_contain_the_separator() {
        let mut draft = init_draft(FilterDomain::Customers, &params(""));
        update_draft(&mut draft, &FilterPatch::new().toggle("tag", "vip,gold"));
        assert!(draft.values().values("tag").is_empty());

        update_draft(&mut draft, &FilterPatch::new().set("tag", "vip,gold"));
        assert_eq!(draft.values().values("tag"), ["vip", "gold"]);
        let next = commit(&draft, &params(""));
        let reread = committed_filters(FilterDomain::Customers, &next);
        assert_eq!(reread.values("tag"), ["vip", "gold"]);
    }

    #[test]
    fn commit_writes_fields_in_schema_order() {
        let committed = params("ch=sms&range=month&tag=vip&type=contact");
        let draft = init_draft(FilterDomain::Customers, &committed);
        assert_eq!(
            commit(&draft, &committed).to_query_string(),
            "type=contact&tag=vip&range=month&ch=sms"
        );
    }

    #[test]
    fn work_log_commit_keeps_activity_view_marker() {
        let committed = params("view=activity&w_type=call&id=7");
        let mut draft = init_draft(FilterDomain::WorkLog, &committed);
        update_draft(&mut draft, &FilterPatch::new().set("w_range", "week"));
        assert_eq!(
            commit(&draft, &committed).to_query_string(),
            "view=activity&w_type=call&w_range=week&id=7"
        );
    }

    #[test]
    fn clear_baselines_differ_by_view() {
        let inbox = clear(FilterDomain::Inbox, &params("status=open&id=3&range=today"));
        assert_eq!(inbox.to_query_string(), "id=3");

        let documents = clear(FilterDomain::Documents, &params("tab=uploads&q=tax&id=9"));
        assert_eq!(documents.to_query_string(), "tab=uploads&id=9");

        let work_log = clear(FilterDomain::WorkLog, &params("view=activity&w_ch=sms&id=3"));
        assert_eq!(work_log.to_query_string(), "view=activity");
    }

    #[test]
    fn toggle_on_multi_field_adds_then_removes() {
        let mut draft = init_draft(FilterDomain::Actions, &params("cat=review"));
        update_draft(&mut draft, &FilterPatch::new().toggle("cat", "billing"));
        assert_eq!(draft.values().values("cat"), ["review", "billing"]);
        update_draft(&mut draft, &FilterPatch::new().toggle("cat", "review"));
        assert_eq!(draft.values().values("cat"), ["billing"]);
    }

    #[test]
    fn toggle_on_single_field_returns_to_default() {
        let mut draft = init_draft(FilterDomain::Actions, &params("view=archived"));
        update_draft(&mut draft, &FilterPatch::new().toggle("view", "archived"));
        assert_eq!(draft.values().value("view"), Some("open"));
    }

    #[test]
    fn unknown_keys_leave_draft_clean() {
        let mut draft = init_draft(FilterDomain::Documents, &params(""));
        assert!(!update_draft(&mut draft, &FilterPatch::new().set("status", "open")));
        assert!(!draft.is_dirty());
    }

    #[test]
    fn free_text_query_is_trimmed_and_blank_is_default() {
        let mut draft = init_draft(FilterDomain::Documents, &params(""));
        update_draft(&mut draft, &FilterPatch::new().set("q", "  contract  "));
        assert_eq!(commit(&draft, &params("")).to_query_string(), "q=contract");
        update_draft(&mut draft, &FilterPatch::new().set("q", "   "));
        assert!(commit(&draft, &params("")).is_empty());
    }

    #[test]
    fn domain_names_round_trip() {
        for domain in FilterDomain::ALL {
            assert_eq!(FilterDomain::parse(domain.as_str()), Some(domain));
            assert_eq!(domain.schema().domain, domain);
        }
        assert_eq!(FilterDomain::parse("work_log"), Some(FilterDomain::WorkLog));
        assert_eq!(FilterDomain::parse("billing"), None);
    }

    #[derive(Clone, Debug)]
    struct ArbitraryQuery(QueryParams);

    impl Arbitrary for ArbitraryQuery {
        fn arbitrary(g: &mut Gen) -> Self {
            const KEYS: &[&str] = &[
                "src", "status", "range", "cat", "type", "view", "tag", "ch", "q", "tab", "id",
                "w_type", "w_ch", "w_range", "other",
            ];
            const VALUES: &[&str] = &[
                "", "all", "open", "today", "week", "email", "chat,sms", "review", "company",
                "archived", "activity", "uploads", "vip", "bogus", "42",
            ];
            let len = usize::arbitrary(g) % 8;
            let pairs = (0..len)
                .map(|_| {
                    let key = g.choose(KEYS).copied().unwrap_or("id");
                    let value = g.choose(VALUES).copied().unwrap_or("");
                    (key, value)
                })
                .collect::<Vec<_>>();
            ArbitraryQuery(QueryParams::from_pairs(pairs))
        }
    }

    #[test]
    fn commit_of_unedited_draft_is_idempotent() {
        fn property(query: ArbitraryQuery) -> bool {
            FilterDomain::ALL.into_iter().all(|domain| {
                let canonical = commit(&init_draft(domain, &query.0), &query.0);
                let again = commit(&init_draft(domain, &canonical), &canonical);
                canonical == again
                    && active_count(domain, &canonical) == active_count(domain, &query.0)
            })
        }
        QuickCheck::new()
            .tests(300)
            .quickcheck(property as fn(ArbitraryQuery) -> bool);
    }

    #[test]
    fn clear_always_yields_zero_active_filters() {
        fn property(query: ArbitraryQuery) -> bool {
            FilterDomain::ALL
                .into_iter()
                .all(|domain| active_count(domain, &clear(domain, &query.0)) == 0)
        }
        QuickCheck::new()
            .tests(300)
            .quickcheck(property as fn(ArbitraryQuery) -> bool);
    }
}
