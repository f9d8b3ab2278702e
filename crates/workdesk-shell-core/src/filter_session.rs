use std::collections::HashMap;

use crate::filter::{self, DraftFilterState, FilterDomain, FilterPatch};
use crate::query::QueryParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No panel is open for the domain.
    NotOpen,
    Resynced,
    /// The open draft has unapplied edits and was left alone.
    KeptDirtyDraft,
}

/// Open filter panels and their drafts, one per domain.
#[derive(Debug, Default)]
pub struct FilterStateManager {
    drafts: HashMap<FilterDomain, DraftFilterState>,
}

impl FilterStateManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens (or reopens) the panel with a fresh draft from the committed URL.
    pub fn open_panel(
        &mut self,
        domain: FilterDomain,
        committed: &QueryParams,
    ) -> &DraftFilterState {
        tracing::debug!(domain = %domain, "filter panel opened");
        self.drafts
            .entry(domain)
            .insert_entry(filter::init_draft(domain, committed))
            .into_mut()
    }

    pub fn is_open(&self, domain: FilterDomain) -> bool {
        self.drafts.contains_key(&domain)
    }

    pub fn is_dirty(&self, domain: FilterDomain) -> bool {
        self.drafts
            .get(&domain)
            .is_some_and(DraftFilterState::is_dirty)
    }

    pub fn draft(&self, domain: FilterDomain) -> Option<&DraftFilterState> {
        self.drafts.get(&domain)
    }

    pub fn open_domains(&self) -> impl Iterator<Item = FilterDomain> + '_ {
        self.drafts.keys().copied()
    }

    /// Returns `false` when the panel is closed or no key in `patch` applied.
    pub fn update_draft(&mut self, domain: FilterDomain, patch: &FilterPatch) -> bool {
        match self.drafts.get_mut(&domain) {
            Some(draft) => filter::update_draft(draft, patch),
            None => {
                tracing::debug!(domain = %domain, "ignoring draft update for closed panel");
                false
            }
        }
    }

    /// Re-reads the committed URL into an open, clean draft.
    pub fn sync_from_url(&mut self, domain: FilterDomain, committed: &QueryParams) -> SyncOutcome {
        let Some(draft) = self.drafts.get_mut(&domain) else {
            return SyncOutcome::NotOpen;
        };
        if draft.is_dirty() {
            tracing::debug!(domain = %domain, "kept dirty draft across url change");
            return SyncOutcome::KeptDirtyDraft;
        }
        *draft = filter::init_draft(domain, committed);
        SyncOutcome::Resynced
    }

    /// Commits the open draft and closes the panel. `None` when not open.
    pub fn apply(&mut self, domain: FilterDomain, existing: &QueryParams) -> Option<QueryParams> {
        let draft = self.drafts.remove(&domain)?;
        let next = filter::commit(&draft, existing);
        tracing::debug!(domain = %domain, query = %next, "filters applied");
        Some(next)
    }

    /// Discards any open draft and returns the domain's cleared query.
    pub fn clear(&mut self, domain: FilterDomain, existing: &QueryParams) -> QueryParams {
        self.drafts.remove(&domain);
        filter::clear(domain, existing)
    }

    pub fn close_panel(&mut self, domain: FilterDomain) -> bool {
        self.drafts.remove(&domain).is_some()
    }

    /// Drops unapplied edits but keeps the panel open on the committed state.
    pub fn discard_changes(&mut self, domain: FilterDomain, committed: &QueryParams) -> bool {
        match self.drafts.get_mut(&domain) {
            Some(draft) => {
                *draft = filter::init_draft(domain, committed);
                true
            }
            None => false,
        }
    }
}
