//! Read access to journal entries
//!
//! [`EntryStore`] is the seam between the analytics layer and wherever
//! entries live. [`Database`](crate::Database) is the SQLite implementation;
//! [`MemoryStore`] keeps entries in memory for tests and embedding.

use crate::error::Result;
use crate::types::{DecisionEntry, FocusEntry};
use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Sort order for listed entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Owner-scoped filter for listing entries.
///
/// Every filter carries an owner; there is no unscoped listing.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    /// Only entries belonging to this owner
    pub owner_id: String,
    /// Entries dated at or after this time
    pub since: Option<DateTime<Utc>>,
    /// Entries dated at or before this time
    pub until: Option<DateTime<Utc>>,
    /// Case-insensitive substring match on the title
    pub search: Option<String>,
    /// Maximum number of entries to return
    pub limit: Option<usize>,
    /// Entries to skip (pagination)
    pub offset: usize,
    /// Ordering by date
    pub order: SortOrder,
}

impl EntryFilter {
    pub fn for_owner(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            since: None,
            until: None,
            search: None,
            limit: None,
            offset: 0,
            order: SortOrder::default(),
        }
    }

    /// Restrict to the inclusive range `[since, until]`.
    pub fn between(mut self, since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self.until = Some(until);
        self
    }

    /// Select one page of `per_page` entries (pages start at 1).
    pub fn page(mut self, page: usize, per_page: usize) -> Self {
        self.limit = Some(per_page);
        self.offset = page.saturating_sub(1) * per_page;
        self
    }

    /// Check whether an entry with these fields passes the filter.
    fn matches(&self, owner_id: &str, title: &str, date: DateTime<Utc>) -> bool {
        if owner_id != self.owner_id {
            return false;
        }
        if self.since.is_some_and(|since| date < since) {
            return false;
        }
        if self.until.is_some_and(|until| date > until) {
            return false;
        }
        match &self.search {
            Some(needle) => title.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

/// Query access to the two entry collections.
///
/// Implementations must honor every field of [`EntryFilter`], in particular
/// the owner scope. Results may be handed to the stats engine in any order.
pub trait EntryStore {
    /// List focus entries matching the filter
    fn list_focus_entries(&self, filter: &EntryFilter) -> Result<Vec<FocusEntry>>;

    /// List decision entries matching the filter
    fn list_decision_entries(&self, filter: &EntryFilter) -> Result<Vec<DecisionEntry>>;
}

/// In-memory [`EntryStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    focus: Mutex<Vec<FocusEntry>>,
    decisions: Mutex<Vec<DecisionEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_focus(&self, entry: FocusEntry) {
        self.focus.lock().unwrap().push(entry);
    }

    pub fn add_decision(&self, entry: DecisionEntry) {
        self.decisions.lock().unwrap().push(entry);
    }
}

/// Sort, skip and truncate already-filtered entries.
fn paginate<T>(
    mut items: Vec<T>,
    filter: &EntryFilter,
    date_of: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    match filter.order {
        SortOrder::NewestFirst => items.sort_by_key(|item| std::cmp::Reverse(date_of(item))),
        SortOrder::OldestFirst => items.sort_by_key(|item| date_of(item)),
    }
    let limit = filter.limit.unwrap_or(usize::MAX);
    items.into_iter().skip(filter.offset).take(limit).collect()
}

impl EntryStore for MemoryStore {
    fn list_focus_entries(&self, filter: &EntryFilter) -> Result<Vec<FocusEntry>> {
        let matching: Vec<FocusEntry> = self
            .focus
            .lock()
            .unwrap()
            .iter()
            .filter(|e| filter.matches(&e.owner_id, &e.title, e.date))
            .cloned()
            .collect();
        Ok(paginate(matching, filter, |e| e.date))
    }

    fn list_decision_entries(&self, filter: &EntryFilter) -> Result<Vec<DecisionEntry>> {
        let matching: Vec<DecisionEntry> = self
            .decisions
            .lock()
            .unwrap()
            .iter()
            .filter(|e| filter.matches(&e.owner_id, &e.title, e.date))
            .cloned()
            .collect();
        Ok(paginate(matching, filter, |e| e.date))
    }
}
