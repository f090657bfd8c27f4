//! Filtered, date-sorted, paginated view over a persisted feed.

use serde::Serialize;

use crate::models::{EventKind, EventRecord, Genre};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    /// Case-insensitive match against title, description or location.
    pub search: Option<String>,
    pub kind: Option<EventKind>,
    pub genre: Option<Genre>,
    /// Matched exactly against the record's `source` label.
    pub source: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    pub events: Vec<EventRecord>,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl EventQuery {
    fn matches(&self, record: &EventRecord) -> bool {
        if let Some(needle) = self.search.as_deref().map(str::to_lowercase) {
            let hit = [&record.title, &record.description, &record.location]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        self.kind.map_or(true, |kind| record.kind == kind)
            && self.genre.map_or(true, |genre| record.genre == genre)
            && self
                .source
                .as_deref()
                .map_or(true, |source| record.source == source)
    }
}

pub fn query(records: Vec<EventRecord>, query: &EventQuery) -> EventPage {
    let mut events: Vec<EventRecord> = records.into_iter().filter(|r| query.matches(r)).collect();
    // stable, so records sharing a date keep feed order
    events.sort_by(|a, b| b.date.cmp(&a.date));

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
    let total = events.len();
    let total_pages = total.div_ceil(limit);
    let events = events
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    EventPage {
        events,
        total,
        page,
        total_pages,
        has_next: page < total_pages,
        has_prev: page > 1,
    }
}
