//! Request bookkeeping of the search form: sequence numbers, debounce timers, status line and
//! query suggestions.

use std::time::Duration;

use tokio::{runtime::Handle, sync::mpsc::Sender};

use crate::{
    api::{ApiError, RoomQuery},
    debounce::Debouncer,
    events::Event,
    filter::FilterState,
    types::{Listing, RoomsResponse, Suggestion},
};

pub const LOADING: &str = "Fetching live availability…";
pub const FAILED: &str = "We could not load listings. Please try again in a moment.";
/// Shortest trimmed input that asks for suggestions.
pub const MIN_SUGGEST_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchStatus {
    #[default]
    Idle,
    Loading,
    Ready(String),
    Failed,
}

impl SearchStatus {
    pub fn text(&self) -> &str {
        match self {
            Self::Idle => "",
            Self::Loading => LOADING,
            Self::Ready(summary) => summary,
            Self::Failed => FAILED,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[derive(Debug)]
pub struct SearchController {
    issued: u64,
    filters: FilterState,
    status: SearchStatus,
    query_timer: Debouncer,
    suggest_timer: Debouncer,
    suggest_query: Option<String>,
    suggestions: Vec<Suggestion>,
}

impl SearchController {
    pub fn new(debounce: Duration) -> Self {
        Self {
            issued: 0,
            filters: FilterState::default(),
            status: SearchStatus::default(),
            query_timer: Debouncer::new(debounce),
            suggest_timer: Debouncer::new(debounce),
            suggest_query: None,
            suggestions: Vec::new(),
        }
    }

    /// Issues a new sequence number for `filters` and returns it with the request to send. Any
    /// pending query timer is dropped since this search already covers it.
    pub fn begin(&mut self, filters: FilterState, limit: u32) -> (u64, RoomQuery) {
        self.query_timer.cancel();
        self.issued += 1;
        self.status = SearchStatus::Loading;

        let query = filters.to_query(limit);
        self.filters = filters;

        (self.issued, query)
    }

    pub fn latest(&self) -> u64 {
        self.issued
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        seq == self.issued
    }

    /// Applies the response of request `seq`. Returns the listings to render, or `None` when the
    /// response is stale or the request failed.
    pub fn resolve(
        &mut self,
        seq: u64,
        result: Result<RoomsResponse, ApiError>,
    ) -> Option<Vec<Listing>> {
        if !self.is_latest(seq) {
            log::debug!(
                "[search] Dropping stale response #{seq}, latest is #{}",
                self.issued
            );
            return None;
        }

        match result {
            Ok(response) => {
                self.status = SearchStatus::Ready(self.filters.summary(response.meta.total));
                log::info!(
                    "[search] Request #{seq} returned {} rooms",
                    response.rooms.len()
                );
                Some(response.rooms)
            }
            Err(err) => {
                log::error!("[search] Request #{seq} failed: {err}");
                self.status = SearchStatus::Failed;
                None
            }
        }
    }

    /// Restarts the query timer. When it fires, [`Event::SearchDebounced`] is sent.
    pub fn debounce_query(&mut self, runtime: &Handle, sender: &Sender<Event>) {
        let sender = sender.clone();
        self.query_timer.schedule(runtime, |generation| async move {
            let _ = sender.send(Event::SearchDebounced(generation)).await;
        });
    }

    pub fn query_timer_is_current(&self, generation: u64) -> bool {
        self.query_timer.is_current(generation)
    }

    /// Restarts the suggestion timer for `text`, or hides the suggestions when `text` is too
    /// short.
    pub fn suggest(&mut self, text: &str, runtime: &Handle, sender: &Sender<Event>) {
        let text = text.trim();
        if text.chars().count() < MIN_SUGGEST_CHARS {
            self.clear_suggestions();
            return;
        }

        let query = text.to_string();
        let sender = sender.clone();
        self.suggest_query = Some(query.clone());
        self.suggest_timer.schedule(runtime, |generation| async move {
            let _ = sender
                .send(Event::SuggestDebounced(generation, query))
                .await;
        });
    }

    pub fn suggest_timer_is_current(&self, generation: u64) -> bool {
        self.suggest_timer.is_current(generation)
    }

    /// Stores suggestions fetched for `query` unless the input moved on in the meantime.
    pub fn accept_suggestions(&mut self, query: &str, result: Result<Vec<Suggestion>, ApiError>) {
        if self.suggest_query.as_deref() != Some(query) {
            return;
        }

        match result {
            Ok(suggestions) => self.suggestions = suggestions,
            Err(err) => {
                log::warn!("[search] Suggestions for '{query}' failed: {err}");
                self.suggestions.clear();
            }
        }
    }

    pub fn clear_suggestions(&mut self) {
        self.suggest_timer.cancel();
        self.suggest_query = None;
        self.suggestions.clear();
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    /// Filters of the latest issued request.
    pub fn filters(&self) -> &FilterState {
        &self.filters
    }
}
