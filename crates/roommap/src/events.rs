use std::fmt::{Debug, Display};

use geo_types::Coord;
use tokio::sync::mpsc::{Receiver, error::TryRecvError};
use tracing::instrument;

use crate::{
    api::{ApiError, ListingsApi},
    explorer::Explorer,
    geolocation::GeolocationError,
    provider::MapProvider,
    types::{FlashDeal, Listing, RoomsResponse, Suggestion},
};

/// Capacity of the channel between background tasks and the UI thread.
pub const EVENT_CAPACITY: usize = 64;

/// Result of background work, applied on the UI thread.
pub enum Event {
    ProviderReady,
    ProviderFailed(String),
    SearchDebounced(u64),
    SuggestDebounced(u64, String),
    RoomsLoaded {
        seq: u64,
        result: Result<RoomsResponse, ApiError>,
    },
    SuggestionsLoaded {
        query: String,
        result: Result<Vec<Suggestion>, ApiError>,
    },
    CollegesLoaded(Result<Vec<String>, ApiError>),
    FindmatesLoaded(Result<RoomsResponse, ApiError>),
    FlashDealLoaded(FlashDeal, Listing),
    Located(Result<Coord<f64>, GeolocationError>),
}

impl Event {
    #[instrument(skip(explorer))]
    pub fn handle<A, P>(self, explorer: &mut Explorer<A, P>)
    where
        A: ListingsApi,
        P: MapProvider + ?Sized,
    {
        match self {
            Self::ProviderReady => explorer.on_provider_ready(),
            Self::ProviderFailed(msg) => explorer.on_provider_failed(msg),
            Self::SearchDebounced(generation) => {
                if explorer.search().query_timer_is_current(generation) {
                    explorer.execute_search();
                }
            }
            Self::SuggestDebounced(generation, query) => {
                if explorer.search().suggest_timer_is_current(generation) {
                    explorer.fetch_suggestions(query);
                }
            }
            Self::RoomsLoaded { seq, result } => explorer.on_rooms_loaded(seq, result),
            Self::SuggestionsLoaded { query, result } => {
                explorer.search_mut().accept_suggestions(&query, result)
            }
            Self::CollegesLoaded(result) => explorer.on_colleges_loaded(result),
            Self::FindmatesLoaded(result) => explorer.on_findmates_loaded(result),
            Self::FlashDealLoaded(deal, listing) => explorer.on_flash_deal(deal, listing),
            Self::Located(result) => explorer.on_located(result),
        }
        log::trace!("[event] Processed event");
    }

    fn name(&self) -> &'static str {
        match self {
            Self::ProviderReady => "ProviderReady",
            Self::ProviderFailed(_) => "ProviderFailed",
            Self::SearchDebounced(_) => "SearchDebounced",
            Self::SuggestDebounced(_, _) => "SuggestDebounced",
            Self::RoomsLoaded { .. } => "RoomsLoaded",
            Self::SuggestionsLoaded { .. } => "SuggestionsLoaded",
            Self::CollegesLoaded(_) => "CollegesLoaded",
            Self::FindmatesLoaded(_) => "FindmatesLoaded",
            Self::FlashDealLoaded(_, _) => "FlashDealLoaded",
            Self::Located(_) => "Located",
        }
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoomsLoaded { seq, .. } => write!(f, "Event::RoomsLoaded(#{seq})"),
            _ => write!(f, "Event::{}", self.name()),
        }
    }
}

pub struct EventHandler {
    recv: Receiver<Event>,
}

impl EventHandler {
    pub fn new(recv: Receiver<Event>) -> Self {
        Self { recv }
    }

    /// Applies every event that is queued right now. Returns how many were handled.
    pub fn handle_events<A, P>(
        &mut self,
        explorer: &mut Explorer<A, P>,
    ) -> Result<usize, EventHandlerError>
    where
        A: ListingsApi,
        P: MapProvider + ?Sized,
    {
        let mut events = Vec::with_capacity(self.recv.len());

        loop {
            match self.recv.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Err(EventHandlerError),
            }
        }

        if !events.is_empty() {
            log::trace!("[event] Received {} events", events.len());
        }

        let count = events.len();
        for event in events {
            event.handle(explorer);
        }

        Ok(count)
    }
}

#[derive(Debug)]
pub struct EventHandlerError;

impl std::error::Error for EventHandlerError {}

impl std::fmt::Display for EventHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event channel closed")
    }
}
