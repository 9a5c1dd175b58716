//! The controller behind the map page.
//!
//! [`Explorer`] owns the map provider, every marker and card, the search form and the locate
//! control. UI code calls its `on_*`/action methods; background work started by those methods
//! reports back as [`Event`]s which the UI thread feeds through
//! [`EventHandler::handle_events`](crate::events::EventHandler::handle_events).

use std::{future::Future, sync::Arc};

use geo_types::Coord;
use tokio::{runtime::Handle, sync::mpsc};

use crate::{
    api::{ApiError, ListingsApi, RoomQuery},
    cards::{NO_LISTINGS, RoomCard, flash_deal_popup, user_location_popup},
    config::Config,
    events::{EVENT_CAPACITY, Event, EventHandler},
    filter::{SearchForm, SortOrder},
    geolocation::{GeolocationError, GeolocationSource, Geolocator, LOCATED_ZOOM, LocateControl},
    provider::{MapProvider, MarkerId, MarkerStyle, PopupAnchor, PopupContent, ProviderError},
    retry::{RetryPolicy, poll_until},
    search::{SearchController, SearchStatus},
    sync::Synchronizer,
    types::{FlashDeal, Listing, RoomsResponse, Suggestion},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapState {
    Initializing,
    Ready,
    /// Map construction failed, the message is shown in place of the map.
    Failed(String),
}

#[derive(Debug, Clone)]
struct MapSettings {
    container: String,
    center: Coord<f64>,
    zoom: f64,
    retry: RetryPolicy,
}

#[derive(Debug, Clone)]
struct DealMarker {
    marker: MarkerId,
    popup: PopupContent,
}

pub struct Explorer<A, P = dyn MapProvider>
where
    A: ListingsApi,
    P: MapProvider + ?Sized,
{
    api: Arc<A>,
    provider: Box<P>,
    geolocator: Arc<GeolocationSource>,
    runtime: Handle,
    sender: mpsc::Sender<Event>,

    map: MapSettings,
    map_state: MapState,
    limit: u32,
    findmates_limit: u32,
    property_types: Vec<String>,

    form: SearchForm,
    search: SearchController,
    sync: Synchronizer,
    pending_rooms: Option<Vec<Listing>>,

    locate: LocateControl,
    user_marker: Option<MarkerId>,
    alert: Option<String>,

    deals: Vec<DealMarker>,
    pending_deals: Vec<(FlashDeal, Listing)>,

    colleges: Vec<String>,
    findmates: Option<Vec<RoomCard>>,
}

impl<A, P> Explorer<A, P>
where
    A: ListingsApi,
    P: MapProvider + ?Sized,
{
    pub fn new(
        api: A,
        provider: Box<P>,
        geolocator: GeolocationSource,
        config: &Config,
        runtime: Handle,
    ) -> (Self, EventHandler) {
        let (sender, recv) = mpsc::channel(EVENT_CAPACITY);

        let explorer = Self {
            api: Arc::new(api),
            provider,
            geolocator: Arc::new(geolocator),
            runtime,
            sender,
            map: MapSettings {
                container: config.map.container.clone(),
                center: config.map.center(),
                zoom: config.map.zoom,
                retry: config.retry_policy(),
            },
            map_state: MapState::Initializing,
            limit: config.search.limit,
            findmates_limit: config.search.findmates_limit,
            property_types: config.search.property_types.clone(),
            form: SearchForm::default(),
            search: SearchController::new(config.debounce()),
            sync: Synchronizer::new(),
            pending_rooms: None,
            locate: LocateControl::default(),
            user_marker: None,
            alert: None,
            deals: Vec::new(),
            pending_deals: Vec::new(),
            colleges: Vec::new(),
            findmates: None,
        };

        (explorer, EventHandler::new(recv))
    }

    /// Page load: builds the map and kicks off the initial requests.
    pub fn start(&mut self) {
        tracing::info!("Starting with the {} map provider", self.provider.kind());
        self.init_map();
        self.execute_search();
        self.load_colleges();
        self.load_flash_deals();
        self.load_findmates();
    }

    /// Spawns `task` and sends its event back to the UI thread.
    fn dispatch<F>(&self, task: F)
    where
        F: Future<Output = Event> + Send + 'static,
    {
        let sender = self.sender.clone();
        self.runtime.spawn(async move {
            let event = task.await;
            if sender.send(event).await.is_err() {
                log::debug!("[explorer] Event channel closed, dropping result");
            }
        });
    }

    // Map lifecycle

    pub fn init_map(&mut self) {
        match self
            .provider
            .create_map(&self.map.container, self.map.center, self.map.zoom)
        {
            Ok(()) => self.on_map_created(),
            Err(ProviderError::NotReady) => {
                log::info!(
                    "[explorer] Map backend not ready, polling every {:?}",
                    self.map.retry.delay
                );
                let readiness = self.provider.readiness();
                let policy = self.map.retry;
                self.dispatch(async move {
                    match poll_until(|| readiness.is_ready(), policy).await {
                        Ok(attempts) => {
                            log::debug!("[explorer] Map backend ready after {attempts} attempts");
                            Event::ProviderReady
                        }
                        Err(err) => Event::ProviderFailed(err.to_string()),
                    }
                });
            }
            Err(err) => self.on_provider_failed(err.to_string()),
        }
    }

    pub(crate) fn on_provider_ready(&mut self) {
        match self
            .provider
            .create_map(&self.map.container, self.map.center, self.map.zoom)
        {
            Ok(()) => self.on_map_created(),
            Err(err) => self.on_provider_failed(err.to_string()),
        }
    }

    pub(crate) fn on_provider_failed(&mut self, msg: String) {
        log::error!("[explorer] Map construction failed: {msg}");
        self.map_state = MapState::Failed(format!("Unable to load the map: {msg}"));
    }

    fn on_map_created(&mut self) {
        tracing::info!("Map created in '{}'", self.map.container);
        self.map_state = MapState::Ready;

        if let Some(listings) = self.pending_rooms.take() {
            self.apply_rooms(&listings);
        }
        for (deal, listing) in std::mem::take(&mut self.pending_deals) {
            self.on_flash_deal(deal, listing);
        }
    }

    fn is_map_ready(&self) -> bool {
        self.map_state == MapState::Ready
    }

    // Search

    /// Sends a search for the current form values right away. Returns its sequence number.
    pub fn execute_search(&mut self) -> u64 {
        let (seq, query) = self.search.begin(self.form.filters(), self.limit);
        log::debug!("[explorer] Search #{seq}: {query:?}");

        let api = self.api.clone();
        self.dispatch(async move {
            let result = api.fetch_rooms(&query).await;
            Event::RoomsLoaded { seq, result }
        });

        seq
    }

    pub(crate) fn on_rooms_loaded(&mut self, seq: u64, result: Result<RoomsResponse, ApiError>) {
        if let Some(listings) = self.search.resolve(seq, result) {
            self.apply_rooms(&listings);
        }
    }

    fn apply_rooms(&mut self, listings: &[Listing]) {
        if !self.is_map_ready() {
            self.pending_rooms = Some(listings.to_vec());
            return;
        }

        if let Err(err) = self.sync.render(self.provider.as_mut(), listings) {
            log::error!("[explorer] Rendering listings failed: {err}");
        }
    }

    /// Free-text input. Searches once typing pauses for the debounce delay, and asks for
    /// suggestions.
    pub fn on_query_input(&mut self, text: impl Into<String>) {
        self.form.query = text.into();
        self.search.debounce_query(&self.runtime, &self.sender);
        self.search
            .suggest(&self.form.query, &self.runtime, &self.sender);
    }

    pub(crate) fn fetch_suggestions(&mut self, query: String) {
        let api = self.api.clone();
        self.dispatch(async move {
            let result = api.suggestions(&query).await;
            Event::SuggestionsLoaded { query, result }
        });
    }

    pub fn select_suggestion(&mut self, text: impl Into<String>) {
        self.form.query = text.into();
        self.search.clear_suggestions();
        self.execute_search();
    }

    pub fn on_property_type_changed(&mut self, property_type: impl Into<String>) {
        self.form.property_type = property_type.into();
        self.execute_search();
    }

    pub fn on_sort_changed(&mut self, sort: SortOrder) {
        self.form.sort = sort;
        self.execute_search();
    }

    /// Budget slider moved. Only the label follows.
    pub fn on_budget_input(&mut self, budget: u32) {
        self.form.budget = Some(budget);
    }

    /// Budget slider released.
    pub fn on_budget_changed(&mut self, budget: u32) {
        self.form.budget = Some(budget);
        self.execute_search();
    }

    pub fn set_include_unverified(&mut self, include_unverified: bool) {
        self.form.include_unverified = include_unverified;
        self.execute_search();
    }

    pub fn set_findmates_only(&mut self, findmates_only: bool) {
        self.form.findmates_only = findmates_only;
        self.execute_search();
    }

    pub fn clear_filters(&mut self) {
        self.form.reset();
        self.search.clear_suggestions();
        self.execute_search();
    }

    // Selection

    pub fn select_card(&mut self, index: usize) {
        if !self.is_map_ready() {
            return;
        }
        if let Err(err) = self.sync.select_card(self.provider.as_mut(), index) {
            log::warn!("[explorer] Selecting card {index} failed: {err}");
        }
    }

    pub fn marker_clicked(&mut self, marker: MarkerId) {
        if !self.is_map_ready() {
            return;
        }

        let popup = match self.sync.marker_clicked(self.provider.as_mut(), marker) {
            Ok(true) => return,
            Ok(false) if self.user_marker == Some(marker) => user_location_popup(),
            Ok(false) => match self.deals.iter().find(|deal| deal.marker == marker) {
                Some(deal) => deal.popup.clone(),
                None => return,
            },
            Err(err) => {
                log::warn!("[explorer] Opening popup of {marker} failed: {err}");
                return;
            }
        };

        if let Err(err) = self
            .provider
            .open_popup(PopupAnchor::Marker(marker), popup)
        {
            log::warn!("[explorer] Opening popup of {marker} failed: {err}");
        }
    }

    /// Click on the map background.
    pub fn map_clicked(&mut self) {
        self.sync.clear_selection();
        if self.is_map_ready() {
            self.provider.close_popup();
        }
    }

    pub fn recenter(&mut self) {
        if !self.is_map_ready() {
            return;
        }
        if let Err(err) = self.sync.recenter(self.provider.as_mut()) {
            log::warn!("[explorer] Recentering failed: {err}");
        }
    }

    // Geolocation

    pub fn locate_user(&mut self) {
        if !self.locate.begin() {
            return;
        }

        let geolocator = self.geolocator.clone();
        self.dispatch(async move { Event::Located(geolocator.locate().await) });
    }

    pub(crate) fn on_located(&mut self, result: Result<Coord<f64>, GeolocationError>) {
        self.locate.finish();

        let position = match result {
            Ok(position) => position,
            Err(err) => {
                log::warn!("[explorer] Geolocation failed: {err}");
                self.alert = Some(err.alert_text().to_string());
                return;
            }
        };

        if !self.is_map_ready() {
            log::warn!("[explorer] Located the user before the map was ready");
            return;
        }

        if let Some(previous) = self.user_marker.take() {
            self.provider.remove_marker(previous);
        }

        match self.provider.add_marker(position, MarkerStyle::UserLocation) {
            Ok(marker) => {
                self.user_marker = Some(marker);
                if let Err(err) = self
                    .provider
                    .open_popup(PopupAnchor::Marker(marker), user_location_popup())
                {
                    log::warn!("[explorer] Opening the location popup failed: {err}");
                }
                self.provider.pan_to(position, Some(LOCATED_ZOOM));
            }
            Err(err) => log::error!("[explorer] Placing the location marker failed: {err}"),
        }
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    // Side panels

    pub fn load_colleges(&mut self) {
        let api = self.api.clone();
        self.dispatch(async move { Event::CollegesLoaded(api.colleges().await) });
    }

    pub(crate) fn on_colleges_loaded(&mut self, result: Result<Vec<String>, ApiError>) {
        match result {
            Ok(colleges) => self.colleges = colleges,
            Err(err) => log::warn!("[explorer] Loading colleges failed: {err}"),
        }
    }

    pub fn load_findmates(&mut self) {
        let api = self.api.clone();
        let query = RoomQuery::findmates(self.findmates_limit);
        self.findmates = None;
        self.dispatch(async move { Event::FindmatesLoaded(api.fetch_rooms(&query).await) });
    }

    pub(crate) fn on_findmates_loaded(&mut self, result: Result<RoomsResponse, ApiError>) {
        self.findmates = Some(match result {
            Ok(response) => response.rooms.iter().map(RoomCard::from).collect(),
            Err(err) => {
                log::warn!("[explorer] Loading findmates failed: {err}");
                Vec::new()
            }
        });
    }

    /// Fetches the flash deals and the room of each deal. Every plottable one becomes a deal
    /// marker.
    pub fn load_flash_deals(&mut self) {
        let api = self.api.clone();
        let sender = self.sender.clone();

        self.runtime.spawn(async move {
            let deals = match api.flash_deals().await {
                Ok(response) => response.deals,
                Err(err) => {
                    log::warn!("[explorer] Loading flash deals failed: {err}");
                    return;
                }
            };

            for deal in deals {
                match api.room_by_id(&deal.room_id).await {
                    Ok(Some(listing)) if listing.is_plottable() => {
                        if sender
                            .send(Event::FlashDealLoaded(deal, listing))
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                    Ok(_) => {
                        log::debug!("[explorer] Flash deal room {} is not plottable", deal.room_id)
                    }
                    Err(err) => log::warn!(
                        "[explorer] Loading flash deal room {} failed: {err}",
                        deal.room_id
                    ),
                }
            }
        });
    }

    pub(crate) fn on_flash_deal(&mut self, deal: FlashDeal, listing: Listing) {
        if !self.is_map_ready() {
            self.pending_deals.push((deal, listing));
            return;
        }

        let Some(position) = listing.position() else {
            return;
        };

        match self.provider.add_marker(position, MarkerStyle::FlashDeal) {
            Ok(marker) => self.deals.push(DealMarker {
                marker,
                popup: flash_deal_popup(&deal, &listing),
            }),
            Err(err) => log::warn!("[explorer] Placing flash deal marker failed: {err}"),
        }
    }

    // Accessors

    pub fn form(&self) -> &SearchForm {
        &self.form
    }

    pub fn budget_label(&self) -> String {
        self.form.budget_label()
    }

    pub fn search(&self) -> &SearchController {
        &self.search
    }

    pub(crate) fn search_mut(&mut self) -> &mut SearchController {
        &mut self.search
    }

    pub fn status(&self) -> &SearchStatus {
        self.search.status()
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        self.search.suggestions()
    }

    pub fn sync(&self) -> &Synchronizer {
        &self.sync
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn map_state(&self) -> &MapState {
        &self.map_state
    }

    pub fn locate_control(&self) -> &LocateControl {
        &self.locate
    }

    pub fn user_marker(&self) -> Option<MarkerId> {
        self.user_marker
    }

    pub fn deal_markers(&self) -> impl Iterator<Item = MarkerId> + '_ {
        self.deals.iter().map(|deal| deal.marker)
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn property_types(&self) -> &[String] {
        &self.property_types
    }

    pub fn colleges(&self) -> &[String] {
        &self.colleges
    }

    /// Colleges whose name contains the current query, for query completion.
    pub fn matching_colleges(&self) -> impl Iterator<Item = &str> {
        let query = self.form.query.trim().to_lowercase();
        self.colleges
            .iter()
            .filter(move |college| {
                query.chars().count() >= 2 && college.to_lowercase().contains(&query)
            })
            .map(String::as_str)
    }

    /// `None` while loading.
    pub fn findmates(&self) -> Option<&[RoomCard]> {
        self.findmates.as_deref()
    }

    pub fn findmates_empty_text(&self) -> &'static str {
        NO_LISTINGS
    }
}
