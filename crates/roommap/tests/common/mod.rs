#![allow(dead_code)]

use std::{collections::VecDeque, sync::Arc, time::Duration};

use geo_types::Coord;
use parking_lot::Mutex;
use roommap::{
    Config, Explorer,
    api::{ApiError, ListingsApi, RoomQuery},
    events::EventHandler,
    geolocation::{FixedGeolocator, GeolocationSource},
    provider::{
        MapProvider, MarkerId, MarkerScene, MarkerStyle, PopupAnchor, PopupContent, ProviderError,
        ProviderKind, Readiness, ScreenSize, Viewport, viewport,
    },
    types::{FlashDeal, FlashDealsResponse, Listing, RoomsMeta, RoomsResponse, Suggestion},
};

pub fn rooms_fixture() -> RoomsResponse {
    let text = std::fs::read_to_string(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/resources/rooms.json"
    ))
    .unwrap();
    serde_json::from_str(&text).unwrap()
}

pub fn rooms(ids: &[usize]) -> RoomsResponse {
    let all = rooms_fixture().rooms;
    let rooms = ids.iter().map(|id| all[id - 1].clone()).collect::<Vec<_>>();

    RoomsResponse {
        meta: RoomsMeta {
            total: rooms.len() as u64,
        },
        rooms,
    }
}

/// Map provider that keeps everything in memory and counts viewport changes.
#[derive(Debug)]
pub struct RecordingProvider {
    pub scene: MarkerScene,
    pub viewport: Option<Viewport>,
    pub size: ScreenSize,
    pub readiness: Readiness,
    pub fit_calls: usize,
    pub pan_calls: usize,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::with_readiness(Readiness::ready())
    }

    pub fn with_readiness(readiness: Readiness) -> Self {
        Self {
            scene: MarkerScene::new(),
            viewport: None,
            size: ScreenSize::default(),
            readiness,
            fit_calls: 0,
            pan_calls: 0,
        }
    }

    pub fn markers_of(&self, style: MarkerStyle) -> Vec<(MarkerId, Coord<f64>)> {
        self.scene
            .markers()
            .filter(|(_, marker)| marker.style == style)
            .map(|(id, marker)| (id, marker.position))
            .collect()
    }
}

impl MapProvider for RecordingProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenTiles
    }

    fn readiness(&self) -> Readiness {
        self.readiness.clone()
    }

    fn create_map(
        &mut self,
        _container: &str,
        center: Coord<f64>,
        zoom: f64,
    ) -> Result<(), ProviderError> {
        if !self.readiness.is_ready() {
            return Err(ProviderError::NotReady);
        }
        self.viewport = Some(Viewport::new(center, zoom));
        Ok(())
    }

    fn add_marker(
        &mut self,
        position: Coord<f64>,
        style: MarkerStyle,
    ) -> Result<MarkerId, ProviderError> {
        if self.viewport.is_none() {
            return Err(ProviderError::NotCreated);
        }
        Ok(self.scene.add(position, style))
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        self.scene.remove(marker);
    }

    fn fit_bounds(&mut self, positions: &[Coord<f64>]) {
        self.fit_calls += 1;
        if let Some(fitted) = viewport::fit(
            positions,
            self.size,
            viewport::FIT_PADDING,
            viewport::MAX_FIT_ZOOM,
        ) {
            self.viewport = Some(fitted);
        }
    }

    fn open_popup(
        &mut self,
        anchor: PopupAnchor,
        content: PopupContent,
    ) -> Result<(), ProviderError> {
        self.scene.open_popup(anchor, content).map(|_| ())
    }

    fn close_popup(&mut self) {
        self.scene.close_popup();
    }

    fn pan_to(&mut self, position: Coord<f64>, zoom: Option<f64>) {
        self.pan_calls += 1;
        if let Some(viewport) = &mut self.viewport {
            viewport.center = position;
            viewport.zoom = zoom.unwrap_or(viewport.zoom);
        }
    }

    fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }
}

/// One scripted answer to a search request.
#[derive(Debug, Clone)]
pub struct Reply {
    pub delay: Duration,
    pub result: Result<RoomsResponse, u16>,
}

impl Reply {
    pub fn ok(response: RoomsResponse) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(response),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(status),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<Reply>,
    fallback: RoomsResponse,
    findmates: RoomsResponse,
    deals: Vec<FlashDeal>,
    suggestions: Vec<Suggestion>,
    colleges: Vec<String>,
    calls: Vec<RoomQuery>,
    suggestion_calls: Vec<String>,
}

/// In-memory listings backend. Clones share the same script, so a test keeps one clone to
/// inspect the requests the explorer made.
#[derive(Debug, Clone, Default)]
pub struct ScriptedApi {
    script: Arc<Mutex<Script>>,
}

impl ScriptedApi {
    pub fn new(fallback: RoomsResponse) -> Self {
        let api = Self::default();
        api.script.lock().fallback = fallback;
        api
    }

    pub fn reply(&self, reply: Reply) -> &Self {
        self.script.lock().replies.push_back(reply);
        self
    }

    pub fn set_findmates(&self, response: RoomsResponse) {
        self.script.lock().findmates = response;
    }

    pub fn set_deals(&self, deals: Vec<FlashDeal>) {
        self.script.lock().deals = deals;
    }

    pub fn set_suggestions(&self, suggestions: Vec<Suggestion>) {
        self.script.lock().suggestions = suggestions;
    }

    pub fn set_colleges(&self, colleges: Vec<String>) {
        self.script.lock().colleges = colleges;
    }

    /// Requests of the search form, in the order they were sent.
    pub fn search_calls(&self) -> Vec<RoomQuery> {
        self.script
            .lock()
            .calls
            .iter()
            .filter(|query| query.include_unverified.is_some())
            .cloned()
            .collect()
    }

    pub fn suggestion_calls(&self) -> Vec<String> {
        self.script.lock().suggestion_calls.clone()
    }
}

impl ListingsApi for ScriptedApi {
    async fn fetch_rooms(&self, query: &RoomQuery) -> Result<RoomsResponse, ApiError> {
        let reply = {
            let mut script = self.script.lock();
            script.calls.push(query.clone());

            if let Some(room_id) = &query.room_id {
                let rooms = script
                    .fallback
                    .rooms
                    .iter()
                    .filter(|room| room.id.to_string() == *room_id)
                    .cloned()
                    .collect::<Vec<_>>();
                Reply::ok(RoomsResponse {
                    meta: RoomsMeta {
                        total: rooms.len() as u64,
                    },
                    rooms,
                })
            } else if query.include_unverified.is_none() {
                Reply::ok(script.findmates.clone())
            } else {
                script
                    .replies
                    .pop_front()
                    .unwrap_or_else(|| Reply::ok(script.fallback.clone()))
            }
        };

        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }

        reply.result.map_err(|status| ApiError::Status {
            status,
            body: String::new(),
        })
    }

    async fn autocomplete(&self, query: &str) -> Result<Vec<Listing>, ApiError> {
        let query = query.to_lowercase();
        Ok(self
            .script
            .lock()
            .fallback
            .rooms
            .iter()
            .filter(|room| room.title.to_lowercase().contains(&query))
            .cloned()
            .collect())
    }

    async fn suggestions(&self, query: &str) -> Result<Vec<Suggestion>, ApiError> {
        let mut script = self.script.lock();
        script.suggestion_calls.push(query.to_string());
        Ok(script.suggestions.clone())
    }

    async fn colleges(&self) -> Result<Vec<String>, ApiError> {
        Ok(self.script.lock().colleges.clone())
    }

    async fn flash_deals(&self) -> Result<FlashDealsResponse, ApiError> {
        let deals = self.script.lock().deals.clone();
        Ok(FlashDealsResponse {
            count: deals.len() as u64,
            deals,
        })
    }
}

pub type TestExplorer = Explorer<ScriptedApi, RecordingProvider>;

/// Explorer with a created map, a fixed geolocator and no requests sent yet.
pub fn setup(api: &ScriptedApi) -> (TestExplorer, EventHandler) {
    setup_with(
        api,
        RecordingProvider::new(),
        GeolocationSource::Fixed(FixedGeolocator::new(19.05, 72.85)),
        &Config::default(),
    )
}

pub fn setup_with(
    api: &ScriptedApi,
    provider: RecordingProvider,
    geolocator: GeolocationSource,
    config: &Config,
) -> (TestExplorer, EventHandler) {
    let (mut explorer, handler) = Explorer::new(
        api.clone(),
        Box::new(provider),
        geolocator,
        config,
        tokio::runtime::Handle::current(),
    );
    explorer.init_map();
    (explorer, handler)
}

/// Lets spawned tasks run for `duration` of (paused) time, then applies their events.
pub async fn settle(handler: &mut EventHandler, explorer: &mut TestExplorer, duration: Duration) {
    tokio::time::sleep(duration).await;
    handler.handle_events(explorer).unwrap();
}

/// Runs until no more events arrive.
pub async fn drain(handler: &mut EventHandler, explorer: &mut TestExplorer) {
    loop {
        tokio::time::sleep(Duration::from_millis(1)).await;
        if handler.handle_events(explorer).unwrap() == 0 {
            break;
        }
    }
}
