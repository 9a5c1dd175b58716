//! The two map backends of the client. Both draw a galileo raster map and differ only in where
//! their tile URL template comes from.

use std::{error::Error, fmt::Display, path::PathBuf, sync::Arc};

use geo_types::Coord;
use parking_lot::Mutex;
use reqwest::Url;
use roommap::{
    config::TileConfig,
    provider::{
        MapProvider, MarkerId, MarkerScene, MarkerStyle, PopupAnchor, PopupContent,
        ProviderError, ProviderKind, Readiness, ScreenSize, Viewport, viewport,
    },
};
use serde::Deserialize;
use tokio::runtime::Handle;

use super::{
    Map, MapInteraction, MapSurface,
    egui_state::EguiMapState,
    overlay::{self, HIT_RADIUS},
};

/// Where a [`GalileoProvider`] gets its tiles from.
pub trait TileSource {
    fn kind(&self) -> ProviderKind;

    fn readiness(&self) -> Readiness;

    /// `None` until the source is ready.
    fn url_template(&self) -> Option<String>;
}

/// Tiles from a configured URL template. Ready immediately.
#[derive(Debug, Clone)]
pub struct OpenTiles {
    template: String,
}

impl OpenTiles {
    pub fn new(config: &TileConfig) -> Self {
        Self {
            template: config.url_template.clone(),
        }
    }
}

impl TileSource for OpenTiles {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenTiles
    }

    fn readiness(&self) -> Readiness {
        Readiness::ready()
    }

    fn url_template(&self) -> Option<String> {
        Some(self.template.clone())
    }
}

/// Tiles of a hosted map service. The template is read from the service's TileJSON document,
/// which is fetched in the background.
#[derive(Debug, Clone, Default)]
pub struct HostedTiles {
    readiness: Readiness,
    template: Arc<Mutex<Option<String>>>,
}

impl HostedTiles {
    /// Starts fetching the TileJSON document at `url` on `runtime`. The source turns ready once
    /// a tile template was found; a failed bootstrap leaves it pending.
    pub fn bootstrap(url: Url, runtime: &Handle) -> Self {
        let tiles = Self::default();
        let readiness = tiles.readiness.clone();
        let template = tiles.template.clone();

        runtime.spawn(async move {
            let host = url.host_str().unwrap_or_default().to_string();
            match fetch_template(url).await {
                Ok(found) => {
                    *template.lock() = Some(found);
                    readiness.mark_ready();
                    log::info!("[hosted] Map service {host} ready");
                }
                Err(err) => log::error!("[hosted] Bootstrapping {host} failed: {err}"),
            }
        });

        tiles
    }
}

impl TileSource for HostedTiles {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Hosted
    }

    fn readiness(&self) -> Readiness {
        self.readiness.clone()
    }

    fn url_template(&self) -> Option<String> {
        self.template.lock().clone()
    }
}

#[derive(Debug, Deserialize)]
struct TileJson {
    #[serde(default)]
    tiles: Vec<String>,
}

impl TileJson {
    fn first_template(self) -> Result<String, BootstrapError> {
        self.tiles.into_iter().next().ok_or(BootstrapError::NoTiles)
    }
}

async fn fetch_template(url: Url) -> Result<String, BootstrapError> {
    reqwest::get(url)
        .await?
        .error_for_status()?
        .json::<TileJson>()
        .await?
        .first_template()
}

#[derive(Debug)]
pub enum BootstrapError {
    Request(reqwest::Error),
    NoTiles,
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Request(err) => Some(err),
            Self::NoTiles => None,
        }
    }
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(err) => write!(f, "request failed: {err}"),
            Self::NoTiles => write!(f, "TileJSON document lists no tiles"),
        }
    }
}

impl From<reqwest::Error> for BootstrapError {
    fn from(value: reqwest::Error) -> Self {
        Self::Request(value)
    }
}

/// [`MapProvider`] drawing a galileo map into egui with markers painted on top.
pub struct GalileoProvider<T> {
    source: T,
    ctx: egui::Context,
    render_state: egui_wgpu::RenderState,
    cache_dir: Option<PathBuf>,
    link_base: Url,
    state: Option<EguiMapState>,
    scene: MarkerScene,
    /// Fit requested before the map had a size.
    pending_fit: Option<Vec<Coord<f64>>>,
}

impl<T: TileSource> GalileoProvider<T> {
    pub fn new(
        source: T,
        ctx: egui::Context,
        render_state: egui_wgpu::RenderState,
        tiles: &TileConfig,
        link_base: Url,
    ) -> Self {
        Self {
            source,
            ctx,
            render_state,
            cache_dir: tiles.cache_dir.clone(),
            link_base,
            state: None,
            scene: MarkerScene::new(),
            pending_fit: None,
        }
    }

    fn set_viewport(&mut self, target: Viewport) {
        if let Some(state) = &mut self.state {
            state.map_mut().set_viewport(target);
        }
    }
}

fn is_sized(size: ScreenSize) -> bool {
    size.width > 1.0 && size.height > 1.0
}

impl<T: TileSource> MapProvider for GalileoProvider<T> {
    fn kind(&self) -> ProviderKind {
        self.source.kind()
    }

    fn readiness(&self) -> Readiness {
        self.source.readiness()
    }

    fn create_map(
        &mut self,
        container: &str,
        center: Coord<f64>,
        zoom: f64,
    ) -> Result<(), ProviderError> {
        if !self.source.readiness().is_ready() {
            return Err(ProviderError::NotReady);
        }
        let template = self.source.url_template().ok_or(ProviderError::NotReady)?;

        let map = Map::with_tiles(&template, self.cache_dir.as_deref(), center)?;
        let mut state = EguiMapState::new(self.ctx.clone(), self.render_state.clone(), map)?;
        state.map_mut().set_viewport(Viewport::new(center, zoom));

        log::info!("[galileo] Created {} map '{container}'", self.source.kind());
        self.state = Some(state);
        self.ctx.request_repaint();

        Ok(())
    }

    fn add_marker(
        &mut self,
        position: Coord<f64>,
        style: MarkerStyle,
    ) -> Result<MarkerId, ProviderError> {
        if self.state.is_none() {
            return Err(ProviderError::NotCreated);
        }
        self.ctx.request_repaint();

        Ok(self.scene.add(position, style))
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        if self.scene.remove(marker).is_some() {
            self.ctx.request_repaint();
        }
    }

    fn fit_bounds(&mut self, positions: &[Coord<f64>]) {
        let Some(state) = &self.state else {
            return;
        };

        let size = state.map().screen_size();
        if !is_sized(size) {
            self.pending_fit = Some(positions.to_vec());
            return;
        }

        if let Some(fitted) =
            viewport::fit(positions, size, viewport::FIT_PADDING, viewport::MAX_FIT_ZOOM)
        {
            self.set_viewport(fitted);
        }
    }

    fn open_popup(
        &mut self,
        anchor: PopupAnchor,
        content: PopupContent,
    ) -> Result<(), ProviderError> {
        self.scene.open_popup(anchor, content)?;
        self.ctx.request_repaint();

        Ok(())
    }

    fn close_popup(&mut self) {
        if self.scene.close_popup().is_some() {
            self.ctx.request_repaint();
        }
    }

    fn pan_to(&mut self, position: Coord<f64>, zoom: Option<f64>) {
        let Some(current) = self.viewport() else {
            return;
        };
        self.pending_fit = None;
        self.set_viewport(Viewport::new(position, zoom.unwrap_or(current.zoom)));
    }

    fn viewport(&self) -> Option<Viewport> {
        self.state.as_ref()?.map().viewport()
    }
}

impl<T: TileSource> MapSurface for GalileoProvider<T> {
    fn show(&mut self, ui: &mut egui::Ui) -> Option<MapInteraction> {
        let response = match &mut self.state {
            Some(state) => state.render(ui),
            None => {
                ui.centered_and_justified(|ui| ui.spinner());
                return None;
            }
        };

        if let Some(positions) = self.pending_fit.take() {
            self.fit_bounds(&positions);
        }

        let viewport = self.viewport()?;
        let rect = response.rect;
        let size = ScreenSize::new(rect.width() as f64, rect.height() as f64);
        let painter = ui.painter_at(rect);
        let highlighted = self.scene.popup().and_then(|popup| popup.marker);

        let mut placed = self
            .scene
            .markers()
            .map(|(id, marker)| {
                let anchor = overlay::to_pos(viewport.to_screen(marker.position, size), rect.min);
                (id, marker.style, anchor)
            })
            .collect::<Vec<_>>();
        // The user's own position stays on top.
        placed.sort_by_key(|(_, style, _)| *style == MarkerStyle::UserLocation);

        for &(id, style, anchor) in &placed {
            overlay::paint_marker(&painter, style, anchor, highlighted == Some(id));
        }

        let close = self.scene.popup().is_some_and(|popup| {
            let anchor = overlay::to_pos(viewport.to_screen(popup.position, size), rect.min);
            let style = popup
                .marker
                .and_then(|marker| self.scene.get(marker))
                .map(|marker| marker.style);
            overlay::show_popup(ui.ctx(), rect, anchor, style, &popup.content, &self.link_base)
        });
        if close {
            self.scene.close_popup();
        }

        if let Some(hover) = response.hover_pos() {
            if overlay::hit_test(placed.iter().copied(), hover, HIT_RADIUS).is_some() {
                ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
            }
        }

        if !response.clicked() {
            return None;
        }
        let pointer = response.interact_pointer_pos()?;

        Some(match overlay::hit_test(placed, pointer, HIT_RADIUS) {
            Some(marker) => MapInteraction::MarkerClicked(marker),
            None => MapInteraction::BackgroundClicked,
        })
    }
}
