use std::path::Path;

use ::galileo::{
    Map as GalileoMap, MapView, Messenger,
    control::{EventProcessor, MapController, RawUserEvent},
    layer::raster_tile_layer::RasterTileLayerBuilder,
};
use galileo_types::{
    cartesian::Size,
    geo::{GeoPoint, NewGeoPoint, impls::GeoPoint2d},
};
use geo_types::Coord;
use roommap::provider::{MapProvider, MarkerId, ProviderError, ScreenSize, Viewport, viewport};

pub mod egui_state;
pub mod overlay;
pub mod provider;

/// What happened on the map during one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapInteraction {
    MarkerClicked(MarkerId),
    BackgroundClicked,
}

/// A [`MapProvider`] that can also draw itself into the central panel.
pub trait MapSurface: MapProvider {
    fn show(&mut self, ui: &mut egui::Ui) -> Option<MapInteraction>;
}

/// galileo map plus the event processor that pans and zooms it.
pub struct Map {
    map: GalileoMap,
    event_processor: EventProcessor,
}

impl Map {
    pub fn new(map: GalileoMap) -> Self {
        let mut event_processor = EventProcessor::default();
        event_processor.add_handler(MapController::default());

        Self {
            map,
            event_processor,
        }
    }

    /// Raster map showing the tiles of `template` around `center`.
    pub fn with_tiles(
        template: &str,
        cache_dir: Option<&Path>,
        center: Coord<f64>,
    ) -> Result<Self, ProviderError> {
        let template = template.to_string();
        let mut builder = RasterTileLayerBuilder::new_rest(move |index| {
            tile_url(&template, index.z as u32, index.x as i64, index.y as i64)
        });
        if let Some(cache_dir) = cache_dir {
            builder = builder.with_file_cache(cache_dir);
        }
        let tile_layer = builder
            .build()
            .map_err(|err| ProviderError::Backend(err.to_string()))?;

        let map = galileo::MapBuilder::default()
            .with_latlon(center.y, center.x)
            .with_layer(tile_layer)
            .build();

        Ok(Self::new(map))
    }

    /// Routes redraw requests of the map and all of its layers to `messenger`.
    pub fn set_messenger<M>(&mut self, messenger: M)
    where
        M: Messenger + Clone + 'static,
    {
        self.map.set_messenger(Some(messenger.clone()));
        for layer in self.map.layers_mut().iter_mut() {
            layer.set_messenger(Box::new(messenger.clone()));
        }
    }

    pub fn handle_event(&mut self, event: RawUserEvent) {
        self.event_processor.handle(event, &mut self.map);
    }

    pub fn map(&self) -> &GalileoMap {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut GalileoMap {
        &mut self.map
    }

    pub fn redraw(&self) {
        self.map.redraw()
    }

    pub fn screen_size(&self) -> ScreenSize {
        let size = self.map.view().size();
        ScreenSize::new(size.width(), size.height())
    }

    /// Center and zoom of the galileo view. `None` while the view has no position.
    pub fn viewport(&self) -> Option<Viewport> {
        let view = self.map.view();
        let position = view.position()?;

        Some(Viewport::new(
            Coord {
                x: position.lon(),
                y: position.lat(),
            },
            viewport::zoom_for_resolution(view.resolution()),
        ))
    }

    pub fn set_viewport(&mut self, target: Viewport) {
        let size = self.map.view().size();
        let view = MapView::new(
            &GeoPoint2d::latlon(target.center.y, target.center.x),
            target.resolution(),
        );

        self.map.set_view(view);
        self.map.set_size(Size::new(size.width(), size.height()));
        self.map.redraw();
    }
}

/// Fills the `{z}`, `{x}` and `{y}` placeholders of a tile URL template.
pub fn tile_url(template: &str, z: u32, x: i64, y: i64) -> String {
    template
        .replace("{z}", &z.to_string())
        .replace("{x}", &x.to_string())
        .replace("{y}", &y.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_url_fills_every_placeholder() {
        assert_eq!(
            tile_url("https://tile.openstreetmap.org/{z}/{x}/{y}.png", 12, 2878, 1793),
            "https://tile.openstreetmap.org/12/2878/1793.png"
        );
        assert_eq!(
            tile_url("https://tiles.example/v2/{z}/{x}/{y}.jpg?key=abc", 3, 5, 2),
            "https://tiles.example/v2/3/5/2.jpg?key=abc"
        );
    }
}
