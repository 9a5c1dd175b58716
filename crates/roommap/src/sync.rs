//! Keeps the listing markers on the map and the sidebar cards in step.

use geo_types::Coord;

use crate::{
    cards::{NO_RESULTS, SidebarCard, listing_popup},
    provider::{MapProvider, MarkerId, MarkerStyle, PopupAnchor, PopupContent, ProviderError},
    types::Listing,
};

/// Zoom the map jumps to when a card is selected.
pub const SELECTED_ZOOM: f64 = 16.0;

#[derive(Debug, Clone)]
struct Plotted {
    listing: Listing,
    position: Coord<f64>,
    marker: MarkerId,
    card: SidebarCard,
    popup: PopupContent,
}

/// Owns every listing marker and sidebar card of the current render cycle.
///
/// Each [`Synchronizer::render`] throws the previous cycle away completely and rebuilds it from
/// the new listings. Card `i` and the marker of card `i` always belong to the same listing.
#[derive(Debug, Default)]
pub struct Synchronizer {
    plotted: Vec<Plotted>,
    active: Option<usize>,
    placeholder: Option<&'static str>,
    last: Vec<Listing>,
}

impl Synchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the markers and cards with one per plottable listing, in input order, and fits
    /// the map to them. Without any plottable listing the placeholder is shown and the viewport
    /// is left untouched. Returns the number of plotted listings.
    pub fn render<P>(
        &mut self,
        provider: &mut P,
        listings: &[Listing],
    ) -> Result<usize, ProviderError>
    where
        P: MapProvider + ?Sized,
    {
        if provider.viewport().is_none() {
            return Err(ProviderError::NotCreated);
        }

        self.clear(provider);
        self.last = listings.to_vec();

        for listing in listings {
            let Some(position) = listing.position() else {
                log::trace!("[sync] Listing {} has no coordinates, skipping", listing.id);
                continue;
            };

            let marker = provider.add_marker(position, MarkerStyle::Listing)?;
            self.plotted.push(Plotted {
                card: SidebarCard::from(listing),
                popup: listing_popup(listing),
                listing: listing.clone(),
                position,
                marker,
            });
        }

        if self.plotted.is_empty() {
            self.placeholder = Some(NO_RESULTS);
        } else {
            let positions = self
                .plotted
                .iter()
                .map(|plotted| plotted.position)
                .collect::<Vec<_>>();
            provider.fit_bounds(&positions);
        }

        log::debug!(
            "[sync] Rendered {} of {} listings",
            self.plotted.len(),
            listings.len()
        );

        Ok(self.plotted.len())
    }

    /// Removes every marker and card of the current cycle.
    pub fn clear<P>(&mut self, provider: &mut P)
    where
        P: MapProvider + ?Sized,
    {
        for plotted in self.plotted.drain(..) {
            provider.remove_marker(plotted.marker);
        }
        self.active = None;
        self.placeholder = None;
    }

    /// Renders the last applied listings again, fitting the map back onto them.
    pub fn recenter<P>(&mut self, provider: &mut P) -> Result<usize, ProviderError>
    where
        P: MapProvider + ?Sized,
    {
        let last = std::mem::take(&mut self.last);
        self.render(provider, &last)
    }

    /// Makes card `index` the only active one, pans to its listing and opens its popup.
    pub fn select_card<P>(&mut self, provider: &mut P, index: usize) -> Result<(), ProviderError>
    where
        P: MapProvider + ?Sized,
    {
        let Some(plotted) = self.plotted.get(index) else {
            log::warn!("[sync] No card at index {index}");
            return Ok(());
        };

        provider.pan_to(plotted.position, Some(SELECTED_ZOOM));
        provider.open_popup(PopupAnchor::Marker(plotted.marker), plotted.popup.clone())?;
        self.active = Some(index);

        Ok(())
    }

    /// Opens the popup of a listing marker and marks its card active. The viewport stays where it
    /// is. Returns `false` when `marker` is not a listing marker of this cycle.
    pub fn marker_clicked<P>(
        &mut self,
        provider: &mut P,
        marker: MarkerId,
    ) -> Result<bool, ProviderError>
    where
        P: MapProvider + ?Sized,
    {
        let Some(index) = self.plotted.iter().position(|plotted| plotted.marker == marker) else {
            return Ok(false);
        };

        provider.open_popup(PopupAnchor::Marker(marker), self.plotted[index].popup.clone())?;
        self.active = Some(index);

        Ok(true)
    }

    pub fn clear_selection(&mut self) {
        self.active = None;
    }

    pub fn cards(&self) -> impl ExactSizeIterator<Item = &SidebarCard> {
        self.plotted.iter().map(|plotted| &plotted.card)
    }

    pub fn card(&self, index: usize) -> Option<&SidebarCard> {
        self.plotted.get(index).map(|plotted| &plotted.card)
    }

    pub fn listing(&self, index: usize) -> Option<&Listing> {
        self.plotted.get(index).map(|plotted| &plotted.listing)
    }

    pub fn markers(&self) -> impl Iterator<Item = MarkerId> + '_ {
        self.plotted.iter().map(|plotted| plotted.marker)
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.active == Some(index)
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        self.placeholder
    }

    pub fn last_listings(&self) -> &[Listing] {
        &self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MarkerScene, ProviderKind, Readiness, Viewport, viewport};

    #[derive(Default)]
    struct SceneProvider {
        scene: MarkerScene,
        viewport: Option<Viewport>,
    }

    impl MapProvider for SceneProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::OpenTiles
        }

        fn readiness(&self) -> Readiness {
            Readiness::ready()
        }

        fn create_map(
            &mut self,
            _: &str,
            center: Coord<f64>,
            zoom: f64,
        ) -> Result<(), ProviderError> {
            self.viewport = Some(Viewport::new(center, zoom));
            Ok(())
        }

        fn add_marker(
            &mut self,
            position: Coord<f64>,
            style: MarkerStyle,
        ) -> Result<MarkerId, ProviderError> {
            Ok(self.scene.add(position, style))
        }

        fn remove_marker(&mut self, marker: MarkerId) {
            self.scene.remove(marker);
        }

        fn fit_bounds(&mut self, positions: &[Coord<f64>]) {
            if let Some(fitted) = viewport::fit(
                positions,
                Default::default(),
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
            if let Some(viewport) = &mut self.viewport {
                viewport.center = position;
                viewport.zoom = zoom.unwrap_or(viewport.zoom);
            }
        }

        fn viewport(&self) -> Option<Viewport> {
            self.viewport
        }
    }

    fn listing(id: u64, coords: Option<(f64, f64)>) -> Listing {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Room {id}"),
            "price": 8500,
            "location": "Andheri East",
            "property_type": "pg",
            "latitude": coords.map(|(lat, _)| lat),
            "longitude": coords.map(|(_, lng)| lng),
            "image_url": "",
            "available_slots": 1,
        }))
        .unwrap()
    }

    fn setup() -> (Synchronizer, SceneProvider) {
        let mut provider = SceneProvider::default();
        provider
            .create_map("map", Coord { x: 72.8777, y: 19.076 }, 12.0)
            .unwrap();
        (Synchronizer::new(), provider)
    }

    #[test]
    fn render_requires_a_map() {
        let mut sync = Synchronizer::new();
        let mut provider = SceneProvider::default();

        assert_eq!(
            sync.render(&mut provider, &[listing(1, Some((19.1, 72.9)))]),
            Err(ProviderError::NotCreated)
        );
    }

    #[test]
    fn cards_follow_input_order() {
        let (mut sync, mut provider) = setup();
        let listings = [
            listing(3, Some((19.03, 72.85))),
            listing(1, None),
            listing(2, Some((19.11, 72.87))),
        ];

        assert_eq!(sync.render(&mut provider, &listings).unwrap(), 2);
        let titles = sync.cards().map(|card| card.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, ["Room 3", "Room 2"]);
        assert_eq!(provider.scene.len(), 2);
        assert_eq!(sync.placeholder(), None);
    }

    #[test]
    fn marker_click_opens_popup_without_panning() {
        let (mut sync, mut provider) = setup();
        sync.render(
            &mut provider,
            &[listing(1, Some((19.03, 72.85))), listing(2, Some((19.11, 72.87)))],
        )
        .unwrap();
        let before = provider.viewport;
        let marker = sync.markers().nth(1).unwrap();

        assert!(sync.marker_clicked(&mut provider, marker).unwrap());
        assert_eq!(provider.viewport, before);
        assert_eq!(sync.active(), Some(1));
        assert_eq!(provider.scene.popup().unwrap().content.title, "Room 2");

        assert!(!sync.marker_clicked(&mut provider, MarkerId::new(999)).unwrap());
    }

    #[test]
    fn recenter_fits_the_last_listings_again() {
        let (mut sync, mut provider) = setup();
        let listings = [listing(1, Some((19.03, 72.85))), listing(2, Some((19.11, 72.87)))];
        sync.render(&mut provider, &listings).unwrap();
        let fitted = provider.viewport;

        sync.select_card(&mut provider, 0).unwrap();
        assert_eq!(provider.viewport.unwrap().zoom, SELECTED_ZOOM);

        assert_eq!(sync.recenter(&mut provider).unwrap(), 2);
        assert_eq!(provider.viewport, fitted);
        assert_eq!(sync.active(), None);
        assert_eq!(sync.last_listings(), &listings);
    }
}
