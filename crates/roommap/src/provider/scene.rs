use std::collections::BTreeMap;

use geo_types::Coord;

use super::{MarkerId, MarkerStyle, PopupAnchor, PopupContent, ProviderError};

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedMarker {
    pub position: Coord<f64>,
    pub style: MarkerStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenPopup {
    pub position: Coord<f64>,
    pub marker: Option<MarkerId>,
    pub content: PopupContent,
}

/// Marker and popup bookkeeping shared by the map backends.
///
/// At most one popup is open at a time. A popup anchored to a marker closes when that marker is
/// removed.
#[derive(Debug, Default)]
pub struct MarkerScene {
    next_id: u64,
    markers: BTreeMap<MarkerId, PlacedMarker>,
    popup: Option<OpenPopup>,
}

impl MarkerScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, position: Coord<f64>, style: MarkerStyle) -> MarkerId {
        let id = MarkerId::new(self.next_id);
        self.next_id += 1;
        self.markers.insert(id, PlacedMarker { position, style });

        id
    }

    pub fn remove(&mut self, marker: MarkerId) -> Option<PlacedMarker> {
        let removed = self.markers.remove(&marker)?;
        if self
            .popup
            .as_ref()
            .is_some_and(|popup| popup.marker == Some(marker))
        {
            self.popup = None;
        }

        Some(removed)
    }

    pub fn get(&self, marker: MarkerId) -> Option<&PlacedMarker> {
        self.markers.get(&marker)
    }

    pub fn markers(&self) -> impl Iterator<Item = (MarkerId, &PlacedMarker)> {
        self.markers.iter().map(|(id, marker)| (*id, marker))
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn open_popup(
        &mut self,
        anchor: PopupAnchor,
        content: PopupContent,
    ) -> Result<&OpenPopup, ProviderError> {
        let (position, marker) = match anchor {
            PopupAnchor::Marker(marker) => (
                self.markers
                    .get(&marker)
                    .ok_or(ProviderError::UnknownMarker(marker))?
                    .position,
                Some(marker),
            ),
            PopupAnchor::Position(position) => (position, None),
        };

        Ok(self.popup.insert(OpenPopup {
            position,
            marker,
            content,
        }))
    }

    pub fn close_popup(&mut self) -> Option<OpenPopup> {
        self.popup.take()
    }

    pub fn popup(&self) -> Option<&OpenPopup> {
        self.popup.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (MarkerScene, MarkerId, MarkerId) {
        let mut scene = MarkerScene::new();
        let a = scene.add(Coord { x: 72.87, y: 19.07 }, MarkerStyle::Listing);
        let b = scene.add(Coord { x: 72.90, y: 19.11 }, MarkerStyle::UserLocation);
        (scene, a, b)
    }

    #[test]
    fn ids_are_not_reused() {
        let (mut scene, a, b) = setup();
        scene.remove(a);
        let c = scene.add(Coord { x: 72.8, y: 19.0 }, MarkerStyle::Listing);

        assert_ne!(c, a);
        assert_ne!(c, b);
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn popup_follows_its_marker() {
        let (mut scene, a, b) = setup();
        scene
            .open_popup(PopupAnchor::Marker(a), PopupContent::new("Andheri East PG"))
            .unwrap();
        assert_eq!(scene.popup().unwrap().position, Coord { x: 72.87, y: 19.07 });

        scene.remove(b);
        assert!(scene.popup().is_some());

        scene.remove(a);
        assert!(scene.popup().is_none());
    }

    #[test]
    fn popup_on_unknown_marker_fails() {
        let (mut scene, a, _) = setup();
        scene.remove(a);

        assert_eq!(
            scene
                .open_popup(PopupAnchor::Marker(a), PopupContent::new("gone"))
                .unwrap_err(),
            ProviderError::UnknownMarker(a)
        );
    }

    #[test]
    fn only_one_popup_is_open() {
        let (mut scene, a, b) = setup();
        scene
            .open_popup(PopupAnchor::Marker(a), PopupContent::new("first"))
            .unwrap();
        scene
            .open_popup(PopupAnchor::Marker(b), PopupContent::new("second"))
            .unwrap();

        let popup = scene.popup().unwrap();
        assert_eq!(popup.marker, Some(b));
        assert_eq!(popup.content.title, "second");
    }
}
