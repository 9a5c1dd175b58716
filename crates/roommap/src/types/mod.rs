use std::fmt::Display;

use geo_types::Coord;
use serde::{Deserialize, Serialize};

mod deals;

pub use deals::{FlashDeal, FlashDealsResponse};

/// Identifier of a listing as handed out by the backend. Older rooms carry numeric ids, newer
/// ones string ids, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListingId {
    Number(u64),
    Text(String),
}

impl Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Text(id) => write!(f, "{id}"),
        }
    }
}

impl From<u64> for ListingId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ListingId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
}

/// A room listing as returned by the listings API. Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    #[serde(default)]
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub property_type: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub available_slots: Option<u32>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub owner: Option<Owner>,
    #[serde(default)]
    pub capacity_total: Option<u32>,
    #[serde(default)]
    pub capacity_occupied: Option<u32>,
}

impl Listing {
    /// Map position of the listing, `x` is the longitude and `y` the latitude.
    ///
    /// Returns `None` unless both coordinates are present, finite and non-zero. The backend
    /// writes `0` for rooms it could not geocode.
    pub fn position(&self) -> Option<Coord<f64>> {
        let lat = self.latitude.filter(|lat| lat.is_finite() && *lat != 0.0)?;
        let lng = self.longitude.filter(|lng| lng.is_finite() && *lng != 0.0)?;

        Some(Coord { x: lng, y: lat })
    }

    pub fn is_plottable(&self) -> bool {
        self.position().is_some()
    }

    /// Open slots, falling back to `capacity_total - capacity_occupied` when the backend did not
    /// send `available_slots`.
    pub fn open_slots(&self) -> u32 {
        self.available_slots.unwrap_or_else(|| {
            self.capacity_total
                .unwrap_or(0)
                .saturating_sub(self.capacity_occupied.unwrap_or(0))
        })
    }

    pub fn detail_path(&self) -> String {
        format!("/room/{}", self.id)
    }

    pub fn booking_path(&self) -> String {
        format!("/book/{}", self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomsMeta {
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomsResponse {
    #[serde(default)]
    pub rooms: Vec<Listing>,
    #[serde(default)]
    pub meta: RoomsMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutocompleteResponse {
    #[serde(default)]
    pub results: Vec<Listing>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(latitude: Option<f64>, longitude: Option<f64>) -> Listing {
        serde_json::from_value(serde_json::json!({
            "id": 7,
            "title": "Andheri East PG",
            "price": 8500,
            "location": "Andheri East",
            "property_type": "pg",
            "latitude": latitude,
            "longitude": longitude,
            "image_url": "/static/img/7.jpg",
        }))
        .unwrap()
    }

    #[test]
    fn position_requires_both_coordinates() {
        assert_eq!(
            listing(Some(19.05), Some(72.85)).position(),
            Some(Coord { x: 72.85, y: 19.05 })
        );
        assert_eq!(listing(None, Some(72.85)).position(), None);
        assert_eq!(listing(Some(19.05), None).position(), None);
        assert_eq!(listing(None, None).position(), None);
    }

    #[test]
    fn zero_coordinates_are_not_plotted() {
        assert!(!listing(Some(0.0), Some(72.85)).is_plottable());
        assert!(!listing(Some(19.05), Some(0.0)).is_plottable());
    }

    #[test]
    fn deserializes_minimal_listing() {
        let listing: Listing = serde_json::from_str(r#"{"id": "r-12", "price": 6000.5}"#).unwrap();

        assert_eq!(listing.id, ListingId::Text("r-12".to_string()));
        assert_eq!(listing.price, 6000.5);
        assert!(listing.amenities.is_empty());
        assert!(!listing.verified);
        assert_eq!(listing.booking_path(), "/book/r-12");
    }

    #[test]
    fn open_slots_falls_back_to_capacity() {
        let mut listing = listing(None, None);
        listing.capacity_total = Some(4);
        listing.capacity_occupied = Some(3);
        assert_eq!(listing.open_slots(), 1);

        listing.capacity_occupied = Some(6);
        assert_eq!(listing.open_slots(), 0);

        listing.available_slots = Some(2);
        assert_eq!(listing.open_slots(), 2);
    }

    #[test]
    fn rooms_response_tolerates_missing_fields() {
        let response: RoomsResponse = serde_json::from_str("{}").unwrap();
        assert!(response.rooms.is_empty());
        assert_eq!(response.meta.total, 0);
    }

    #[test]
    fn suggestion_kind_is_read_from_type() {
        let suggestion: Suggestion =
            serde_json::from_str(r#"{"text": "IIT Bombay", "type": "college"}"#).unwrap();
        assert_eq!(suggestion.kind, "college");
    }
}
